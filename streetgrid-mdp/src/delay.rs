//! Truncated geometric delay model.
//!
//! Entering a cell costs a random delay drawn from a geometric distribution with the cell's
//! success parameter `p`: `P(delay = k) = p (1 - p)^k`. Delays `0..H` get their own bucket and
//! everything at or beyond the horizon `H` is folded into one tail bucket paying `-H`, so each
//! distribution has exactly `H + 1` outcomes and is normalized.

use serde::Serialize;

use crate::config::{ConfigError, GridConfig};
use crate::error::MdpError;
use crate::numbers::{delay_reward, is_probability, usize_to_exponent, usize_to_f64};
use crate::traffic::TrafficClass;

/// One precomputed delay pmf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayDistribution {
    parameter: f64,
    probabilities: Vec<f64>,
}

impl DelayDistribution {
    /// Tabulate the truncated pmf for `parameter` over `horizon` explicit buckets plus the tail.
    ///
    /// # Errors
    ///
    /// Returns an error when `parameter` is outside `(0, 1)`, `horizon` is zero, or any bucket
    /// ends up with a non-finite or out-of-range probability.
    pub fn new(parameter: f64, horizon: usize) -> Result<Self, MdpError> {
        if !(parameter.is_finite() && parameter > 0.0 && parameter < 1.0) {
            return Err(MdpError::InvalidProbability {
                parameter,
                bucket: 0,
                value: parameter,
            });
        }
        if horizon == 0 {
            return Err(ConfigError::MinViolation {
                field: "grid.horizon",
                min: 1,
                value: 0,
            }
            .into());
        }

        let miss = 1.0 - parameter;
        let mut probabilities = Vec::with_capacity(horizon + 1);
        let mut mass = parameter;
        for _ in 0..horizon {
            probabilities.push(mass);
            mass *= miss;
        }
        // 1 - CDF(H - 1) = (1 - p)^H
        probabilities.push(miss.powi(usize_to_exponent(horizon)));

        if let Some((bucket, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, value)| !is_probability(**value))
        {
            return Err(MdpError::InvalidProbability {
                parameter,
                bucket,
                value,
            });
        }

        Ok(Self {
            parameter,
            probabilities,
        })
    }

    #[must_use]
    pub const fn parameter(&self) -> f64 {
        self.parameter
    }

    /// Number of explicit buckets before the tail.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.probabilities.len() - 1
    }

    /// Bucket probabilities; the last entry is the tail.
    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// `(reward, probability)` per bucket, tail last.
    pub fn outcomes(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(delay, &prob)| (delay_reward(delay), prob))
    }

    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Expected truncated delay, counting the tail as exactly `H`.
    #[must_use]
    pub fn expected_delay(&self) -> f64 {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(delay, prob)| usize_to_f64(delay) * prob)
            .sum()
    }

    #[must_use]
    pub fn expected_reward(&self) -> f64 {
        -self.expected_delay()
    }
}

/// Delay distributions for every traffic class, built once per model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayTable {
    horizon: usize,
    by_class: Vec<DelayDistribution>,
}

impl DelayTable {
    /// # Errors
    ///
    /// Returns an error when any configured traffic parameter cannot produce a valid pmf.
    pub fn new(cfg: &GridConfig) -> Result<Self, MdpError> {
        let by_class = TrafficClass::ALL
            .into_iter()
            .map(|class| DelayDistribution::new(class.parameter(&cfg.traffic), cfg.horizon))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            horizon: cfg.horizon,
            by_class,
        })
    }

    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    #[must_use]
    pub fn get(&self, class: TrafficClass) -> &DelayDistribution {
        &self.by_class[class.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_horizon_plus_tail() {
        let dist = DelayDistribution::new(0.5, 15).unwrap();
        assert_eq!(dist.probabilities().len(), 16);
        assert_eq!(dist.horizon(), 15);
        assert!((dist.probabilities()[0] - 0.5).abs() < 1e-12);
        assert!((dist.probabilities()[1] - 0.25).abs() < 1e-12);
        assert!((dist.probabilities()[15] - 0.5_f64.powi(15)).abs() < 1e-15);
        assert!((dist.total_mass() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tail_reward_is_negative_horizon() {
        let dist = DelayDistribution::new(0.9, 4).unwrap();
        let rewards: Vec<f64> = dist.outcomes().map(|(reward, _)| reward).collect();
        assert_eq!(rewards, vec![0.0, -1.0, -2.0, -3.0, -4.0]);
    }

    #[test]
    fn expected_delay_matches_closed_form() {
        let p: f64 = 0.5;
        let h = 3;
        let dist = DelayDistribution::new(p, h).unwrap();
        // 0*0.5 + 1*0.25 + 2*0.125 + 3*0.125
        assert!((dist.expected_delay() - 0.875).abs() < 1e-12);
        assert!((dist.expected_reward() + 0.875).abs() < 1e-12);
    }

    #[test]
    fn higher_parameter_means_shorter_delay() {
        let low = DelayDistribution::new(0.9, 15).unwrap();
        let high = DelayDistribution::new(0.5, 15).unwrap();
        assert!(low.expected_delay() < high.expected_delay());
    }

    #[test]
    fn parameters_outside_open_interval_fail_fast() {
        for bad in [0.0, 1.0, -0.1, 2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                DelayDistribution::new(bad, 15),
                Err(MdpError::InvalidProbability { .. })
            ));
        }
        assert!(matches!(
            DelayDistribution::new(0.5, 0),
            Err(MdpError::Config(ConfigError::MinViolation { .. }))
        ));
    }

    #[test]
    fn table_is_indexed_by_class() {
        let table = DelayTable::new(&GridConfig::default()).unwrap();
        assert_eq!(table.horizon(), 15);
        assert!((table.get(TrafficClass::Low).parameter() - 0.9).abs() < f64::EPSILON);
        assert!((table.get(TrafficClass::High).parameter() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tiny_parameters_stay_normalized() {
        let dist = DelayDistribution::new(1e-9, 15).unwrap();
        assert!((dist.total_mass() - 1.0).abs() < 1e-9);
        assert!(dist.probabilities()[15] > 0.99);
    }
}
