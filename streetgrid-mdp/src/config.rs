//! Model and solver configuration with validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traffic::TrafficClass;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("traffic parameter for {class:?} must lie strictly inside (0, 1) (got {value})")]
    TrafficParameter { class: TrafficClass, value: f64 },
    #[error("{field} must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("discount must lie in (0, 1] (got {value})")]
    Discount { value: f64 },
    #[error("minimum sweep count {min} exceeds hard sweep cap {max}")]
    SweepBounds { min: usize, max: usize },
    #[error("traffic layout is {actual}x{actual} but the grid is {expected}x{expected}")]
    TrafficSize { expected: usize, actual: usize },
    #[error("traffic layout for a {size}x{size} grid holds {cells} cells")]
    TrafficCells { size: usize, cells: usize },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Geometric success parameters for each traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficConfig {
    #[serde(default = "TrafficConfig::default_low")]
    pub low: f64,
    #[serde(default = "TrafficConfig::default_medium")]
    pub medium: f64,
    #[serde(default = "TrafficConfig::default_high")]
    pub high: f64,
}

impl TrafficConfig {
    const fn default_low() -> f64 {
        0.9
    }

    const fn default_medium() -> f64 {
        0.7
    }

    const fn default_high() -> f64 {
        0.5
    }

    /// Validate that every class maps to a usable geometric parameter.
    ///
    /// # Errors
    ///
    /// Returns an error when any parameter is not strictly inside `(0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in TrafficClass::ALL {
            let value = class.parameter(self);
            if !(value.is_finite() && value > 0.0 && value < 1.0) {
                return Err(ConfigError::TrafficParameter { class, value });
            }
        }
        Ok(())
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            low: Self::default_low(),
            medium: Self::default_medium(),
            high: Self::default_high(),
        }
    }
}

/// Shape of the street grid and its reward model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "GridConfig::default_size")]
    pub size: usize,
    /// Number of explicit delay buckets before the aggregated tail.
    #[serde(default = "GridConfig::default_horizon")]
    pub horizon: usize,
    #[serde(default)]
    pub traffic: TrafficConfig,
}

impl GridConfig {
    const fn default_size() -> usize {
        10
    }

    const fn default_horizon() -> usize {
        15
    }

    /// Default configuration with an explicit grid size.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Parse a grid configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate grid invariants.
    ///
    /// # Errors
    ///
    /// Returns an error when the size or horizon is zero or a traffic parameter is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::MinViolation {
                field: "grid.size",
                min: 1,
                value: 0,
            });
        }
        if self.horizon == 0 {
            return Err(ConfigError::MinViolation {
                field: "grid.horizon",
                min: 1,
                value: 0,
            });
        }
        self.traffic.validate()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            horizon: Self::default_horizon(),
            traffic: TrafficConfig::default(),
        }
    }
}

/// Stopping rule and numeric tolerances for value iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "SolverConfig::default_discount")]
    pub discount: f64,
    /// Sweeping stops once the residual is at or below this value.
    #[serde(default = "SolverConfig::default_tolerance")]
    pub tolerance: f64,
    /// Sweeps always performed, regardless of the residual.
    #[serde(default = "SolverConfig::default_min_sweeps")]
    pub min_sweeps: usize,
    /// Hard cap; reaching it without convergence is an error.
    #[serde(default = "SolverConfig::default_max_sweeps")]
    pub max_sweeps: usize,
    /// Allowed deviation of a transition distribution's total mass from 1.
    #[serde(default = "SolverConfig::default_mass_tolerance")]
    pub mass_tolerance: f64,
}

impl SolverConfig {
    const fn default_discount() -> f64 {
        1.0
    }

    const fn default_tolerance() -> f64 {
        1e-2
    }

    const fn default_min_sweeps() -> usize {
        10
    }

    const fn default_max_sweeps() -> usize {
        10_000
    }

    const fn default_mass_tolerance() -> f64 {
        1e-9
    }

    /// Parse a solver configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate solver invariants.
    ///
    /// # Errors
    ///
    /// Returns an error when a tolerance is not positive, the discount is outside `(0, 1]`,
    /// or the sweep bounds are inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.discount.is_finite() && self.discount > 0.0 && self.discount <= 1.0) {
            return Err(ConfigError::Discount {
                value: self.discount,
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "solver.tolerance",
                value: self.tolerance,
            });
        }
        if !(self.mass_tolerance.is_finite() && self.mass_tolerance > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "solver.mass_tolerance",
                value: self.mass_tolerance,
            });
        }
        if self.max_sweeps == 0 {
            return Err(ConfigError::MinViolation {
                field: "solver.max_sweeps",
                min: 1,
                value: 0,
            });
        }
        if self.min_sweeps > self.max_sweeps {
            return Err(ConfigError::SweepBounds {
                min: self.min_sweeps,
                max: self.max_sweeps,
            });
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount: Self::default_discount(),
            tolerance: Self::default_tolerance(),
            min_sweeps: Self::default_min_sweeps(),
            max_sweeps: Self::default_max_sweeps(),
            mass_tolerance: Self::default_mass_tolerance(),
        }
    }
}
