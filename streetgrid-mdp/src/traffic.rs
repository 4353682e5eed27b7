//! Per-cell traffic classes and their random assignment.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, TrafficConfig};
use crate::grid::Cell;

/// Congestion level of a street cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficClass {
    Low,
    Medium,
    High,
}

impl TrafficClass {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Geometric success parameter configured for this class.
    #[must_use]
    pub const fn parameter(self, cfg: &TrafficConfig) -> f64 {
        match self {
            Self::Low => cfg.low,
            Self::Medium => cfg.medium,
            Self::High => cfg.high,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Stable position of the class inside [`TrafficClass::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// Square layout of traffic classes, fixed once built.
///
/// Deserialized layouts must carry exactly `size * size` classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTrafficMap")]
pub struct TrafficMap {
    size: usize,
    classes: Vec<TrafficClass>,
}

#[derive(Deserialize)]
struct RawTrafficMap {
    size: usize,
    classes: Vec<TrafficClass>,
}

impl TryFrom<RawTrafficMap> for TrafficMap {
    type Error = ConfigError;

    fn try_from(raw: RawTrafficMap) -> Result<Self, Self::Error> {
        let expected = raw.size.checked_mul(raw.size);
        if expected != Some(raw.classes.len()) {
            return Err(ConfigError::TrafficCells {
                size: raw.size,
                cells: raw.classes.len(),
            });
        }
        Ok(Self {
            size: raw.size,
            classes: raw.classes,
        })
    }
}

impl TrafficMap {
    /// Build a layout by asking `class_at` for every cell in `(x, y)` order.
    #[must_use]
    pub fn from_fn(size: usize, mut class_at: impl FnMut(Cell) -> TrafficClass) -> Self {
        let classes = Cell::all(size).map(&mut class_at).collect();
        Self { size, classes }
    }

    /// Every cell carries the same class.
    #[must_use]
    pub fn uniform(size: usize, class: TrafficClass) -> Self {
        Self::from_fn(size, |_| class)
    }

    /// Draw each cell's class uniformly among the three levels.
    pub fn sample<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let map = Self::from_fn(size, |_| {
            TrafficClass::ALL[rng.gen_range(0..TrafficClass::ALL.len())]
        });
        log::trace!("sampled traffic layout {size}x{size}: {:?}", map.counts());
        map
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of cells carrying a class.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class of `cell`, or `None` when the cell lies outside the layout.
    #[must_use]
    pub fn class(&self, cell: Cell) -> Option<TrafficClass> {
        cell.index(self.size)
            .and_then(|idx| self.classes.get(idx).copied())
    }

    /// Iterate cells with their class in `(x, y)` order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, TrafficClass)> + '_ {
        Cell::all(self.size).zip(self.classes.iter().copied())
    }

    /// Number of cells per class, indexed like [`TrafficClass::ALL`].
    #[must_use]
    pub fn counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for class in &self.classes {
            counts[class.index()] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn parameters_follow_config() {
        let cfg = TrafficConfig::default();
        assert!((TrafficClass::Low.parameter(&cfg) - 0.9).abs() < f64::EPSILON);
        assert!((TrafficClass::Medium.parameter(&cfg) - 0.7).abs() < f64::EPSILON);
        assert!((TrafficClass::High.parameter(&cfg) - 0.5).abs() < f64::EPSILON);
        for (idx, class) in TrafficClass::ALL.into_iter().enumerate() {
            assert_eq!(class.index(), idx);
        }
    }

    #[test]
    fn from_fn_visits_cells_in_order() {
        let map = TrafficMap::from_fn(3, |cell| {
            if cell.x == 2 {
                TrafficClass::High
            } else {
                TrafficClass::Low
            }
        });
        assert_eq!(map.class(Cell::new(2, 0)), Some(TrafficClass::High));
        assert_eq!(map.class(Cell::new(1, 2)), Some(TrafficClass::Low));
        assert_eq!(map.class(Cell::new(3, 0)), None);
        assert_eq!(map.counts(), [6, 0, 3]);
        assert_eq!(map.iter().count(), 9);
    }

    #[test]
    fn layouts_round_trip_through_json() {
        let map = TrafficMap::from_fn(2, |cell| {
            if cell.y == 1 {
                TrafficClass::Medium
            } else {
                TrafficClass::Low
            }
        });
        let json = serde_json::to_string(&map).unwrap();
        let back: TrafficMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn short_layouts_fail_to_deserialize() {
        let err = serde_json::from_str::<TrafficMap>(r#"{"size":2,"classes":["Low"]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("2x2"), "{err}");
        let long = r#"{"size":1,"classes":["Low","High"]}"#;
        assert!(serde_json::from_str::<TrafficMap>(long).is_err());
    }

    #[test]
    fn sampling_is_reproducible_per_seed() {
        let a = TrafficMap::sample(8, &mut SmallRng::seed_from_u64(7));
        let b = TrafficMap::sample(8, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.counts().iter().sum::<usize>(), 64);
    }

    #[test]
    fn sampling_uses_every_class_on_large_grids() {
        let map = TrafficMap::sample(20, &mut SmallRng::seed_from_u64(0xC0FFEE));
        assert!(map.counts().iter().all(|&n| n > 0));
    }
}
