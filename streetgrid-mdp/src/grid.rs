//! Street grid modelled as an MDP.
//!
//! States are the `size × size` intersections, actions are the four axis-aligned moves that keep
//! the walker on the grid, and the goal is the absorbing far corner `(size - 1, size - 1)`.
//! Movement always succeeds exactly as intended; all randomness lives in the delay paid on
//! entering the destination cell, whose traffic class picks the delay distribution.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::{ConfigError, GridConfig};
use crate::delay::DelayTable;
use crate::error::MdpError;
use crate::model::{MarkovModel, Outcome};
use crate::seed::traffic_rng;
use crate::traffic::{TrafficClass, TrafficMap};

/// Grid intersection; `x` grows to the right, `y` grows upwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// All cells of a `size × size` grid in `(x, y)` lexicographic order.
    pub fn all(size: usize) -> impl Iterator<Item = Self> {
        (0..size).flat_map(move |x| (0..size).map(move |y| Self { x, y }))
    }

    /// Dense index of the cell in a `size × size` grid.
    #[must_use]
    pub const fn index(self, size: usize) -> Option<usize> {
        if self.x < size && self.y < size {
            Some(self.x * size + self.y)
        } else {
            None
        }
    }

    /// Neighbour reached by `action`, if it stays on the grid.
    #[must_use]
    pub const fn step(self, action: Action, size: usize) -> Option<Self> {
        let (x, y) = (self.x, self.y);
        if x >= size || y >= size {
            return None;
        }
        match action {
            Action::Up if y + 1 < size => Some(Self { x, y: y + 1 }),
            Action::Right if x + 1 < size => Some(Self { x: x + 1, y }),
            Action::Down if y > 0 => Some(Self { x, y: y - 1 }),
            Action::Left if x > 0 => Some(Self { x: x - 1, y }),
            _ => None,
        }
    }
}

/// Axis-aligned move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Up,
    Right,
    Down,
    Left,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Order in which legal actions are discovered per state. Greedy policies keep the first
    /// maximizing action in this order.
    pub const DISCOVERY_ORDER: [Self; 4] = [Self::Right, Self::Left, Self::Up, Self::Down];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }

    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Self::Up => '↑',
            Self::Right => '→',
            Self::Down => '↓',
            Self::Left => '←',
        }
    }
}

pub type ActionSet = SmallVec<[Action; 4]>;

/// The `(S, A, R, T)` tuple of the street-grid routing problem.
#[derive(Debug, Clone)]
pub struct GridMdp {
    config: GridConfig,
    terminal: Cell,
    states: Vec<Cell>,
    actions: Vec<ActionSet>,
    traffic: TrafficMap,
    delays: DelayTable,
}

impl GridMdp {
    /// Build a grid whose traffic classes are drawn uniformly from `rng`.
    ///
    /// The generator is consumed only here; the finished model never draws again.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn generate<R: Rng + ?Sized>(config: GridConfig, rng: &mut R) -> Result<Self, MdpError> {
        config.validate()?;
        let traffic = TrafficMap::sample(config.size, rng);
        Self::with_traffic(config, traffic)
    }

    /// Build a grid from a user seed using the dedicated traffic stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn from_seed(config: GridConfig, seed: u64) -> Result<Self, MdpError> {
        let mut rng = traffic_rng(seed);
        Self::generate(config, &mut rng)
    }

    /// Build a grid over an explicit traffic layout.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the layout size differs from
    /// `config.size`.
    pub fn with_traffic(config: GridConfig, traffic: TrafficMap) -> Result<Self, MdpError> {
        config.validate()?;
        if traffic.size() != config.size {
            return Err(ConfigError::TrafficSize {
                expected: config.size,
                actual: traffic.size(),
            }
            .into());
        }
        if traffic.len() != config.size * config.size {
            return Err(ConfigError::TrafficCells {
                size: config.size,
                cells: traffic.len(),
            }
            .into());
        }
        let delays = DelayTable::new(&config)?;
        let size = config.size;
        let states: Vec<Cell> = Cell::all(size).collect();
        let actions = states
            .iter()
            .map(|&cell| {
                Action::DISCOVERY_ORDER
                    .into_iter()
                    .filter(|&action| cell.step(action, size).is_some())
                    .collect()
            })
            .collect();
        Ok(Self {
            config,
            terminal: Cell::new(size - 1, size - 1),
            states,
            actions,
            traffic,
            delays,
        })
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.config.size
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub const fn terminal(&self) -> Cell {
        self.terminal
    }

    #[must_use]
    pub const fn traffic(&self) -> &TrafficMap {
        &self.traffic
    }

    #[must_use]
    pub const fn delays(&self) -> &DelayTable {
        &self.delays
    }

    fn check(&self, cell: Cell) -> Result<usize, MdpError> {
        cell.index(self.size()).ok_or(MdpError::StateOutOfBounds {
            x: cell.x,
            y: cell.y,
            size: self.size(),
        })
    }

    /// # Errors
    ///
    /// Returns an error when `cell` is off the grid.
    pub fn traffic_class(&self, cell: Cell) -> Result<TrafficClass, MdpError> {
        self.traffic.class(cell).ok_or(MdpError::StateOutOfBounds {
            x: cell.x,
            y: cell.y,
            size: self.size(),
        })
    }

    /// Geometric parameter of the delay paid when entering `cell`.
    ///
    /// # Errors
    ///
    /// Returns an error when `cell` is off the grid.
    pub fn traffic_parameter(&self, cell: Cell) -> Result<f64, MdpError> {
        Ok(self.traffic_class(cell)?.parameter(&self.config.traffic))
    }

    /// Static cell → parameter layout for renderers.
    #[must_use]
    pub fn parameter_grid(&self) -> BTreeMap<Cell, f64> {
        self.traffic
            .iter()
            .map(|(cell, class)| (cell, class.parameter(&self.config.traffic)))
            .collect()
    }

    /// Follow `policy` from `start` until the terminal cell, returning every visited cell.
    ///
    /// # Errors
    ///
    /// Returns an error when `start` is off the grid, the policy lacks or misuses an action for
    /// a visited cell, or the walk loops.
    pub fn route(
        &self,
        policy: &BTreeMap<Cell, Action>,
        start: Cell,
    ) -> Result<Vec<Cell>, MdpError> {
        self.check(start)?;
        let mut path = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut cell = start;
        while cell != self.terminal {
            let action = *policy.get(&cell).ok_or_else(|| MdpError::MissingPolicy {
                state: format!("{cell:?}"),
            })?;
            if !self.legal_actions(cell)?.contains(&action) {
                return Err(MdpError::illegal_action(cell, action));
            }
            cell = self.next_state(cell, action);
            if !seen.insert(cell) {
                return Err(MdpError::PolicyCycle {
                    state: format!("{cell:?}"),
                });
            }
            path.push(cell);
        }
        Ok(path)
    }
}

impl MarkovModel for GridMdp {
    type State = Cell;
    type Action = Action;

    fn states(&self) -> &[Cell] {
        &self.states
    }

    fn state_index(&self, state: Cell) -> Option<usize> {
        state.index(self.size())
    }

    fn is_terminal(&self, state: Cell) -> bool {
        state == self.terminal
    }

    fn legal_actions(&self, state: Cell) -> Result<&[Action], MdpError> {
        let idx = self.check(state)?;
        Ok(self.actions[idx].as_slice())
    }

    fn next_state(&self, state: Cell, action: Action) -> Cell {
        match state.step(action, self.size()) {
            Some(next) => next,
            None => panic!(
                "move {action:?} from {state:?} leaves the {size}x{size} grid",
                size = self.size()
            ),
        }
    }

    fn transition_distribution(
        &self,
        state: Cell,
        action: Action,
    ) -> Result<Vec<Outcome<Cell>>, MdpError> {
        if !self.legal_actions(state)?.contains(&action) {
            return Err(MdpError::illegal_action(state, action));
        }
        let successor = self.next_state(state, action);
        let class = self.traffic_class(successor)?;
        Ok(self
            .delays
            .get(class)
            .outcomes()
            .map(|(reward, probability)| Outcome {
                successor,
                reward,
                probability,
            })
            .collect())
    }
}
