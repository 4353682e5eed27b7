//! Street-grid routing MDP
//!
//! Models "fastest path across a street grid with variable traffic" as a Markov Decision Process
//! and solves it with value iteration. Moves are deterministic; the delay paid on entering a cell
//! follows a truncated geometric distribution selected by that cell's traffic class.
//! Rendering of the resulting tables is left to downstream consumers.

pub mod config;
pub mod delay;
pub mod error;
pub mod grid;
pub mod model;
pub mod numbers;
pub mod report;
pub mod seed;
pub mod solver;
pub mod traffic;

// Re-export commonly used types
pub use config::{ConfigError, GridConfig, SolverConfig, TrafficConfig};
pub use delay::{DelayDistribution, DelayTable};
pub use error::MdpError;
pub use grid::{Action, ActionSet, Cell, GridMdp};
pub use model::{MarkovModel, Outcome};
pub use report::{CellReport, GridReport};
pub use seed::{derive_stream_seed, traffic_rng};
pub use solver::{Solution, SolveReport, ValueIterationSolver};
pub use traffic::{TrafficClass, TrafficMap};

/// Solution of a [`GridMdp`] keyed by grid cell.
pub type GridSolution = Solution<Cell, Action>;

/// Build a seeded grid and solve it in one call.
///
/// # Errors
///
/// Returns an error if either configuration is invalid or value iteration fails.
pub fn solve_seeded(
    grid: GridConfig,
    solver: SolverConfig,
    seed: u64,
) -> Result<(GridMdp, GridSolution), MdpError> {
    let solver = ValueIterationSolver::new(solver)?;
    let mdp = GridMdp::from_seed(grid, seed)?;
    let solution = solver.solve(&mdp)?;
    Ok((mdp, solution))
}
