use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use streetgrid_mdp::{
    Cell, GridConfig, GridMdp, GridReport, MdpError, SolverConfig, ValueIterationSolver,
};

/// Grid and solver settings loaded from `--config` before flag overrides apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedRun {
    pub seed: u64,
    pub sweeps: usize,
    pub final_residual: f64,
    pub residuals: Vec<f64>,
    pub start: Cell,
    pub route: Vec<Cell>,
    pub expected_delay: f64,
    pub grid: GridReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Solved(SolvedRun),
    Failed { seed: u64, error: String },
}

impl RunOutcome {
    pub const fn seed(&self) -> u64 {
        match self {
            Self::Solved(run) => run.seed,
            Self::Failed { seed, .. } => *seed,
        }
    }

    pub const fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }
}

/// Build the grid for `seed` through [`GridMdp::from_seed`], solve it, and flatten the result.
pub fn run_seed(
    cfg: &RunConfig,
    solver: &ValueIterationSolver,
    seed: u64,
    start: Cell,
) -> RunOutcome {
    match solve_seed(cfg, solver, seed, start) {
        Ok(run) => RunOutcome::Solved(run),
        Err(err) => {
            log::warn!("seed {seed} failed: {err}");
            RunOutcome::Failed {
                seed,
                error: err.to_string(),
            }
        }
    }
}

fn solve_seed(
    cfg: &RunConfig,
    solver: &ValueIterationSolver,
    seed: u64,
    start: Cell,
) -> Result<SolvedRun, MdpError> {
    let mdp = GridMdp::from_seed(cfg.grid.clone(), seed)?;
    let solution = solver.solve(&mdp)?;
    let route = mdp.route(&solution.policy, start)?;
    let expected_delay = solution.value(&start).map_or(0.0, |v| -v);
    Ok(SolvedRun {
        seed,
        sweeps: solution.report.sweeps,
        final_residual: solution.report.final_residual(),
        residuals: solution.report.residuals.clone(),
        start,
        route,
        expected_delay,
        grid: GridReport::new(&mdp, &solution),
    })
}
