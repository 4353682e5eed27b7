use thiserror::Error;

use crate::config::ConfigError;

/// Failures raised by the model, the solver, and policy walks.
#[derive(Debug, Error, PartialEq)]
pub enum MdpError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("state ({x}, {y}) lies outside the {size}x{size} grid")]
    StateOutOfBounds { x: usize, y: usize, size: usize },
    #[error("action {action} is not legal in state {state}")]
    IllegalAction { state: String, action: String },
    #[error("successor {state} is not a state of the model")]
    UnknownSuccessor { state: String },
    #[error("value table has no entry for state {state}")]
    MissingValue { state: String },
    #[error("non-terminal state {state} has no legal actions")]
    NoLegalActions { state: String },
    #[error("transition distribution for {state} / {action} sums to {total} instead of 1")]
    DistributionMass {
        state: String,
        action: String,
        total: f64,
    },
    #[error("transition for {state} / {action} has invalid probability {value}")]
    OutcomeProbability {
        state: String,
        action: String,
        value: f64,
    },
    #[error("geometric parameter {parameter} produced invalid probability {value} at bucket {bucket}")]
    InvalidProbability {
        parameter: f64,
        bucket: usize,
        value: f64,
    },
    #[error("value iteration did not converge within {sweeps} sweeps (residual {residual})")]
    NotConverged { sweeps: usize, residual: f64 },
    #[error("policy has no action for non-terminal state {state}")]
    MissingPolicy { state: String },
    #[error("policy revisits state {state} before reaching the terminal")]
    PolicyCycle { state: String },
}

impl MdpError {
    pub(crate) fn illegal_action<S: std::fmt::Debug, A: std::fmt::Debug>(
        state: S,
        action: A,
    ) -> Self {
        Self::IllegalAction {
            state: format!("{state:?}"),
            action: format!("{action:?}"),
        }
    }
}
