//! Value iteration over any [`MarkovModel`].
//!
//! Sweeps are synchronous: every backup in sweep `k + 1` reads the value table written by sweep
//! `k`, and the new values land in a second buffer that is swapped in once the sweep completes.
//! The loop runs at least `min_sweeps` times, then continues until the residual drops to or
//! below `tolerance`, and gives up with [`MdpError::NotConverged`] at `max_sweeps`.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;

use crate::config::SolverConfig;
use crate::error::MdpError;
use crate::model::MarkovModel;
use crate::numbers::is_probability;

/// Diagnostics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SolveReport {
    pub sweeps: usize,
    /// Residual of every sweep, in order.
    pub residuals: Vec<f64>,
    pub converged: bool,
}

impl SolveReport {
    #[must_use]
    pub fn final_residual(&self) -> f64 {
        self.residuals.last().copied().unwrap_or(0.0)
    }
}

/// Converged value function and greedy policy.
///
/// `values` covers every state; `policy` covers every non-terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<S: Ord, A> {
    pub values: BTreeMap<S, f64>,
    pub policy: BTreeMap<S, A>,
    pub report: SolveReport,
}

impl<S: Ord, A: Copy> Solution<S, A> {
    #[must_use]
    pub fn value(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    #[must_use]
    pub fn action(&self, state: &S) -> Option<A> {
        self.policy.get(state).copied()
    }
}

/// `(successor index, reward, probability)`
type Branch = (usize, f64, f64);

#[derive(Debug)]
struct ActionRow<A> {
    action: A,
    branches: Vec<Branch>,
}

#[derive(Debug)]
struct StateRow<A> {
    terminal: bool,
    actions: Vec<ActionRow<A>>,
}

/// Transition structure pulled from the model once and checked before any sweep.
#[derive(Debug)]
struct BackupPlan<A> {
    rows: Vec<StateRow<A>>,
}

impl<A: Copy + Debug> BackupPlan<A> {
    fn build<M>(model: &M, mass_tolerance: f64) -> Result<Self, MdpError>
    where
        M: MarkovModel<Action = A>,
    {
        let mut rows = Vec::with_capacity(model.states().len());
        for &state in model.states() {
            let terminal = model.is_terminal(state);
            let legal = model.legal_actions(state)?;
            if legal.is_empty() && !terminal {
                return Err(MdpError::NoLegalActions {
                    state: format!("{state:?}"),
                });
            }
            let mut actions = Vec::with_capacity(legal.len());
            for &action in legal {
                let outcomes = model.transition_distribution(state, action)?;
                if let Some(bad) = outcomes.iter().find(|o| !is_probability(o.probability)) {
                    return Err(MdpError::OutcomeProbability {
                        state: format!("{state:?}"),
                        action: format!("{action:?}"),
                        value: bad.probability,
                    });
                }
                let total: f64 = outcomes.iter().map(|o| o.probability).sum();
                if !((total - 1.0).abs() <= mass_tolerance) {
                    return Err(MdpError::DistributionMass {
                        state: format!("{state:?}"),
                        action: format!("{action:?}"),
                        total,
                    });
                }
                let branches = outcomes
                    .iter()
                    .map(|o| {
                        model
                            .state_index(o.successor)
                            .map(|idx| (idx, o.reward, o.probability))
                            .ok_or_else(|| MdpError::UnknownSuccessor {
                                state: format!("{:?}", o.successor),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                actions.push(ActionRow { action, branches });
            }
            rows.push(StateRow { terminal, actions });
        }
        Ok(Self { rows })
    }
}

fn action_value(branches: &[Branch], values: &[f64], discount: f64) -> f64 {
    branches
        .iter()
        .map(|&(next, reward, prob)| prob * (reward + discount * values[next]))
        .sum()
}

/// First action reaching the maximum action-value; later equal values never replace it.
fn greedy<A: Copy>(row: &StateRow<A>, values: &[f64], discount: f64) -> Option<(A, f64)> {
    let mut best: Option<(A, f64)> = None;
    for entry in &row.actions {
        let q = action_value(&entry.branches, values, discount);
        match best {
            Some((_, top)) if q <= top => {}
            _ => best = Some((entry.action, q)),
        }
    }
    best
}

/// Bellman-optimality fixed point solver.
#[derive(Debug, Clone, Default)]
pub struct ValueIterationSolver {
    config: SolverConfig,
}

impl ValueIterationSolver {
    /// # Errors
    ///
    /// Returns an error when the configuration fails validation.
    pub fn new(config: SolverConfig) -> Result<Self, MdpError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run value iteration to convergence and extract the greedy policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the model has a non-terminal state without actions, a
    /// distribution that does not sum to one, a successor outside the state set, or when the
    /// residual is still above tolerance after `max_sweeps` sweeps.
    pub fn solve<M: MarkovModel>(
        &self,
        model: &M,
    ) -> Result<Solution<M::State, M::Action>, MdpError> {
        let plan = BackupPlan::build(model, self.config.mass_tolerance)?;
        let (values, report) = self.sweep(&plan)?;
        let policy = self.greedy_policy(model, &plan, &values);
        let values = model.states().iter().copied().zip(values).collect();
        Ok(Solution {
            values,
            policy,
            report,
        })
    }

    fn sweep<A: Copy>(&self, plan: &BackupPlan<A>) -> Result<(Vec<f64>, SolveReport), MdpError> {
        let cfg = &self.config;
        let mut current = vec![0.0; plan.rows.len()];
        let mut next = current.clone();
        let mut report = SolveReport::default();
        let mut residual = f64::INFINITY;

        while residual > cfg.tolerance || report.sweeps < cfg.min_sweeps {
            if report.sweeps >= cfg.max_sweeps {
                log::warn!(
                    "value iteration stopped at the {} sweep cap with residual {residual:.6}",
                    cfg.max_sweeps
                );
                return Err(MdpError::NotConverged {
                    sweeps: report.sweeps,
                    residual,
                });
            }

            residual = 0.0;
            for (idx, row) in plan.rows.iter().enumerate() {
                let updated = if row.terminal {
                    current[idx]
                } else {
                    greedy(row, &current, cfg.discount).map_or(current[idx], |(_, q)| q)
                };
                residual = residual.max((updated - current[idx]).abs());
                next[idx] = updated;
            }
            std::mem::swap(&mut current, &mut next);

            report.sweeps += 1;
            report.residuals.push(residual);
            log::debug!("sweep {} residual {residual:.6}", report.sweeps);
        }

        log::info!(
            "value iteration converged after {} sweeps (residual {residual:.6})",
            report.sweeps
        );
        report.converged = true;
        Ok((current, report))
    }

    fn greedy_policy<M: MarkovModel>(
        &self,
        model: &M,
        plan: &BackupPlan<M::Action>,
        values: &[f64],
    ) -> BTreeMap<M::State, M::Action> {
        model
            .states()
            .iter()
            .zip(&plan.rows)
            .filter(|(_, row)| !row.terminal)
            .filter_map(|(&state, row)| {
                greedy(row, values, self.config.discount).map(|(action, _)| (state, action))
            })
            .collect()
    }

    /// Greedy policy for an existing value table; re-running it on a converged table reproduces
    /// the policy returned by [`ValueIterationSolver::solve`].
    ///
    /// # Errors
    ///
    /// Returns an error when the model is malformed or `values` misses a state.
    pub fn extract_policy<M: MarkovModel>(
        &self,
        model: &M,
        values: &BTreeMap<M::State, f64>,
    ) -> Result<BTreeMap<M::State, M::Action>, MdpError> {
        let plan = BackupPlan::build(model, self.config.mass_tolerance)?;
        let dense = dense_values(model, values)?;
        Ok(self.greedy_policy(model, &plan, &dense))
    }

    /// Action-values of every legal action in `state`, in the model's action order.
    ///
    /// # Errors
    ///
    /// Returns an error when `state` is foreign or `values` misses a successor.
    pub fn q_values<M: MarkovModel>(
        &self,
        model: &M,
        values: &BTreeMap<M::State, f64>,
        state: M::State,
    ) -> Result<Vec<(M::Action, f64)>, MdpError> {
        model
            .legal_actions(state)?
            .iter()
            .map(|&action| {
                let mut q = 0.0;
                for outcome in model.transition_distribution(state, action)? {
                    let next = values.get(&outcome.successor).copied().ok_or_else(|| {
                        MdpError::MissingValue {
                            state: format!("{:?}", outcome.successor),
                        }
                    })?;
                    q += outcome.probability * (outcome.reward + self.config.discount * next);
                }
                Ok((action, q))
            })
            .collect()
    }
}

fn dense_values<M: MarkovModel>(
    model: &M,
    values: &BTreeMap<M::State, f64>,
) -> Result<Vec<f64>, MdpError> {
    model
        .states()
        .iter()
        .map(|state| {
            values
                .get(state)
                .copied()
                .ok_or_else(|| MdpError::MissingValue {
                    state: format!("{state:?}"),
                })
        })
        .collect()
}
