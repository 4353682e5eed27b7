//! Contract between a finite MDP and the solvers that consume it.

use std::fmt::Debug;

use serde::Serialize;

use crate::error::MdpError;

/// One `(successor, reward)` outcome of taking an action, with its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outcome<S> {
    pub successor: S,
    pub reward: f64,
    pub probability: f64,
}

/// A finite MDP exposed through state enumeration, legal actions, successors,
/// and `(successor, reward)` distributions.
///
/// Solvers rely only on this trait, never on a concrete model.
pub trait MarkovModel {
    type State: Copy + Ord + Debug;
    type Action: Copy + Eq + Debug;

    /// Every state, in a fixed order shared with [`MarkovModel::state_index`].
    fn states(&self) -> &[Self::State];

    /// Position of `state` inside [`MarkovModel::states`], or `None` for foreign states.
    fn state_index(&self, state: Self::State) -> Option<usize>;

    /// Whether `state` is absorbing and excluded from backups.
    fn is_terminal(&self, state: Self::State) -> bool;

    /// Actions available in `state`, in the order solvers use for tie-breaking.
    ///
    /// # Errors
    ///
    /// Returns an error when `state` does not belong to the model.
    fn legal_actions(&self, state: Self::State) -> Result<&[Self::Action], MdpError>;

    /// Deterministic successor of taking `action` in `state`.
    ///
    /// # Panics
    ///
    /// Implementations panic when `action` is not legal in `state`; callers must only pass
    /// actions returned by [`MarkovModel::legal_actions`].
    fn next_state(&self, state: Self::State, action: Self::Action) -> Self::State;

    /// Joint distribution over `(successor, reward)` for `action` taken in `state`.
    ///
    /// # Errors
    ///
    /// Returns an error when `state` is foreign or `action` is not legal in it.
    fn transition_distribution(
        &self,
        state: Self::State,
        action: Self::Action,
    ) -> Result<Vec<Outcome<Self::State>>, MdpError>;
}
