//! Transition-checked state machine shared by both nodes.
//!
//! Each node defines its own state enum and the table of legal transitions
//! through [`NodeState`]. [`StateMachine`] enforces that table, counts how
//! often each state was entered and keeps a bounded history of transitions
//! for diagnostics and tests.
//!
//! # Examples
//!
//! ```
//! use doorlock_emulator::{ControlState, StateMachine};
//!
//! let mut machine = StateMachine::<ControlState>::new();
//! assert_eq!(machine.current_state(), &ControlState::Idle);
//!
//! machine.transition_to(ControlState::BootstrapCheck).unwrap();
//! assert!(machine.transition_to(ControlState::Actuating).is_err());
//! assert_eq!(machine.visits(ControlState::BootstrapCheck), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use doorlock_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// One HMI open cycle is six transitions, so the window covers well over a
/// dozen complete user interactions. Visit counts are not bounded by it.
pub const MAX_HISTORY_SIZE: usize = 100;

/// A node's state set and its transition table.
pub trait NodeState: Copy + Eq + Hash + fmt::Debug + fmt::Display {
    /// State a freshly booted node starts in.
    const INITIAL: Self;

    /// Check if transition to `target` is legal from this state.
    fn can_transition_to(&self, target: &Self) -> bool;
}

/// A single state transition with timestamp.
///
/// The `timestamp` is not serialized; on deserialization it is set to the
/// current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The state transitioned from.
    pub from: S,

    /// The state transitioned to.
    pub to: S,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl<S: NodeState> StateTransition<S> {
    /// Record a transition happening now.
    pub fn new(from: S, to: S) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// Transition-checked state machine with bounded history.
///
/// Not thread-safe; each node owns its machine on its own task.
#[derive(Debug)]
pub struct StateMachine<S> {
    current_state: S,
    history: VecDeque<StateTransition<S>>,
    visits: HashMap<S, usize>,
}

impl<S: NodeState> StateMachine<S> {
    /// Create a machine in the node's initial state.
    pub fn new() -> Self {
        Self {
            current_state: S::INITIAL,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            visits: HashMap::new(),
        }
    }

    /// Current state.
    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// Check whether the machine is in `state`.
    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// The most recent transitions, oldest first, at most
    /// [`MAX_HISTORY_SIZE`].
    pub fn history(&self) -> &VecDeque<StateTransition<S>> {
        &self.history
    }

    /// Number of times `state` was entered since the machine was created.
    pub fn visits(&self, state: S) -> usize {
        self.visits.get(&state).copied().unwrap_or(0)
    }

    /// Move to `new_state`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the table forbids the
    /// transition; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: S) -> Result<StateTransition<S>> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.current_state = new_state;
        *self.visits.entry(new_state).or_insert(0) += 1;
        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        Ok(transition)
    }
}

impl<S: NodeState> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}
