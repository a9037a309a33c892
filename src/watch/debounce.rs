// src/watch/debounce.rs

//! Debounce state machine.
//!
//! Pure and synchronous: the caller supplies the current instant, and the
//! watch loop sleeps until [`Debounce::deadline`]. Only one deadline exists
//! at a time, so there is never more than one logical timer pending.

use tokio::time::{Duration, Instant};

use crate::types::DebouncePolicy;

/// Default quiet period.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// A rebuild will be requested at `deadline` unless it is pushed back.
    Armed { deadline: Instant },
}

/// What a qualifying event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceAction {
    /// Idle -> armed; a new cycle started.
    Armed,
    /// Restart policy: the pending deadline moved to `now + delay`.
    Rearmed,
    /// Fixed policy: the event joined the pending cycle unchanged.
    Absorbed,
}

#[derive(Debug, Clone)]
pub struct Debounce {
    policy: DebouncePolicy,
    delay: Duration,
    state: DebounceState,
}

impl Debounce {
    pub fn new(policy: DebouncePolicy, delay: Duration) -> Self {
        Self {
            policy,
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Armed { deadline } => Some(deadline),
        }
    }

    /// Record one qualifying event observed at `now`.
    pub fn on_event(&mut self, now: Instant) -> DebounceAction {
        match (self.state, self.policy) {
            (DebounceState::Idle, _) => {
                self.state = DebounceState::Armed {
                    deadline: now + self.delay,
                };
                DebounceAction::Armed
            }
            (DebounceState::Armed { .. }, DebouncePolicy::Restart) => {
                self.state = DebounceState::Armed {
                    deadline: now + self.delay,
                };
                DebounceAction::Rearmed
            }
            (DebounceState::Armed { .. }, DebouncePolicy::Fixed) => DebounceAction::Absorbed,
        }
    }

    /// Returns true exactly once per cycle, when `now` has reached the
    /// deadline; the state goes back to idle so the next event starts fresh.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }
}
