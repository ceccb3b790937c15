//! Reward signals and reward models

use serde::{Deserialize, Serialize};

/// Reward for a single `(s, a, s')` transition
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reward(pub f64);

impl Reward {
    /// Wrap a raw reward value
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Value of receiving this reward on every step forever, `r / (1 − γ)`
    ///
    /// Infinite for `γ = 1`.
    #[must_use]
    pub fn perpetuity(self, discount: f64) -> f64 {
        self.0 / (1.0 - discount)
    }

    /// Smaller of two rewards, ignoring NaN
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reward model `R(s, a, s')`
///
/// Unknown combinations must yield a zero reward rather than fail.
pub trait RewardModel<S, A>: Send + Sync {
    /// Compute reward for a state-action-next_state transition
    fn reward(&self, state: &S, action: &A, next_state: &S) -> Reward;
}

impl<S, A, F> RewardModel<S, A> for F
where
    F: Fn(&S, &A, &S) -> f64 + Send + Sync,
{
    fn reward(&self, state: &S, action: &A, next_state: &S) -> Reward {
        Reward(self(state, action, next_state))
    }
}
