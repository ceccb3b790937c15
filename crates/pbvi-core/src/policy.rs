//! Policy abstractions for action selection from beliefs

use std::marker::PhantomData;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{Action, ActionSpace, Belief, PomdpError, State, ValueFunction};

/// Core policy trait: map a belief to an action
pub trait Policy: Send + Sync {
    /// State type of the beliefs consumed
    type State: State;
    /// Action type
    type Action: Action;

    /// Select an action for a belief
    fn act(&self, belief: &Belief<Self::State>) -> crate::Result<Self::Action>;
}

impl<S: State, A: Action> Policy for ValueFunction<S, A> {
    type State = S;
    type Action = A;

    fn act(&self, belief: &Belief<S>) -> crate::Result<A> {
        self.best_action(belief)
    }
}

/// Random policy that ignores the belief, used as a baseline
pub struct RandomPolicy<S, A> {
    /// Action space
    pub action_space: ActionSpace<A>,
    rng: Mutex<StdRng>,
    _state: PhantomData<fn() -> S>,
}

impl<S, A> RandomPolicy<S, A> {
    /// Create a new random policy, seeded for reproducibility when `seed` is given
    pub fn new(action_space: ActionSpace<A>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            action_space,
            rng: Mutex::new(rng),
            _state: PhantomData,
        }
    }
}

impl<S: State, A: Action> Policy for RandomPolicy<S, A> {
    type State = S;
    type Action = A;

    fn act(&self, _belief: &Belief<S>) -> crate::Result<A> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| PomdpError::Environment("random policy rng poisoned".into()))?;
        Ok(self.action_space.sample(&mut *rng).clone())
    }
}
