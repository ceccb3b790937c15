//! Transition and observation models, and the `Pomdp` problem bundle

use std::collections::HashMap;
use std::hash::Hash;

use crate::{
    Action, ActionSpace, Observation, ObservationSpace, Reward, RewardModel, State, StateSpace,
};

/// Transition model `T(s, a, s')`
///
/// Returns a probability in `[0, 1]`; unknown combinations yield 0.
pub trait TransitionModel<S, A>: Send + Sync {
    /// Probability of moving from `state` to `next_state` under `action`
    fn probability(&self, state: &S, action: &A, next_state: &S) -> f64;
}

impl<S, A, F> TransitionModel<S, A> for F
where
    F: Fn(&S, &A, &S) -> f64 + Send + Sync,
{
    fn probability(&self, state: &S, action: &A, next_state: &S) -> f64 {
        self(state, action, next_state)
    }
}

/// Observation model `O(s', a, o)`
///
/// Returns a probability in `[0, 1]`; unknown combinations yield 0.
pub trait ObservationModel<S, A, O>: Send + Sync {
    /// Probability of emitting `observation` after `action` lands in `next_state`
    fn likelihood(&self, next_state: &S, action: &A, observation: &O) -> f64;
}

impl<S, A, O, F> ObservationModel<S, A, O> for F
where
    F: Fn(&S, &A, &O) -> f64 + Send + Sync,
{
    fn likelihood(&self, next_state: &S, action: &A, observation: &O) -> f64 {
        self(next_state, action, observation)
    }
}

/// A finite POMDP: three label spaces plus the T, R and O models
pub trait Pomdp: Send + Sync {
    /// Hidden state type
    type State: State;
    /// Action type
    type Action: Action;
    /// Observation type
    type Observation: Observation;

    /// Get the state space
    fn state_space(&self) -> &StateSpace<Self::State>;

    /// Get the action space
    fn action_space(&self) -> &ActionSpace<Self::Action>;

    /// Get the observation space
    fn observation_space(&self) -> &ObservationSpace<Self::Observation>;

    /// `T(s, a, s')`
    fn transition(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64;

    /// `R(s, a, s')`
    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> Reward;

    /// `O(s', a, o)`
    fn observation(
        &self,
        next_state: &Self::State,
        action: &Self::Action,
        observation: &Self::Observation,
    ) -> f64;

    /// Smallest one-step reward over every `(s, a, s')` triple
    fn worst_reward(&self) -> Reward {
        let mut worst = Reward(f64::INFINITY);
        for s in self.state_space() {
            for a in self.action_space() {
                for next in self.state_space() {
                    worst = worst.min(self.reward(s, a, next));
                }
            }
        }
        worst
    }
}

impl<P> Pomdp for &P
where
    P: Pomdp + ?Sized,
{
    type State = P::State;
    type Action = P::Action;
    type Observation = P::Observation;

    fn state_space(&self) -> &StateSpace<Self::State> {
        (**self).state_space()
    }

    fn action_space(&self) -> &ActionSpace<Self::Action> {
        (**self).action_space()
    }

    fn observation_space(&self) -> &ObservationSpace<Self::Observation> {
        (**self).observation_space()
    }

    fn transition(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64 {
        (**self).transition(state, action, next_state)
    }

    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> Reward {
        (**self).reward(state, action, next_state)
    }

    fn observation(
        &self,
        next_state: &Self::State,
        action: &Self::Action,
        observation: &Self::Observation,
    ) -> f64 {
        (**self).observation(next_state, action, observation)
    }
}

/// POMDP assembled from spaces and three independent model implementations
pub struct ModelPomdp<S, A, O, T, R, Z> {
    states: StateSpace<S>,
    actions: ActionSpace<A>,
    observations: ObservationSpace<O>,
    transition: T,
    reward: R,
    observation: Z,
}

impl<S, A, O, T, R, Z> ModelPomdp<S, A, O, T, R, Z>
where
    S: State,
    A: Action,
    O: Observation,
    T: TransitionModel<S, A>,
    R: RewardModel<S, A>,
    Z: ObservationModel<S, A, O>,
{
    /// Create a new model-backed POMDP
    pub fn new(
        states: StateSpace<S>,
        actions: ActionSpace<A>,
        observations: ObservationSpace<O>,
        transition: T,
        reward: R,
        observation: Z,
    ) -> Self {
        Self {
            states,
            actions,
            observations,
            transition,
            reward,
            observation,
        }
    }
}

impl<S, A, O, T, R, Z> Pomdp for ModelPomdp<S, A, O, T, R, Z>
where
    S: State,
    A: Action,
    O: Observation,
    T: TransitionModel<S, A>,
    R: RewardModel<S, A>,
    Z: ObservationModel<S, A, O>,
{
    type State = S;
    type Action = A;
    type Observation = O;

    fn state_space(&self) -> &StateSpace<S> {
        &self.states
    }

    fn action_space(&self) -> &ActionSpace<A> {
        &self.actions
    }

    fn observation_space(&self) -> &ObservationSpace<O> {
        &self.observations
    }

    fn transition(&self, state: &S, action: &A, next_state: &S) -> f64 {
        self.transition.probability(state, action, next_state)
    }

    fn reward(&self, state: &S, action: &A, next_state: &S) -> Reward {
        self.reward.reward(state, action, next_state)
    }

    fn observation(&self, next_state: &S, action: &A, observation: &O) -> f64 {
        self.observation.likelihood(next_state, action, observation)
    }
}

/// Sparse keyed table with an implicit zero for every missing key
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTable<K: Eq + Hash> {
    entries: HashMap<K, f64>,
}

impl<K: Eq + Hash> Default for SparseTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> SparseTable<K> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a key, returning the previous one
    pub fn insert(&mut self, key: K, value: f64) -> Option<f64> {
        self.entries.insert(key, value)
    }

    /// Value for a key, 0 when absent
    pub fn get(&self, key: &K) -> f64 {
        self.entries.get(key).copied().unwrap_or(0.0)
    }

    /// Value for a key, `None` when absent
    pub fn get_explicit(&self, key: &K) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// Number of explicit entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no explicit entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash> FromIterator<(K, f64)> for SparseTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<S, A> TransitionModel<S, A> for SparseTable<(S, A, S)>
where
    S: State,
    A: Action,
{
    fn probability(&self, state: &S, action: &A, next_state: &S) -> f64 {
        self.get(&(state.clone(), action.clone(), next_state.clone()))
    }
}

impl<S, A> RewardModel<S, A> for SparseTable<(S, A, S)>
where
    S: State,
    A: Action,
{
    fn reward(&self, state: &S, action: &A, next_state: &S) -> Reward {
        Reward(self.get(&(state.clone(), action.clone(), next_state.clone())))
    }
}

impl<S, A, O> ObservationModel<S, A, O> for SparseTable<(S, A, O)>
where
    S: State,
    A: Action,
    O: Observation,
{
    fn likelihood(&self, next_state: &S, action: &A, observation: &O) -> f64 {
        self.get(&(next_state.clone(), action.clone(), observation.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiscreteSpace;

    fn coin() -> impl Pomdp<State = u8, Action = u8, Observation = u8> {
        let transition: SparseTable<(u8, u8, u8)> =
            [((0, 0, 0), 1.0), ((1, 0, 1), 1.0)].into_iter().collect();
        ModelPomdp::new(
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            DiscreteSpace::new(vec![0]).unwrap(),
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            transition,
            |s: &u8, _a: &u8, _next: &u8| if *s == 0 { -2.0 } else { 3.0 },
            |next: &u8, _a: &u8, o: &u8| if next == o { 1.0 } else { 0.0 },
        )
    }

    #[test]
    fn test_sparse_table_defaults_to_zero() {
        let mut table = SparseTable::new();
        table.insert(("a", "b"), 0.25);
        assert_eq!(table.get(&("a", "b")), 0.25);
        assert_eq!(table.get(&("x", "y")), 0.0);
        assert_eq!(table.get_explicit(&("x", "y")), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_model_pomdp_delegates() {
        let pomdp = coin();
        assert_eq!(pomdp.transition(&0, &0, &0), 1.0);
        assert_eq!(pomdp.transition(&0, &0, &1), 0.0);
        assert_eq!(pomdp.transition(&7, &9, &7), 0.0);
        assert_eq!(pomdp.reward(&1, &0, &1), Reward(3.0));
        assert_eq!(pomdp.observation(&1, &0, &1), 1.0);
    }

    #[test]
    fn test_worst_reward() {
        assert_eq!(coin().worst_reward(), Reward(-2.0));
        assert_eq!((&coin()).worst_reward(), Reward(-2.0));
    }
}
