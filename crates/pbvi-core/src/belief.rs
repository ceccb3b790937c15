//! Beliefs over hidden states and the Bayesian belief update

use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Pomdp, PomdpError, Result, StateSpace};

/// Probability distribution over hidden states
///
/// Entries keep the order they were inserted in, which for beliefs built by
/// this crate is the state-space order. The empty belief is the sentinel for
/// an observation that cannot occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Belief<S: Hash + Eq> {
    probs: IndexMap<S, f64>,
}

impl<S> Belief<S>
where
    S: Clone + Hash + Eq + std::fmt::Debug,
{
    /// Create a belief, checking it is a distribution within `tolerance`
    pub fn new(probs: IndexMap<S, f64>, tolerance: f64) -> Result<Self> {
        if probs.is_empty() {
            return Err(PomdpError::InvalidBelief("belief has no states".into()));
        }
        if let Some((state, p)) = probs.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
            return Err(PomdpError::InvalidBelief(format!(
                "probability of {state:?} is {p}"
            )));
        }
        let total: f64 = probs.values().sum();
        if (total - 1.0).abs() > tolerance {
            return Err(PomdpError::InvalidBelief(format!(
                "probabilities sum to {total}, expected 1"
            )));
        }
        Ok(Self { probs })
    }

    /// Create a validated belief from `(state, probability)` pairs
    pub fn from_pairs<I>(pairs: I, tolerance: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
    {
        Self::new(pairs.into_iter().collect(), tolerance)
    }

    /// Create a validated belief covering exactly the given state space
    ///
    /// States missing from `pairs` get probability 0; labels outside the
    /// space are rejected.
    pub fn over_space<I>(space: &StateSpace<S>, pairs: I, tolerance: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
    {
        let given: IndexMap<S, f64> = pairs.into_iter().collect();
        if let Some(unknown) = given.keys().find(|s| !space.contains(s)) {
            return Err(PomdpError::UnknownLabel(format!("{unknown:?}")));
        }
        let probs = space
            .iter()
            .map(|s| (s.clone(), given.get(s).copied().unwrap_or(0.0)))
            .collect();
        Self::new(probs, tolerance)
    }

    /// Uniform belief over a state space
    #[must_use]
    pub fn uniform(space: &StateSpace<S>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let p = 1.0 / space.len() as f64;
        Self {
            probs: space.iter().map(|s| (s.clone(), p)).collect(),
        }
    }

    /// Belief concentrated on a single state
    #[must_use]
    pub fn point(space: &StateSpace<S>, state: &S) -> Self {
        Self {
            probs: space
                .iter()
                .map(|s| (s.clone(), if s == state { 1.0 } else { 0.0 }))
                .collect(),
        }
    }

    /// The empty sentinel belief
    #[must_use]
    pub fn empty() -> Self {
        Self {
            probs: IndexMap::new(),
        }
    }

    /// Whether this is the impossible-observation sentinel
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Number of states in the support map
    #[must_use]
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Probability of a state, 0 when absent
    pub fn get(&self, state: &S) -> f64 {
        self.probs.get(state).copied().unwrap_or(0.0)
    }

    /// Iterate `(state, probability)` in order
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.probs.iter().map(|(s, p)| (s, *p))
    }

    /// States in order
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.probs.keys()
    }

    /// Total mass
    #[must_use]
    pub fn total(&self) -> f64 {
        self.probs.values().sum()
    }

    /// Whether the mass sums to 1 within `tolerance`
    #[must_use]
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.total() - 1.0).abs() <= tolerance
    }

    /// Expected value of per-state coefficients, `Σ_s values[s]·b[s]`
    ///
    /// Sums over this belief's states; missing coefficients count as 0.
    pub fn expected(&self, values: &IndexMap<S, f64>) -> f64 {
        self.probs
            .iter()
            .map(|(s, p)| values.get(s).copied().unwrap_or(0.0) * p)
            .sum()
    }

    /// L1 distance `Σ_s |self[s] − other[s]|` over this belief's states
    pub fn l1_distance(&self, other: &Self) -> f64 {
        self.probs
            .iter()
            .map(|(s, p)| (p - other.get(s)).abs())
            .sum()
    }

    /// Posterior after taking `action` and observing `observation`
    ///
    /// `b'(s') ∝ O(s', a, o) · Σ_s T(s, a, s')·b(s)` over this belief's
    /// states. Returns the empty sentinel when the normalizer is zero.
    pub fn update<P>(&self, pomdp: &P, action: &P::Action, observation: &P::Observation) -> Self
    where
        P: Pomdp<State = S> + ?Sized,
    {
        let unnormalized: IndexMap<S, f64> = self
            .probs
            .keys()
            .map(|next| {
                let likelihood = pomdp.observation(next, action, observation);
                let mass = if likelihood == 0.0 {
                    0.0
                } else {
                    likelihood
                        * self
                            .probs
                            .iter()
                            .map(|(s, p)| pomdp.transition(s, action, next) * p)
                            .sum::<f64>()
                };
                (next.clone(), mass)
            })
            .collect();

        let normalizer: f64 = unnormalized.values().sum();
        if normalizer == 0.0 {
            return Self::empty();
        }
        Self {
            probs: unnormalized
                .into_iter()
                .map(|(s, m)| (s, m / normalizer))
                .collect(),
        }
    }
}

impl<S: Hash + Eq> FromIterator<(S, f64)> for Belief<S> {
    /// Build a belief without validation; intended for intermediate values
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            probs: iter.into_iter().collect(),
        }
    }
}

/// Append-only sample of belief points
///
/// Duplicates are allowed. Growing a set produces a new value so a snapshot
/// taken before growth is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeliefSet<S: Hash + Eq> {
    points: Vec<Belief<S>>,
}

impl<S: Hash + Eq> BeliefSet<S> {
    /// Create a set holding a single initial belief
    #[must_use]
    pub fn new(initial: Belief<S>) -> Self {
        Self {
            points: vec![initial],
        }
    }

    /// Append a belief
    pub fn push(&mut self, belief: Belief<S>) {
        self.points.push(belief);
    }

    /// Number of belief points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set has no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate points in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Belief<S>> {
        self.points.iter()
    }

    /// Points as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[Belief<S>] {
        &self.points
    }
}

impl<S: Hash + Eq> FromIterator<Belief<S>> for BeliefSet<S> {
    fn from_iter<I: IntoIterator<Item = Belief<S>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a, S: Hash + Eq> IntoIterator for &'a BeliefSet<S> {
    type Item = &'a Belief<S>;
    type IntoIter = std::slice::Iter<'a, Belief<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscreteSpace, ModelPomdp};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    /// Two doors, a noisy sensor that is right 80% of the time
    fn sensor() -> impl Pomdp<State = u8, Action = u8, Observation = u8> {
        ModelPomdp::new(
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            DiscreteSpace::new(vec![0, 1]).unwrap(),
            DiscreteSpace::new(vec![0, 1, 2]).unwrap(),
            // action 0 keeps the state, action 1 swaps it
            |s: &u8, a: &u8, next: &u8| if (s ^ a) == *next { 1.0 } else { 0.0 },
            |_s: &u8, _a: &u8, _next: &u8| 0.0,
            |next: &u8, _a: &u8, o: &u8| match o {
                2 => 0.0,
                o if o == next => 0.8,
                _ => 0.2,
            },
        )
    }

    #[test]
    fn test_new_validates() {
        assert!(Belief::from_pairs(vec![("a", 0.5), ("b", 0.5)], 1e-9).is_ok());
        assert!(Belief::from_pairs(vec![("a", 0.5), ("b", 0.6)], 1e-9).is_err());
        assert!(Belief::from_pairs(vec![("a", -0.5), ("b", 1.5)], 1e-9).is_err());
        assert!(Belief::<&str>::from_pairs(Vec::new(), 1e-9).is_err());
    }

    #[test]
    fn test_over_space_fills_missing_states() {
        let space = DiscreteSpace::new(vec!["a", "b", "c"]).unwrap();
        let b = Belief::over_space(&space, vec![("b", 1.0)], 1e-9).unwrap();
        let states: Vec<_> = b.states().copied().collect();
        assert_eq!(states, vec!["a", "b", "c"]);
        assert_eq!(b.get(&"b"), 1.0);
        assert!(matches!(
            Belief::over_space(&space, vec![("z", 1.0)], 1e-9),
            Err(PomdpError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_update_bayes_rule() {
        let pomdp = sensor();
        let prior = Belief::uniform(pomdp.state_space());
        let posterior = prior.update(&pomdp, &0, &0);
        assert_abs_diff_eq!(posterior.get(&0), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(posterior.get(&1), 0.2, epsilon = 1e-12);

        // swapping then hearing 0 means we were most likely in 1
        let skewed: Belief<u8> = [(0, 0.25), (1, 0.75)].into_iter().collect();
        let posterior = skewed.update(&pomdp, &1, &0);
        assert_abs_diff_eq!(posterior.get(&0), 0.6 / 0.65, epsilon = 1e-12);
    }

    #[test]
    fn test_update_impossible_observation_is_empty() {
        let pomdp = sensor();
        let prior = Belief::uniform(pomdp.state_space());
        assert!(prior.update(&pomdp, &0, &2).is_empty());
    }

    #[test]
    fn test_l1_distance_and_expected() {
        let a: Belief<u8> = [(1, 2.0), (3, 5.0)].into_iter().collect();
        let b: Belief<u8> = [(1, 1.0), (3, 7.0)].into_iter().collect();
        assert_abs_diff_eq!(a.l1_distance(&b), 3.0);
        let coefficients: IndexMap<u8, f64> = [(1, 0.5), (3, 2.0)].into_iter().collect();
        assert_abs_diff_eq!(a.expected(&coefficients), 11.0);
    }

    #[test]
    fn test_belief_set_is_append_only() {
        let space = DiscreteSpace::new(vec![0u8, 1]).unwrap();
        let mut set = BeliefSet::new(Belief::uniform(&space));
        let snapshot = set.clone();
        set.push(Belief::point(&space, &0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0], snapshot.as_slice()[0]);
    }

    proptest! {
        #[test]
        fn prop_update_sums_to_one(p in 0.0f64..=1.0, action in 0u8..2, observation in 0u8..3) {
            let pomdp = sensor();
            let prior: Belief<u8> = [(0, p), (1, 1.0 - p)].into_iter().collect();
            let posterior = prior.update(&pomdp, &action, &observation);

            let evidence: f64 = pomdp
                .state_space()
                .iter()
                .map(|next| {
                    pomdp.observation(next, &action, &observation)
                        * prior.iter().map(|(s, ps)| pomdp.transition(s, &action, next) * ps).sum::<f64>()
                })
                .sum();

            prop_assert_eq!(posterior.is_empty(), evidence == 0.0);
            if !posterior.is_empty() {
                prop_assert!(posterior.is_normalized(1e-9));
                prop_assert!(posterior.iter().all(|(_, q)| q >= 0.0));
            }
        }
    }
}
