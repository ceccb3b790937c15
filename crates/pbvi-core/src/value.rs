//! Alpha-vectors and piecewise-linear value functions

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::{argmax_first, round_to};
use crate::{Action, Belief, Pomdp, PomdpError, Result, State, StateSpace};

/// Linear lower bound on the optimal value, tagged with the action that
/// achieves it: `value(b) = Σ_s alpha[s]·b[s]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaVector<S: Hash + Eq, A> {
    /// Action whose expected return this vector bounds
    pub action: A,
    /// Per-state coefficients, covering the whole state space
    pub alpha: IndexMap<S, f64>,
}

impl<S: State, A: Action> AlphaVector<S, A> {
    /// Create a new alpha-vector
    #[must_use]
    pub fn new(action: A, alpha: IndexMap<S, f64>) -> Self {
        Self { action, alpha }
    }

    /// Alpha-vector with the same coefficient for every state
    #[must_use]
    pub fn constant(space: &StateSpace<S>, action: A, value: f64) -> Self {
        Self {
            action,
            alpha: space.iter().map(|s| (s.clone(), value)).collect(),
        }
    }

    /// Expected value at a belief
    pub fn value_at(&self, belief: &Belief<S>) -> f64 {
        belief.expected(&self.alpha)
    }

    /// Coefficient for a state, 0 when absent
    pub fn get(&self, state: &S) -> f64 {
        self.alpha.get(state).copied().unwrap_or(0.0)
    }

    fn key(&self, places: u32) -> AlphaKey<S, A> {
        AlphaKey {
            action: self.action.clone(),
            coefficients: self
                .alpha
                .iter()
                .map(|(s, v)| (s.clone(), round_to(*v, places).to_bits()))
                .collect(),
        }
    }
}

/// Identity of an alpha-vector for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlphaKey<S, A> {
    action: A,
    coefficients: Vec<(S, u64)>,
}

/// Append-only set of alpha-vectors
///
/// Two vectors are the same member when their actions are equal and their
/// coefficients agree after rounding to `rounding_places` decimals. The
/// rounding precision therefore affects correctness: too fine a precision
/// lets floating-point noise produce endless "new" vectors.
#[derive(Debug, Clone, Serialize)]
pub struct ValueFunction<S: Hash + Eq, A: Hash + Eq> {
    vectors: Vec<AlphaVector<S, A>>,
    rounding_places: u32,
    #[serde(skip)]
    index: HashSet<AlphaKey<S, A>>,
}

impl<S: State, A: Action> ValueFunction<S, A> {
    /// Create an empty value function
    #[must_use]
    pub fn new(rounding_places: u32) -> Self {
        Self {
            vectors: Vec::new(),
            rounding_places,
            index: HashSet::new(),
        }
    }

    /// Create a value function from vectors, dropping duplicates
    pub fn from_vectors<I>(vectors: I, rounding_places: u32) -> Self
    where
        I: IntoIterator<Item = AlphaVector<S, A>>,
    {
        let mut value_function = Self::new(rounding_places);
        value_function.extend(vectors);
        value_function
    }

    /// Pessimistic seed: one vector worth `worst_reward / (1 − γ)` everywhere
    ///
    /// No policy can do worse than receiving the worst one-step reward
    /// forever, so the seed is a valid lower bound.
    pub fn pessimistic<P>(pomdp: &P, action: A, discount: f64, rounding_places: u32) -> Result<Self>
    where
        P: Pomdp<State = S, Action = A> + ?Sized,
    {
        if !(0.0..1.0).contains(&discount) {
            return Err(PomdpError::InvalidConfig(format!(
                "discount must lie in [0, 1), got {discount}"
            )));
        }
        if !pomdp.action_space().contains(&action) {
            return Err(PomdpError::UnknownLabel(format!("{action:?}")));
        }
        let value = pomdp.worst_reward().perpetuity(discount);
        let seed = AlphaVector::constant(pomdp.state_space(), action, value);
        Ok(Self::from_vectors([seed], rounding_places))
    }

    /// Decimal places used for membership comparisons
    #[must_use]
    pub fn rounding_places(&self) -> u32 {
        self.rounding_places
    }

    /// Append a vector unless an equal one is present; returns whether it was added
    pub fn insert(&mut self, alpha: AlphaVector<S, A>) -> bool {
        if self.index.insert(alpha.key(self.rounding_places)) {
            self.vectors.push(alpha);
            true
        } else {
            false
        }
    }

    /// Whether an equal vector is already a member
    pub fn contains(&self, alpha: &AlphaVector<S, A>) -> bool {
        self.index.contains(&alpha.key(self.rounding_places))
    }

    /// The member with the greatest value at `belief`, first one on ties
    pub fn best(&self, belief: &Belief<S>) -> Result<&AlphaVector<S, A>> {
        select_best(&self.vectors, belief).ok_or(PomdpError::EmptyValueFunction)
    }

    /// Action of the best member at `belief`
    pub fn best_action(&self, belief: &Belief<S>) -> Result<A> {
        self.best(belief).map(|alpha| alpha.action.clone())
    }

    /// Value of the upper envelope at `belief`
    pub fn value(&self, belief: &Belief<S>) -> Result<f64> {
        self.best(belief).map(|alpha| alpha.value_at(belief))
    }

    /// Number of vectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether there are no vectors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Iterate vectors in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, AlphaVector<S, A>> {
        self.vectors.iter()
    }

    /// Vectors as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[AlphaVector<S, A>] {
        &self.vectors
    }
}

impl<S: State, A: Action> Extend<AlphaVector<S, A>> for ValueFunction<S, A> {
    fn extend<I: IntoIterator<Item = AlphaVector<S, A>>>(&mut self, iter: I) {
        for alpha in iter {
            self.insert(alpha);
        }
    }
}

impl<S: State, A: Action> PartialEq for ValueFunction<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.rounding_places == other.rounding_places && self.index == other.index
    }
}

/// Alpha-vector with the greatest value at `belief`, first one on ties
///
/// `None` when `vectors` is empty or every value at `belief` is NaN.
pub fn select_best<'a, S, A>(
    vectors: &'a [AlphaVector<S, A>],
    belief: &Belief<S>,
) -> Option<&'a AlphaVector<S, A>>
where
    S: State,
    A: Action,
{
    argmax_first(vectors.iter(), |alpha| alpha.value_at(belief)).map(|(_, alpha, _)| alpha)
}
