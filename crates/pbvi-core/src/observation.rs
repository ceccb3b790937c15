//! Observations and observation spaces

use std::fmt::Debug;
use std::hash::Hash;

use crate::DiscreteSpace;

/// Trait for observations emitted after an action
pub trait Observation: Clone + Debug + Eq + Hash + Send + Sync {}

impl<T> Observation for T where T: Clone + Debug + Eq + Hash + Send + Sync {}

/// Finite, ordered observation space
pub type ObservationSpace<O> = DiscreteSpace<O>;
