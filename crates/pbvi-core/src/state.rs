//! Hidden states and state spaces

use std::fmt::Debug;
use std::hash::Hash;

use crate::DiscreteSpace;

/// Trait for hidden states of a POMDP
///
/// States are opaque labels: the solver only compares and hashes them.
/// Any cloneable, hashable type qualifies, so enums and `String`s both work.
pub trait State: Clone + Debug + Eq + Hash + Send + Sync {}

impl<T> State for T where T: Clone + Debug + Eq + Hash + Send + Sync {}

/// Finite, ordered state space
pub type StateSpace<S> = DiscreteSpace<S>;
