//! Actions and finite label spaces

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;

use crate::{PomdpError, Result};

/// Trait for actions available to the agent
pub trait Action: Clone + Debug + Eq + Hash + Send + Sync {}

impl<T> Action for T where T: Clone + Debug + Eq + Hash + Send + Sync {}

/// Finite, ordered action space
pub type ActionSpace<A> = DiscreteSpace<A>;

/// Finite, ordered enumeration of labels
///
/// Iteration order is the construction order and is significant: it decides
/// tie-breaks in backups and the layout of beliefs and alpha-vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscreteSpace<T> {
    items: Vec<T>,
}

impl<T> DiscreteSpace<T>
where
    T: Clone + Debug + Eq + Hash,
{
    /// Create a new space, rejecting empty or duplicated labels
    pub fn new(items: Vec<T>) -> Result<Self> {
        if items.is_empty() {
            return Err(PomdpError::InvalidSpace("space has no elements".into()));
        }
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item) {
                return Err(PomdpError::InvalidSpace(format!("duplicate label {item:?}")));
            }
        }
        Ok(Self { items })
    }

    /// Number of labels in the space
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed space
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate labels in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Labels as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Check whether a label belongs to the space
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Position of a label in the space
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|x| x == item)
    }

    /// Sample a label uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.items[rng.gen_range(0..self.items.len())]
    }
}

impl<'a, T> IntoIterator for &'a DiscreteSpace<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
