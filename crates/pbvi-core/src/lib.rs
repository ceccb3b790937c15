//! Core POMDP traits and types for point-based value iteration
//!
//! This crate provides the problem-side abstractions (labels, finite spaces,
//! transition/reward/observation models) and the value-side containers
//! (beliefs, alpha-vectors, value functions) shared by the solver, the
//! environments and the CLI.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod belief;
pub mod environment;
pub mod error;
pub mod model;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod state;
pub mod tabular;
pub mod utils;
pub mod value;

// Re-export core traits and types
pub use action::{Action, ActionSpace, DiscreteSpace};
pub use belief::{Belief, BeliefSet};
pub use environment::{Environment, EnvironmentConfig, Episode, Step, TrackedEnvironment};
pub use error::{PomdpError, Result};
pub use model::{ModelPomdp, ObservationModel, Pomdp, SparseTable, TransitionModel};
pub use observation::{Observation, ObservationSpace};
pub use policy::{Policy, RandomPolicy};
pub use reward::{Reward, RewardModel};
pub use state::{State, StateSpace};
pub use tabular::TabularPomdp;
pub use value::{AlphaVector, ValueFunction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, AlphaVector, Belief, BeliefSet, DiscreteSpace, Observation,
        ObservationSpace, Policy, Pomdp, Result, Reward, State, StateSpace, ValueFunction,
    };
}
