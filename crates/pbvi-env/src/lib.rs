//! POMDP problems and episode simulation
//!
//! This crate provides:
//! - The classic Tiger problem
//! - A simulator that runs any [`Pomdp`] as an async [`Environment`]
//! - A belief tracker and rollout helpers for evaluating policies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod rollout;
pub mod simulator;
pub mod tiger;
pub mod wrappers;

pub use rollout::{evaluate, run_episode, EpisodeOutcome, Evaluation};
pub use simulator::{BeliefTracker, PomdpSimulator};
pub use tiger::{Tiger, TigerAction, TigerObservation, TigerParams, TigerState};
pub use wrappers::TimeLimit;

// Re-export core types
pub use pbvi_core::{
    Belief, Environment, EnvironmentConfig, Episode, Policy, Pomdp, Step, TrackedEnvironment,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{evaluate, BeliefTracker, PomdpSimulator, Tiger, TigerParams, TimeLimit};
    pub use pbvi_core::prelude::*;
}
