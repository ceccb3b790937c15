//! Point-based value iteration (PBVI) for finite POMDPs
//!
//! The solver keeps a finite set of alpha-vectors and improves it with
//! Bellman backups restricted to a sample of reachable beliefs:
//! - [`Backup`]: one-step lookahead and point-based Bellman backup
//! - [`improve`]: backups to a local fixed point over the belief set
//! - [`expand`]: farthest-point growth of the belief set
//! - [`PbviSolver`]: alternates the two and extracts the policy

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod config;
pub mod expand;
pub mod improve;
pub mod solver;

pub use backup::Backup;
pub use config::PbviConfig;
pub use expand::{expand, furthest_belief};
pub use improve::{improve, Improvement};
pub use solver::{solve, PbviSolver, RoundStats, Solution};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{solve, PbviConfig, PbviSolver, Solution};
    pub use pbvi_core::prelude::*;
}
