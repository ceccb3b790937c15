//! Error types for the POMDP core library

use thiserror::Error;

/// Core error type for POMDP operations
#[derive(Error, Debug)]
pub enum PomdpError {
    /// Alpha-vector selection over a value function with no vectors
    #[error("Value function is empty: seed it with at least one alpha-vector")]
    EmptyValueFunction,

    /// Improve did not reach a fixed point within the iteration cap
    #[error("Improve did not converge after {iterations} iterations (rounding precision too fine?)")]
    NonTerminatingImprove {
        /// Number of iterations performed before giving up
        iterations: usize,
    },

    /// An observation with zero probability was fed to a belief tracker
    #[error("Impossible observation: {0}")]
    ImpossibleObservation(String),

    /// Belief is not a probability distribution over the state space
    #[error("Invalid belief: {0}")]
    InvalidBelief(String),

    /// Space is empty or contains duplicate labels
    #[error("Invalid space: {0}")]
    InvalidSpace(String),

    /// Solver or problem parameters out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Label not present in the corresponding space
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for POMDP operations
pub type Result<T> = std::result::Result<T, PomdpError>;
