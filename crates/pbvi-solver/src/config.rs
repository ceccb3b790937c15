//! Solver configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use pbvi_core::{PomdpError, Result};

/// PBVI configuration
///
/// `rounding_places` is not cosmetic: backed-up values are rounded to it and
/// alpha-vectors that agree after rounding count as the same vector, which is
/// what lets Improve detect its fixed point. Setting it finer than the
/// floating-point noise of a backup can keep Improve from converging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbviConfig {
    /// Discount factor γ in `[0, 1)`
    pub discount: f64,
    /// Decimal places for backup rounding and alpha-vector equality
    pub rounding_places: u32,
    /// Number of Improve/Expand rounds
    pub expansion_rounds: usize,
    /// Iteration cap for Improve's inner loop
    pub max_improve_iterations: usize,
    /// Tolerance when checking that a queried belief sums to 1
    pub belief_tolerance: f64,
}

impl Default for PbviConfig {
    fn default() -> Self {
        Self {
            discount: 0.95,
            rounding_places: 5,
            expansion_rounds: 3,
            max_improve_iterations: 1000,
            belief_tolerance: 1e-6,
        }
    }
}

impl PbviConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.discount) {
            return Err(PomdpError::InvalidConfig(format!(
                "discount must lie in [0, 1), got {}",
                self.discount
            )));
        }
        if self.max_improve_iterations == 0 {
            return Err(PomdpError::InvalidConfig(
                "max_improve_iterations must be at least 1".into(),
            ));
        }
        if !(self.belief_tolerance.is_finite() && self.belief_tolerance >= 0.0) {
            return Err(PomdpError::InvalidConfig(format!(
                "belief_tolerance must be a non-negative number, got {}",
                self.belief_tolerance
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
