//! PBVI driver: alternate Improve and Expand, then read off the policy

use std::hash::Hash;

use serde::Serialize;
use tracing::{info, info_span};

use pbvi_core::{Belief, BeliefSet, Pomdp, PomdpError, Result, ValueFunction};

use crate::{expand, improve, Backup, PbviConfig};

/// Statistics for one Improve/Expand round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundStats {
    /// 1-based round number
    pub round: usize,
    /// Iterations Improve needed to converge
    pub improve_iterations: usize,
    /// Alpha-vectors added by Improve
    pub alphas_added: usize,
    /// Value function size after Improve
    pub alpha_count: usize,
    /// Belief set size after Expand
    pub belief_count: usize,
}

/// Full result of a solve
#[derive(Debug, Clone, Serialize)]
pub struct Solution<S: Hash + Eq, A: Hash + Eq> {
    /// Recommended action at the queried belief
    pub action: A,
    /// Lower-bound value at the queried belief
    pub value: f64,
    /// Final value function, reusable as a [`pbvi_core::Policy`]
    pub value_function: ValueFunction<S, A>,
    /// Final belief sample
    pub beliefs: BeliefSet<S>,
    /// Per-round statistics
    pub rounds: Vec<RoundStats>,
}

/// Point-based value iteration solver
pub struct PbviSolver<P: Pomdp> {
    pomdp: P,
    config: PbviConfig,
    seed: ValueFunction<P::State, P::Action>,
}

impl<P: Pomdp> PbviSolver<P> {
    /// Create a solver from a problem, a configuration and a seed value function
    ///
    /// The seed is re-indexed at the configured rounding precision.
    pub fn new(
        pomdp: P,
        config: PbviConfig,
        seed: ValueFunction<P::State, P::Action>,
    ) -> Result<Self> {
        config.validate()?;
        if seed.is_empty() {
            return Err(PomdpError::EmptyValueFunction);
        }
        let seed = if seed.rounding_places() == config.rounding_places {
            seed
        } else {
            ValueFunction::from_vectors(seed.iter().cloned(), config.rounding_places)
        };
        Ok(Self { pomdp, config, seed })
    }

    /// Create a solver seeded with [`ValueFunction::pessimistic`] for `action`
    pub fn with_pessimistic_seed(pomdp: P, config: PbviConfig, action: P::Action) -> Result<Self> {
        config.validate()?;
        let seed = ValueFunction::pessimistic(&pomdp, action, config.discount, config.rounding_places)?;
        Self::new(pomdp, config, seed)
    }

    /// The problem being solved
    pub fn pomdp(&self) -> &P {
        &self.pomdp
    }

    /// Solver configuration
    pub fn config(&self) -> &PbviConfig {
        &self.config
    }

    /// Seed value function
    pub fn seed(&self) -> &ValueFunction<P::State, P::Action> {
        &self.seed
    }

    /// Recommended action at `initial`
    pub fn solve(&self, initial: &Belief<P::State>) -> Result<P::Action> {
        Ok(self.solve_detailed(initial)?.action)
    }

    /// Run every round and return the value function, the beliefs and statistics
    ///
    /// `initial` may omit zero-probability states; labels outside the state
    /// space are rejected.
    pub fn solve_detailed(
        &self,
        initial: &Belief<P::State>,
    ) -> Result<Solution<P::State, P::Action>> {
        let initial = Belief::over_space(
            self.pomdp.state_space(),
            initial.iter().map(|(s, p)| (s.clone(), p)),
            self.config.belief_tolerance,
        )?;

        let span = info_span!(
            "pbvi_solve",
            rounds = self.config.expansion_rounds,
            discount = self.config.discount
        );
        let _guard = span.enter();

        let backup = Backup::from_config(&self.pomdp, &self.config);
        let mut value_function = self.seed.clone();
        let mut beliefs = BeliefSet::new(initial.clone());
        let mut rounds = Vec::with_capacity(self.config.expansion_rounds);

        for round in 1..=self.config.expansion_rounds {
            let improvement = improve(
                &backup,
                &value_function,
                &beliefs,
                self.config.max_improve_iterations,
            )?;
            value_function = improvement.value_function;
            beliefs = expand(&self.pomdp, &beliefs);

            let stats = RoundStats {
                round,
                improve_iterations: improvement.iterations,
                alphas_added: improvement.added,
                alpha_count: value_function.len(),
                belief_count: beliefs.len(),
            };
            info!(
                round,
                iterations = stats.improve_iterations,
                added = stats.alphas_added,
                alphas = stats.alpha_count,
                beliefs = stats.belief_count,
                "round complete"
            );
            rounds.push(stats);
        }

        let best = value_function.best(&initial)?;
        let action = best.action.clone();
        let value = best.value_at(&initial);
        info!(?action, value, "solved");

        Ok(Solution {
            action,
            value,
            value_function,
            beliefs,
            rounds,
        })
    }
}

/// Solve `pomdp` at `initial` from `seed` and return the recommended action
pub fn solve<P: Pomdp + ?Sized>(
    pomdp: &P,
    initial: &Belief<P::State>,
    config: &PbviConfig,
    seed: &ValueFunction<P::State, P::Action>,
) -> Result<P::Action> {
    PbviSolver::new(pomdp, config.clone(), seed.clone())?.solve(initial)
}
