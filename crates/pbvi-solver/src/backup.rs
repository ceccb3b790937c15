//! One-step lookahead and the point-based Bellman backup

use indexmap::IndexMap;

use pbvi_core::utils::round_to;
use pbvi_core::value::select_best;
use pbvi_core::{AlphaVector, Belief, Pomdp, PomdpError, Result, ValueFunction};

use crate::PbviConfig;

type Alpha<P> = AlphaVector<<P as Pomdp>::State, <P as Pomdp>::Action>;
type Values<P> = ValueFunction<<P as Pomdp>::State, <P as Pomdp>::Action>;

/// Bellman backup operator bound to a problem, a discount and a rounding precision
pub struct Backup<'p, P: Pomdp + ?Sized> {
    pomdp: &'p P,
    discount: f64,
    rounding_places: u32,
}

impl<'p, P: Pomdp + ?Sized> Backup<'p, P> {
    /// Create a new backup operator
    pub fn new(pomdp: &'p P, discount: f64, rounding_places: u32) -> Self {
        Self {
            pomdp,
            discount,
            rounding_places,
        }
    }

    /// Create a backup operator from a solver configuration
    pub fn from_config(pomdp: &'p P, config: &PbviConfig) -> Self {
        Self::new(pomdp, config.discount, config.rounding_places)
    }

    /// The problem this operator backs up
    pub fn pomdp(&self) -> &'p P {
        self.pomdp
    }

    /// Alpha coefficients of the best vector at the successor belief
    ///
    /// When `observation` cannot follow `action` from `belief`, the result
    /// is the zero vector over the belief's states.
    pub fn lookahead(
        &self,
        value_function: &Values<P>,
        belief: &Belief<P::State>,
        action: &P::Action,
        observation: &P::Observation,
    ) -> Result<IndexMap<P::State, f64>> {
        match self.successor_alpha(value_function, belief, action, observation)? {
            Some(alpha) => Ok(alpha.alpha.clone()),
            None => Ok(belief.states().map(|s| (s.clone(), 0.0)).collect()),
        }
    }

    /// Entry of the backed-up alpha-vector for `state` under `action`
    ///
    /// `Σ_s' [R(s,a,s')·T(s,a,s') + γ·T(s,a,s')·Σ_o lookahead(o)[s']·O(s',a,o)]`,
    /// rounded to the configured decimal places.
    pub fn component(
        &self,
        value_function: &Values<P>,
        belief: &Belief<P::State>,
        state: &P::State,
        action: &P::Action,
    ) -> Result<f64> {
        let successors = self.successor_alphas(value_function, belief, action)?;
        Ok(self.combine(&successors, state, action))
    }

    /// Best backed-up alpha-vector at `belief` over all actions
    ///
    /// Ties between actions go to the one listed first in the action space.
    pub fn backup(&self, value_function: &Values<P>, belief: &Belief<P::State>) -> Result<Alpha<P>> {
        let states = self.pomdp.state_space();
        let candidates = self
            .pomdp
            .action_space()
            .iter()
            .map(|action| -> Result<Alpha<P>> {
                let successors = self.successor_alphas(value_function, belief, action)?;
                let alpha = states
                    .iter()
                    .map(|s| (s.clone(), self.combine(&successors, s, action)))
                    .collect();
                Ok(AlphaVector::new(action.clone(), alpha))
            })
            .collect::<Result<Vec<_>>>()?;

        select_best(&candidates, belief)
            .cloned()
            .ok_or(PomdpError::EmptyValueFunction)
    }

    fn successor_alpha<'v>(
        &self,
        value_function: &'v Values<P>,
        belief: &Belief<P::State>,
        action: &P::Action,
        observation: &P::Observation,
    ) -> Result<Option<&'v Alpha<P>>> {
        let next = belief.update(self.pomdp, action, observation);
        if next.is_empty() {
            return Ok(None);
        }
        value_function.best(&next).map(Some)
    }

    /// Lookahead vectors for every observation, in observation-space order
    fn successor_alphas<'v>(
        &self,
        value_function: &'v Values<P>,
        belief: &Belief<P::State>,
        action: &P::Action,
    ) -> Result<Vec<(&'p P::Observation, Option<&'v Alpha<P>>)>> {
        self.pomdp
            .observation_space()
            .iter()
            .map(|o| -> Result<_> {
                Ok((o, self.successor_alpha(value_function, belief, action, o)?))
            })
            .collect()
    }

    fn combine(
        &self,
        successors: &[(&P::Observation, Option<&Alpha<P>>)],
        state: &P::State,
        action: &P::Action,
    ) -> f64 {
        let total: f64 = self
            .pomdp
            .state_space()
            .iter()
            .map(|next| {
                let t = self.pomdp.transition(state, action, next);
                if t == 0.0 {
                    return 0.0;
                }
                let future: f64 = successors
                    .iter()
                    .map(|(o, alpha)| {
                        alpha.map_or(0.0, |alpha| alpha.get(next))
                            * self.pomdp.observation(next, action, o)
                    })
                    .sum();
                self.pomdp.reward(state, action, next).value() * t + self.discount * t * future
            })
            .sum();
        round_to(total, self.rounding_places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbvi_core::{DiscreteSpace, ModelPomdp};

    /// Single state, single observation: backups reduce to `r + γ·v`
    fn treadmill() -> impl Pomdp<State = u8, Action = &'static str, Observation = u8> {
        ModelPomdp::new(
            DiscreteSpace::new(vec![0]).unwrap(),
            DiscreteSpace::new(vec!["walk", "rest"]).unwrap(),
            DiscreteSpace::new(vec![0]).unwrap(),
            |_s: &u8, _a: &&'static str, _next: &u8| 1.0,
            |_s: &u8, a: &&'static str, _next: &u8| if *a == "walk" { 2.0 } else { 1.0 },
            |_next: &u8, _a: &&'static str, _o: &u8| 1.0,
        )
    }

    #[test]
    fn test_backup_is_reward_plus_discounted_value() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.5, 5);
        let v = ValueFunction::from_vectors(
            [AlphaVector::constant(pomdp.state_space(), "rest", 10.0)],
            5,
        );
        let b = Belief::uniform(pomdp.state_space());
        let alpha = backup.backup(&v, &b).unwrap();
        assert_eq!(alpha.action, "walk");
        assert_eq!(alpha.get(&0), 7.0);
        assert_eq!(backup.component(&v, &b, &0, &"rest").unwrap(), 6.0);
    }

    #[test]
    fn test_component_is_deterministic_and_rounded() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.3, 2);
        let v = ValueFunction::from_vectors(
            [AlphaVector::constant(pomdp.state_space(), "rest", 1.0 / 3.0)],
            2,
        );
        let b = Belief::uniform(pomdp.state_space());
        let first = backup.component(&v, &b, &0, &"walk").unwrap();
        let second = backup.component(&v, &b, &0, &"walk").unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(first, 2.1);
    }

    #[test]
    fn test_backup_requires_seeded_value_function() {
        let pomdp = treadmill();
        let backup = Backup::new(&pomdp, 0.5, 5);
        let v = ValueFunction::new(5);
        let b = Belief::uniform(pomdp.state_space());
        assert!(matches!(backup.backup(&v, &b), Err(PomdpError::EmptyValueFunction)));
    }
}
