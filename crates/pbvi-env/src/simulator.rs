//! Run a [`Pomdp`] as an async environment and track the agent's belief

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, WeightedIndex};
use tracing::{debug, trace};

use pbvi_core::{
    ActionSpace, Belief, Environment, EnvironmentConfig, ObservationSpace, Pomdp, PomdpError,
    Result, StateSpace, Step,
};

const BELIEF_TOLERANCE: f64 = 1e-6;

/// Samples hidden states, rewards and observations from a POMDP's models
pub struct PomdpSimulator<P: Pomdp> {
    pomdp: P,
    initial: Belief<P::State>,
    state: Option<P::State>,
    steps: usize,
    max_steps: Option<usize>,
    rng: StdRng,
}

impl<P: Pomdp> PomdpSimulator<P> {
    /// Create a simulator that draws each episode's hidden state from `initial`
    ///
    /// `config.seed` makes episodes reproducible; `config.max_steps` marks
    /// the step that reaches it as truncated.
    pub fn new(pomdp: P, initial: &Belief<P::State>, config: &EnvironmentConfig) -> Result<Self> {
        let initial = Belief::over_space(
            pomdp.state_space(),
            initial.iter().map(|(s, p)| (s.clone(), p)),
            BELIEF_TOLERANCE,
        )?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            pomdp,
            initial,
            state: None,
            steps: 0,
            max_steps: config.max_steps,
            rng,
        })
    }

    /// The simulated problem
    pub fn pomdp(&self) -> &P {
        &self.pomdp
    }

    /// Initial belief episodes start from
    pub fn initial_belief(&self) -> &Belief<P::State> {
        &self.initial
    }

    /// Current hidden state, `None` before the first reset
    pub fn hidden_state(&self) -> Option<&P::State> {
        self.state.as_ref()
    }

    fn sample<'a, T, I>(&mut self, items: &'a [T], weights: I, what: &str) -> Result<&'a T>
    where
        I: IntoIterator<Item = f64>,
    {
        let dist = WeightedIndex::new(weights)
            .map_err(|e| PomdpError::Environment(format!("cannot sample {what}: {e}")))?;
        Ok(&items[dist.sample(&mut self.rng)])
    }
}

#[async_trait]
impl<P: Pomdp> Environment for PomdpSimulator<P> {
    type Observation = P::Observation;
    type Action = P::Action;
    type State = P::State;

    fn state_space(&self) -> &StateSpace<Self::State> {
        self.pomdp.state_space()
    }

    fn observation_space(&self) -> &ObservationSpace<Self::Observation> {
        self.pomdp.observation_space()
    }

    fn action_space(&self) -> &ActionSpace<Self::Action> {
        self.pomdp.action_space()
    }

    async fn reset(&mut self) -> Result<()> {
        let states = self.pomdp.state_space().as_slice().to_vec();
        let weights: Vec<f64> = states.iter().map(|s| self.initial.get(s)).collect();
        let state = self.sample(&states, weights, "initial state")?.clone();
        debug!(?state, "episode reset");

        self.state = Some(state);
        self.steps = 0;
        Ok(())
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
        let state = self
            .state
            .clone()
            .ok_or_else(|| PomdpError::Environment("step called before reset".into()))?;
        if !self.pomdp.action_space().contains(&action) {
            return Err(PomdpError::UnknownLabel(format!("{action:?}")));
        }

        let states = self.pomdp.state_space().as_slice().to_vec();
        let transition: Vec<f64> = states
            .iter()
            .map(|next| self.pomdp.transition(&state, &action, next))
            .collect();
        let next = self.sample(&states, transition, "next state")?.clone();

        let observations = self.pomdp.observation_space().as_slice().to_vec();
        let likelihood: Vec<f64> = observations
            .iter()
            .map(|o| self.pomdp.observation(&next, &action, o))
            .collect();
        let observation = self.sample(&observations, likelihood, "observation")?.clone();

        let reward = self.pomdp.reward(&state, &action, &next);
        self.steps += 1;
        let truncated = self.max_steps.is_some_and(|max| self.steps >= max);
        trace!(?state, ?action, ?next, ?observation, reward = reward.value(), "step");

        self.state = Some(next.clone());
        Ok(Step {
            observation,
            reward,
            done: false,
            truncated,
            hidden_state: Some(next),
        })
    }
}

/// Follows the agent's belief through actions and observations
pub struct BeliefTracker<P: Pomdp> {
    pomdp: P,
    initial: Belief<P::State>,
    belief: Belief<P::State>,
}

impl<P: Pomdp> BeliefTracker<P> {
    /// Create a tracker starting from `initial`
    pub fn new(pomdp: P, initial: Belief<P::State>) -> Self {
        Self {
            pomdp,
            belief: initial.clone(),
            initial,
        }
    }

    /// Current belief
    pub fn belief(&self) -> &Belief<P::State> {
        &self.belief
    }

    /// Return to the initial belief
    pub fn reset(&mut self) {
        self.belief = self.initial.clone();
    }

    /// Condition the belief on `action` and `observation`
    ///
    /// An observation the models deem impossible leaves the belief untouched
    /// and fails with [`PomdpError::ImpossibleObservation`].
    pub fn update(
        &mut self,
        action: &P::Action,
        observation: &P::Observation,
    ) -> Result<&Belief<P::State>> {
        let next = self.belief.update(&self.pomdp, action, observation);
        if next.is_empty() {
            return Err(PomdpError::ImpossibleObservation(format!(
                "{observation:?} after {action:?}"
            )));
        }
        self.belief = next;
        Ok(&self.belief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tiger, TigerAction, TigerObservation, TigerParams, TigerState};
    use approx::assert_abs_diff_eq;

    fn seeded(seed: u64) -> EnvironmentConfig {
        EnvironmentConfig {
            seed: Some(seed),
            ..EnvironmentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_step_requires_reset() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());
        let mut sim = PomdpSimulator::new(&tiger, &start, &seeded(1)).unwrap();

        assert!(matches!(
            sim.step(TigerAction::Listen).await,
            Err(PomdpError::Environment(_))
        ));
    }

    #[tokio::test]
    async fn test_listening_keeps_the_tiger_put() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::point(tiger.state_space(), &TigerState::TigerRight);
        let mut sim = PomdpSimulator::new(&tiger, &start, &seeded(7)).unwrap();

        sim.reset().await.unwrap();
        for _ in 0..20 {
            let step = sim.step(TigerAction::Listen).await.unwrap();
            assert_eq!(step.hidden_state, Some(TigerState::TigerRight));
            assert_eq!(step.reward.value(), -1.0);
            assert_ne!(step.observation, TigerObservation::Nothing);
        }

        let step = sim.step(TigerAction::OpenLeft).await.unwrap();
        assert_eq!(step.reward.value(), 10.0);
        assert_eq!(step.observation, TigerObservation::Nothing);
    }

    #[tokio::test]
    async fn test_same_seed_same_episode() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());

        let mut heard = Vec::new();
        for _ in 0..2 {
            let mut sim = PomdpSimulator::new(&tiger, &start, &seeded(42)).unwrap();
            sim.reset().await.unwrap();
            let mut run = Vec::new();
            for _ in 0..10 {
                run.push(sim.step(TigerAction::Listen).await.unwrap().observation);
            }
            heard.push(run);
        }
        assert_eq!(heard[0], heard[1]);
    }

    #[tokio::test]
    async fn test_max_steps_truncates() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());
        let config = EnvironmentConfig {
            max_steps: Some(2),
            ..seeded(3)
        };
        let mut sim = PomdpSimulator::new(&tiger, &start, &config).unwrap();

        sim.reset().await.unwrap();
        assert!(!sim.step(TigerAction::Listen).await.unwrap().truncated);
        assert!(sim.step(TigerAction::Listen).await.unwrap().truncated);
    }

    #[test]
    fn test_belief_tracker() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());
        let mut tracker = BeliefTracker::new(&tiger, start.clone());

        let belief = tracker
            .update(&TigerAction::Listen, &TigerObservation::HearLeft)
            .unwrap();
        assert_abs_diff_eq!(belief.get(&TigerState::TigerLeft), 0.85, epsilon = 1e-12);

        assert!(matches!(
            tracker.update(&TigerAction::Listen, &TigerObservation::Nothing),
            Err(PomdpError::ImpossibleObservation(_))
        ));
        assert_abs_diff_eq!(tracker.belief().get(&TigerState::TigerLeft), 0.85, epsilon = 1e-12);

        tracker.reset();
        assert_eq!(tracker.belief(), &start);
    }
}
