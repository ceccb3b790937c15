//! Environment wrappers

use async_trait::async_trait;

use pbvi_core::{ActionSpace, Environment, Episode, ObservationSpace, Result, StateSpace, Step};

/// Time limit wrapper
///
/// Marks the step that reaches `max_steps` as truncated so infinite-horizon
/// problems such as Tiger can be rolled out.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    fn state_space(&self) -> &StateSpace<Self::State> {
        self.env.state_space()
    }

    fn observation_space(&self) -> &ObservationSpace<Self::Observation> {
        self.env.observation_space()
    }

    fn action_space(&self) -> &ActionSpace<Self::Action> {
        self.env.action_space()
    }

    async fn reset(&mut self) -> Result<()> {
        self.steps = 0;
        self.env.reset().await
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
        self.steps += 1;
        let mut step = self.env.step(action).await?;

        if self.steps >= self.max_steps && !step.done {
            step.truncated = true;
        }

        Ok(step)
    }

    async fn close(&mut self) -> Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.env.episode_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PomdpSimulator, Tiger, TigerAction, TigerParams};
    use pbvi_core::{Belief, EnvironmentConfig, Pomdp, TrackedEnvironment};

    #[tokio::test]
    async fn test_time_limit_truncates_and_resets() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());
        let sim = PomdpSimulator::new(&tiger, &start, &EnvironmentConfig::default()).unwrap();
        let mut env = TimeLimit::new(sim, 3);

        for _ in 0..2 {
            env.reset().await.unwrap();
            let mut flags = Vec::new();
            for _ in 0..3 {
                flags.push(env.step(TigerAction::Listen).await.unwrap().truncated);
            }
            assert_eq!(flags, vec![false, false, true]);
        }
    }

    #[tokio::test]
    async fn test_tracked_episode_summary() {
        let tiger = Tiger::new(TigerParams::default()).unwrap();
        let start = Belief::uniform(tiger.state_space());
        let sim = PomdpSimulator::new(&tiger, &start, &EnvironmentConfig::default()).unwrap();
        let mut env = TrackedEnvironment::new(TimeLimit::new(sim, 4), 1.0);

        env.reset().await.unwrap();
        for _ in 0..4 {
            env.step(TigerAction::Listen).await.unwrap();
        }

        let episode = env.episode_info().unwrap();
        assert_eq!(episode.steps, 4);
        assert_eq!(episode.total_reward, -4.0);
        assert_eq!(episode.discounted_return, -4.0);
        assert!(episode.truncated);
        assert!(episode.is_finished());
    }
}
