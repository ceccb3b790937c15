//! Simulated POMDP episodes
//!
//! An [`Environment`] hides its state: `reset` reveals nothing and the agent
//! only learns through the observations returned by `step`. The hidden state
//! rides along on each [`Step`] for diagnostics and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Action, ActionSpace, Observation, ObservationSpace, Result, Reward, State, StateSpace};

/// Outcome of one simulated transition
#[derive(Debug, Clone, PartialEq)]
pub struct Step<O, S> {
    /// Observation emitted after the action
    pub observation: O,
    /// Reward for the transition
    pub reward: Reward,
    /// The problem reached a terminal state
    pub done: bool,
    /// A step budget ended the episode
    pub truncated: bool,
    /// Hidden state after the transition, not visible to the agent
    pub hidden_state: Option<S>,
}

impl<O, S> Step<O, S> {
    /// Whether this step ends the episode for any reason
    pub fn is_last(&self) -> bool {
        self.done || self.truncated
    }
}

/// Summary of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique episode id
    pub id: Uuid,
    /// Steps taken so far
    pub steps: usize,
    /// Undiscounted reward sum
    pub total_reward: f64,
    /// `Σ_t γ^t r_t`
    pub discounted_return: f64,
    /// Whether a step budget ended the episode
    pub truncated: bool,
    /// When the episode was reset
    pub started_at: DateTime<Utc>,
    /// When the last step was taken, `None` while running
    pub finished_at: Option<DateTime<Utc>>,
}

impl Episode {
    fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: 0,
            total_reward: 0.0,
            discounted_return: 0.0,
            truncated: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether the episode has ended
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Simulator settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Seed for reproducible episodes, entropy when `None`
    pub seed: Option<u64>,
    /// Truncate episodes after this many steps
    pub max_steps: Option<usize>,
}

/// A POMDP that can be stepped through asynchronously
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;
    /// Hidden state type
    type State: State;

    /// Hidden state labels
    fn state_space(&self) -> &StateSpace<Self::State>;

    /// Observation labels
    fn observation_space(&self) -> &ObservationSpace<Self::Observation>;

    /// Action labels
    fn action_space(&self) -> &ActionSpace<Self::Action>;

    /// Start a new episode with a freshly drawn hidden state
    async fn reset(&mut self) -> Result<()>;

    /// Apply an action
    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>>;

    /// Release resources
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Summary of the current episode, if tracked
    fn episode_info(&self) -> Option<Episode> {
        None
    }
}

/// Records an [`Episode`] summary for every episode of the inner environment
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    discount: f64,
    weight: f64,
    current: Option<Episode>,
    history: Vec<Episode>,
}

impl<E> TrackedEnvironment<E> {
    /// Track `env`, discounting returns by `discount`
    pub fn new(env: E, discount: f64) -> Self {
        Self {
            env,
            discount,
            weight: 1.0,
            current: None,
            history: Vec::new(),
        }
    }

    /// Finished episodes, oldest first
    pub fn history(&self) -> &[Episode] {
        &self.history
    }

    fn finish_current(&mut self) {
        if let Some(mut episode) = self.current.take() {
            if episode.finished_at.is_none() {
                episode.finished_at = Some(Utc::now());
            }
            debug!(
                id = %episode.id,
                steps = episode.steps,
                discounted_return = episode.discounted_return,
                "episode recorded"
            );
            self.history.push(episode);
        }
    }
}

#[async_trait]
impl<E> Environment for TrackedEnvironment<E>
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
        self.finish_current();
        self.env.reset().await?;
        self.current = Some(Episode::start());
        self.weight = 1.0;
        Ok(())
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
        let step = self.env.step(action).await?;

        if let Some(episode) = self.current.as_mut() {
            episode.steps += 1;
            episode.total_reward += step.reward.value();
            episode.discounted_return += self.weight * step.reward.value();
            self.weight *= self.discount;

            if step.is_last() {
                episode.truncated = step.truncated;
                episode.finished_at = Some(Utc::now());
            }
        }

        Ok(step)
    }

    async fn close(&mut self) -> Result<()> {
        self.finish_current();
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiscreteSpace;

    /// Pays 1 per step and terminates after three steps
    struct Countdown {
        states: DiscreteSpace<u8>,
        observations: DiscreteSpace<u8>,
        actions: DiscreteSpace<u8>,
        left: u8,
    }

    impl Countdown {
        fn new() -> Self {
            Self {
                states: DiscreteSpace::new(vec![0, 1, 2, 3]).unwrap(),
                observations: DiscreteSpace::new(vec![0]).unwrap(),
                actions: DiscreteSpace::new(vec![0]).unwrap(),
                left: 0,
            }
        }
    }

    #[async_trait]
    impl Environment for Countdown {
        type Observation = u8;
        type Action = u8;
        type State = u8;

        fn state_space(&self) -> &StateSpace<u8> {
            &self.states
        }

        fn observation_space(&self) -> &ObservationSpace<u8> {
            &self.observations
        }

        fn action_space(&self) -> &ActionSpace<u8> {
            &self.actions
        }

        async fn reset(&mut self) -> Result<()> {
            self.left = 3;
            Ok(())
        }

        async fn step(&mut self, _action: u8) -> Result<Step<u8, u8>> {
            self.left -= 1;
            Ok(Step {
                observation: 0,
                reward: Reward(1.0),
                done: self.left == 0,
                truncated: false,
                hidden_state: Some(self.left),
            })
        }
    }

    #[tokio::test]
    async fn test_tracked_environment_records_episodes() {
        let mut env = TrackedEnvironment::new(Countdown::new(), 0.5);

        for _ in 0..2 {
            env.reset().await.unwrap();
            loop {
                if env.step(0).await.unwrap().is_last() {
                    break;
                }
            }
        }
        let current = env.episode_info().unwrap();
        assert!(current.is_finished());
        assert_eq!(current.steps, 3);
        assert_eq!(current.total_reward, 3.0);
        assert_eq!(current.discounted_return, 1.75);

        env.close().await.unwrap();
        assert_eq!(env.history().len(), 2);
        assert_ne!(env.history()[0].id, env.history()[1].id);
        assert!(env.episode_info().is_none());
    }
}
