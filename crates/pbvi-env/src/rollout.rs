//! Roll out belief-based policies in an environment

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pbvi_core::{Environment, Policy, Pomdp, Result};

use crate::BeliefTracker;

/// Outcome of one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// `Σ_t γ^t r_t`
    pub discounted_return: f64,
    /// Undiscounted reward sum
    pub total_reward: f64,
    /// Steps taken
    pub steps: usize,
    /// Whether a time limit ended the episode
    pub truncated: bool,
}

/// Summary over several episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Number of episodes
    pub episodes: usize,
    /// Mean discounted return
    pub mean_discounted_return: f64,
    /// Standard error of the mean discounted return
    pub std_error: f64,
    /// Mean undiscounted reward per episode
    pub mean_total_reward: f64,
    /// Per-episode outcomes
    pub outcomes: Vec<EpisodeOutcome>,
}

/// Run one episode, choosing actions from the tracked belief
///
/// The environment must end episodes on its own, e.g. through
/// [`TimeLimit`](crate::TimeLimit).
pub async fn run_episode<E, P, Q>(
    env: &mut E,
    tracker: &mut BeliefTracker<P>,
    policy: &Q,
    discount: f64,
) -> Result<EpisodeOutcome>
where
    E: Environment<Action = P::Action, Observation = P::Observation>,
    P: Pomdp,
    Q: Policy<State = P::State, Action = P::Action>,
{
    env.reset().await?;
    tracker.reset();

    let mut outcome = EpisodeOutcome {
        discounted_return: 0.0,
        total_reward: 0.0,
        steps: 0,
        truncated: false,
    };
    let mut weight = 1.0;

    loop {
        let action = policy.act(tracker.belief())?;
        let step = env.step(action.clone()).await?;

        outcome.discounted_return += weight * step.reward.value();
        outcome.total_reward += step.reward.value();
        outcome.steps += 1;
        weight *= discount;

        tracker.update(&action, &step.observation)?;

        if step.is_last() {
            outcome.truncated = step.truncated;
            break;
        }
    }

    debug!(
        steps = outcome.steps,
        discounted_return = outcome.discounted_return,
        "episode finished"
    );
    Ok(outcome)
}

/// Run `episodes` episodes and summarize the returns
pub async fn evaluate<E, P, Q>(
    env: &mut E,
    tracker: &mut BeliefTracker<P>,
    policy: &Q,
    episodes: usize,
    discount: f64,
) -> Result<Evaluation>
where
    E: Environment<Action = P::Action, Observation = P::Observation>,
    P: Pomdp,
    Q: Policy<State = P::State, Action = P::Action>,
{
    let mut outcomes = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        outcomes.push(run_episode(env, tracker, policy, discount).await?);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = outcomes.len().max(1) as f64;
    let mean_discounted_return = outcomes.iter().map(|o| o.discounted_return).sum::<f64>() / n;
    let mean_total_reward = outcomes.iter().map(|o| o.total_reward).sum::<f64>() / n;
    let std_error = if outcomes.len() > 1 {
        let variance = outcomes
            .iter()
            .map(|o| (o.discounted_return - mean_discounted_return).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        (variance / n).sqrt()
    } else {
        0.0
    };

    info!(
        episodes,
        mean_discounted_return, std_error, mean_total_reward, "evaluation complete"
    );

    Ok(Evaluation {
        episodes,
        mean_discounted_return,
        std_error,
        mean_total_reward,
        outcomes,
    })
}
