//! Table-driven POMDPs with string labels, loadable from JSON
//!
//! ```json
//! {
//!   "states": ["tiger-left", "tiger-right"],
//!   "actions": ["listen", "open-left", "open-right"],
//!   "observations": ["hear-left", "hear-right"],
//!   "transitions": [
//!     { "state": "tiger-left", "action": "listen", "next_state": "tiger-left", "probability": 1.0 }
//!   ],
//!   "rewards": [
//!     { "state": "tiger-left", "action": "listen", "value": -1.0 }
//!   ],
//!   "observation_model": [
//!     { "next_state": "tiger-left", "action": "listen", "observation": "hear-left", "probability": 0.85 }
//!   ]
//! }
//! ```
//!
//! Every combination not listed has probability (or reward) 0. A reward
//! entry without `next_state` applies to every next state unless a more
//! specific entry exists.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ActionSpace, DiscreteSpace, ObservationSpace, Pomdp, PomdpError, Result, Reward, SparseTable,
    StateSpace,
};

/// One `T(s, a, s')` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Current state
    pub state: String,
    /// Action taken
    pub action: String,
    /// Resulting state
    pub next_state: String,
    /// Transition probability
    pub probability: f64,
}

/// One `R(s, a, s')` entry; `next_state: None` matches any next state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEntry {
    /// Current state
    pub state: String,
    /// Action taken
    pub action: String,
    /// Resulting state, or any
    #[serde(default)]
    pub next_state: Option<String>,
    /// Reward value
    pub value: f64,
}

/// One `O(s', a, o)` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationEntry {
    /// State reached
    pub next_state: String,
    /// Action taken
    pub action: String,
    /// Observation emitted
    pub observation: String,
    /// Emission probability
    pub probability: f64,
}

/// Serialized form of a tabular POMDP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularDefinition {
    /// State labels, in order
    pub states: Vec<String>,
    /// Action labels, in order
    pub actions: Vec<String>,
    /// Observation labels, in order
    pub observations: Vec<String>,
    /// Non-zero transition probabilities
    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,
    /// Non-zero rewards
    #[serde(default)]
    pub rewards: Vec<RewardEntry>,
    /// Non-zero observation probabilities
    #[serde(default)]
    pub observation_model: Vec<ObservationEntry>,
}

/// POMDP backed by sparse tables over string labels
#[derive(Debug, Clone)]
pub struct TabularPomdp {
    states: StateSpace<String>,
    actions: ActionSpace<String>,
    observations: ObservationSpace<String>,
    transitions: SparseTable<(String, String, String)>,
    rewards: SparseTable<(String, String, String)>,
    default_rewards: SparseTable<(String, String)>,
    emissions: SparseTable<(String, String, String)>,
}

impl TabularPomdp {
    /// Build from a definition, validating labels and probabilities
    pub fn from_definition(definition: TabularDefinition) -> Result<Self> {
        let states = DiscreteSpace::new(definition.states)?;
        let actions = DiscreteSpace::new(definition.actions)?;
        let observations = DiscreteSpace::new(definition.observations)?;

        let mut transitions = SparseTable::new();
        for entry in definition.transitions {
            require(&states, &entry.state)?;
            require(&actions, &entry.action)?;
            require(&states, &entry.next_state)?;
            check_probability(entry.probability)?;
            transitions.insert((entry.state, entry.action, entry.next_state), entry.probability);
        }

        let mut rewards = SparseTable::new();
        let mut default_rewards = SparseTable::new();
        for entry in definition.rewards {
            require(&states, &entry.state)?;
            require(&actions, &entry.action)?;
            match entry.next_state {
                Some(next_state) => {
                    require(&states, &next_state)?;
                    rewards.insert((entry.state, entry.action, next_state), entry.value);
                }
                None => {
                    default_rewards.insert((entry.state, entry.action), entry.value);
                }
            }
        }

        let mut emissions = SparseTable::new();
        for entry in definition.observation_model {
            require(&states, &entry.next_state)?;
            require(&actions, &entry.action)?;
            require(&observations, &entry.observation)?;
            check_probability(entry.probability)?;
            emissions.insert((entry.next_state, entry.action, entry.observation), entry.probability);
        }

        debug!(
            states = states.len(),
            actions = actions.len(),
            observations = observations.len(),
            transitions = transitions.len(),
            emissions = emissions.len(),
            "loaded tabular POMDP"
        );

        Ok(Self {
            states,
            actions,
            observations,
            transitions,
            rewards,
            default_rewards,
            emissions,
        })
    }

    /// Parse a JSON definition
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_definition(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON definition file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

fn require(space: &DiscreteSpace<String>, label: &str) -> Result<()> {
    if space.iter().any(|item| item == label) {
        Ok(())
    } else {
        Err(PomdpError::UnknownLabel(label.to_string()))
    }
}

fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(PomdpError::InvalidConfig(format!("probability {p} outside [0, 1]")))
    }
}

fn key3(a: &str, b: &str, c: &str) -> (String, String, String) {
    (a.to_string(), b.to_string(), c.to_string())
}

impl Pomdp for TabularPomdp {
    type State = String;
    type Action = String;
    type Observation = String;

    fn state_space(&self) -> &StateSpace<String> {
        &self.states
    }

    fn action_space(&self) -> &ActionSpace<String> {
        &self.actions
    }

    fn observation_space(&self) -> &ObservationSpace<String> {
        &self.observations
    }

    fn transition(&self, state: &String, action: &String, next_state: &String) -> f64 {
        self.transitions.get(&key3(state, action, next_state))
    }

    fn reward(&self, state: &String, action: &String, next_state: &String) -> Reward {
        let value = self
            .rewards
            .get_explicit(&key3(state, action, next_state))
            .unwrap_or_else(|| self.default_rewards.get(&(state.clone(), action.clone())));
        Reward(value)
    }

    fn observation(&self, next_state: &String, action: &String, observation: &String) -> f64 {
        self.emissions.get(&key3(next_state, action, observation))
    }
}
