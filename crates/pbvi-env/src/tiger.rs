//! The Tiger problem (Kaelbling, Littman & Cassandra, 1998)
//!
//! A tiger waits behind one of two doors and treasure behind the other.
//! Listening costs a little and reports the tiger's side with a fixed
//! accuracy; opening a door pays out and resets the tiger uniformly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pbvi_core::{
    ActionSpace, DiscreteSpace, ObservationSpace, Pomdp, PomdpError, Result, Reward, StateSpace,
};

/// Where the tiger is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TigerState {
    /// Behind the left door
    TigerLeft,
    /// Behind the right door
    TigerRight,
}

/// What the agent can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TigerAction {
    /// Open the left door
    OpenLeft,
    /// Open the right door
    OpenRight,
    /// Listen for the tiger
    Listen,
}

/// What the agent can hear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TigerObservation {
    /// Growl from the left
    HearLeft,
    /// Growl from the right
    HearRight,
    /// Silence after opening a door
    Nothing,
}

macro_rules! labels {
    ($ty:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            /// Every value, in space order
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Kebab-case label
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = PomdpError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($label => Ok($ty::$variant),)+
                    other => Err(PomdpError::UnknownLabel(other.to_string())),
                }
            }
        }
    };
}

labels!(TigerState {
    TigerLeft => "tiger-left",
    TigerRight => "tiger-right",
});

labels!(TigerAction {
    OpenLeft => "open-left",
    OpenRight => "open-right",
    Listen => "listen",
});

labels!(TigerObservation {
    HearLeft => "hear-left",
    HearRight => "hear-right",
    Nothing => "nothing",
});

/// Tiger rewards and sensor accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TigerParams {
    /// Reward for listening
    pub listen: f64,
    /// Reward for opening the tiger's door
    pub wrong_door: f64,
    /// Reward for opening the treasure door
    pub right_door: f64,
    /// Probability that listening reports the tiger's true side
    pub accuracy: f64,
}

impl Default for TigerParams {
    fn default() -> Self {
        Self {
            listen: -1.0,
            wrong_door: -100.0,
            right_door: 10.0,
            accuracy: 0.85,
        }
    }
}

/// The Tiger POMDP
#[derive(Debug, Clone)]
pub struct Tiger {
    params: TigerParams,
    states: StateSpace<TigerState>,
    actions: ActionSpace<TigerAction>,
    observations: ObservationSpace<TigerObservation>,
}

impl Tiger {
    /// Create a Tiger problem, rejecting an accuracy outside `[0, 1]`
    pub fn new(params: TigerParams) -> Result<Self> {
        if !(0.0..=1.0).contains(&params.accuracy) {
            return Err(PomdpError::InvalidConfig(format!(
                "tiger accuracy must lie in [0, 1], got {}",
                params.accuracy
            )));
        }
        Ok(Self {
            params,
            states: DiscreteSpace::new(TigerState::ALL.to_vec())?,
            actions: DiscreteSpace::new(TigerAction::ALL.to_vec())?,
            observations: DiscreteSpace::new(TigerObservation::ALL.to_vec())?,
        })
    }

    /// Problem parameters
    #[must_use]
    pub fn params(&self) -> &TigerParams {
        &self.params
    }
}

impl Pomdp for Tiger {
    type State = TigerState;
    type Action = TigerAction;
    type Observation = TigerObservation;

    fn state_space(&self) -> &StateSpace<TigerState> {
        &self.states
    }

    fn action_space(&self) -> &ActionSpace<TigerAction> {
        &self.actions
    }

    fn observation_space(&self) -> &ObservationSpace<TigerObservation> {
        &self.observations
    }

    fn transition(&self, state: &TigerState, action: &TigerAction, next_state: &TigerState) -> f64 {
        match action {
            TigerAction::Listen if state == next_state => 1.0,
            TigerAction::Listen => 0.0,
            TigerAction::OpenLeft | TigerAction::OpenRight => 0.5,
        }
    }

    fn reward(&self, state: &TigerState, action: &TigerAction, _next_state: &TigerState) -> Reward {
        let value = match (action, state) {
            (TigerAction::Listen, _) => self.params.listen,
            (TigerAction::OpenLeft, TigerState::TigerLeft)
            | (TigerAction::OpenRight, TigerState::TigerRight) => self.params.wrong_door,
            (TigerAction::OpenLeft, TigerState::TigerRight)
            | (TigerAction::OpenRight, TigerState::TigerLeft) => self.params.right_door,
        };
        Reward(value)
    }

    fn observation(
        &self,
        next_state: &TigerState,
        action: &TigerAction,
        observation: &TigerObservation,
    ) -> f64 {
        let accuracy = self.params.accuracy;
        match (action, next_state, observation) {
            (TigerAction::Listen, TigerState::TigerLeft, TigerObservation::HearLeft)
            | (TigerAction::Listen, TigerState::TigerRight, TigerObservation::HearRight) => accuracy,
            (TigerAction::Listen, TigerState::TigerLeft, TigerObservation::HearRight)
            | (TigerAction::Listen, TigerState::TigerRight, TigerObservation::HearLeft) => {
                1.0 - accuracy
            }
            (TigerAction::OpenLeft | TigerAction::OpenRight, _, TigerObservation::Nothing) => 1.0,
            _ => 0.0,
        }
    }
}
