//! Solved artifacts: the greedy policy and the converged state values.
//!
//! Both are frozen once built. On disk they are flat arrays in state-space
//! order (see `state`): one byte per state for the policy (0 = stand,
//! 1 = hit) and one little-endian f64 per state for the values.

use std::path::Path;

use crate::artifact::{read_f64s, read_u8s, write_f64s, write_u8s};
use crate::error::{BjError, BjResult};
use crate::state::{Action, Observation, State, StateSpace};

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    space: StateSpace,
    actions: Vec<Action>,
}

impl Policy {
    pub(crate) fn new(space: StateSpace, actions: Vec<Action>) -> Self {
        debug_assert_eq!(actions.len(), space.len());
        Policy { space, actions }
    }

    pub fn space(&self) -> StateSpace {
        self.space
    }

    #[inline]
    pub fn action(&self, state: State) -> Action {
        self.actions[self.space.index(state)]
    }

    /// Action for an environment observation. Without a temperature axis the
    /// observed temperature is ignored.
    pub fn action_for(&self, obs: &Observation) -> Action {
        self.action(self.space.state_of(obs))
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn hit_count(&self) -> usize {
        self.actions.iter().filter(|&&a| a == Action::Hit).count()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.actions.iter().map(|a| a.index()).collect()
    }

    pub fn from_bytes(space: StateSpace, bytes: &[u8]) -> BjResult<Self> {
        if bytes.len() != space.len() {
            return Err(BjError::InvalidValue(format!(
                "policy holds {} states, expected {}",
                bytes.len(),
                space.len()
            )));
        }
        let actions = bytes
            .iter()
            .map(|&b| {
                Action::from_index(b)
                    .ok_or_else(|| BjError::InvalidValue(format!("invalid policy action {}", b)))
            })
            .collect::<BjResult<Vec<_>>>()?;
        Ok(Policy { space, actions })
    }

    pub fn save(&self, path: &Path) -> BjResult<()> {
        write_u8s(path, &self.to_bytes())
    }

    pub fn load(path: &Path, space: StateSpace) -> BjResult<Self> {
        Self::from_bytes(space, &read_u8s(path)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateValues {
    space: StateSpace,
    values: Vec<f64>,
}

impl StateValues {
    pub(crate) fn new(space: StateSpace, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), space.len());
        StateValues { space, values }
    }

    pub fn space(&self) -> StateSpace {
        self.space
    }

    #[inline]
    pub fn value(&self, state: State) -> f64 {
        self.values[self.space.index(state)]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn save(&self, path: &Path) -> BjResult<()> {
        write_f64s(path, &self.values)
    }

    pub fn load(path: &Path, space: StateSpace) -> BjResult<Self> {
        let values = read_f64s(path)?;
        if values.len() != space.len() {
            return Err(BjError::InvalidValue(format!(
                "value array holds {} states, expected {}",
                values.len(),
                space.len()
            )));
        }
        Ok(StateValues { space, values })
    }
}
