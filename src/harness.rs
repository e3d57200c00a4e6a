//! Play many episodes against an environment and tally the results.

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::env::Environment;
use crate::error::{BjError, BjResult};
use crate::mcts::{TreeSearchSolver, MAX_ROLLOUT_STEPS};
use crate::policy::Policy;
use crate::state::{Action, Observation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessReport {
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Sum of episode returns.
    pub net: f64,
}

impl HarnessReport {
    fn record(&mut self, reward: f64) {
        self.episodes += 1;
        self.net += reward;
        if reward > 0.0 {
            self.wins += 1;
        } else if reward < 0.0 {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.wins as f64 / self.episodes as f64
        }
    }

    /// Average return per episode.
    pub fn mean_return(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.net / self.episodes as f64
        }
    }
}

/// Play one episode, asking `decide` for every action. Returns the summed
/// reward.
pub fn play_episode<E, F>(env: &mut E, mut decide: F) -> BjResult<f64>
where
    E: Environment,
    F: FnMut(&E, Observation) -> BjResult<Action>,
{
    let mut obs = env.reset();
    let mut total = 0.0;
    for _ in 0..MAX_ROLLOUT_STEPS {
        let action = decide(&*env, obs)?;
        let step = env.step(action);
        total += step.reward;
        if step.terminated {
            return Ok(total);
        }
        obs = step.observation;
    }
    Err(BjError::RolloutLimit(MAX_ROLLOUT_STEPS))
}

fn run<E, F>(
    env: &mut E,
    episodes: usize,
    cancel: Option<&CancelFlag>,
    mut decide: F,
) -> BjResult<HarnessReport>
where
    E: Environment,
    F: FnMut(&E, Observation) -> BjResult<Action>,
{
    let mut report = HarnessReport::default();
    for _ in 0..episodes {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(BjError::Cancelled);
        }
        let reward = play_episode(env, &mut decide)?;
        report.record(reward);
    }
    Ok(report)
}

/// Follow a solved policy for `episodes` rounds.
pub fn evaluate_policy<E: Environment>(
    env: &mut E,
    policy: &Policy,
    episodes: usize,
    cancel: Option<&CancelFlag>,
) -> BjResult<HarnessReport> {
    run(env, episodes, cancel, |_, obs| Ok(policy.action_for(&obs)))
}

/// Run a fresh tree search for every decision.
pub fn evaluate_search<E: Environment>(
    env: &mut E,
    solver: &mut TreeSearchSolver,
    episodes: usize,
    cancel: Option<&CancelFlag>,
) -> BjResult<HarnessReport> {
    run(env, episodes, cancel, |env, obs| solver.decide(env, obs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_by_sign() {
        let mut report = HarnessReport::default();
        for r in [1.0, -1.0, 0.0, 1.5, -1.0] {
            report.record(r);
        }
        assert_eq!(report.episodes, 5);
        assert_eq!((report.wins, report.losses, report.draws), (2, 2, 1));
        assert!((report.net - 0.5).abs() < 1e-12);
        assert!((report.mean_return() - 0.1).abs() < 1e-12);
    }
}
