//! Evaluation harness.

use approx::assert_abs_diff_eq;

use bj_solver::cancel::CancelFlag;
use bj_solver::config::{SearchConfig, SolverConfig, TableConfig};
use bj_solver::env::{BlackjackTable, Environment, Step};
use bj_solver::error::BjError;
use bj_solver::harness::{evaluate_policy, evaluate_search, play_episode};
use bj_solver::mcts::TreeSearchSolver;
use bj_solver::policy::Policy;
use bj_solver::state::{Action, Observation, StateSpace};
use bj_solver::value_iteration::ValueIterationSolver;

fn always(space: StateSpace, action: Action) -> Policy {
    Policy::from_bytes(space, &vec![action.index(); space.len()]).unwrap()
}

fn table(seed: u64) -> BlackjackTable {
    BlackjackTable::new(TableConfig::default(), seed).unwrap()
}

/// Round `n` pays `outcomes[n % len]` on the first stand.
#[derive(Clone)]
struct Scripted {
    outcomes: Vec<f64>,
    round: usize,
}

impl Environment for Scripted {
    fn reset(&mut self) -> Observation {
        self.round += 1;
        Observation {
            player_total: 15,
            dealer_upcard: 10,
            usable_ace: false,
            temperature: Some(4),
        }
    }

    fn step(&mut self, _action: Action) -> Step {
        let reward = self.outcomes[(self.round - 1) % self.outcomes.len()];
        Step {
            observation: Observation {
                player_total: 15,
                dealer_upcard: 10,
                usable_ace: false,
                temperature: Some(4),
            },
            reward,
            terminated: true,
        }
    }
}

#[test]
fn counts_follow_reward_signs() {
    let mut env = Scripted {
        outcomes: vec![1.0, -1.0, 0.0, 1.5],
        round: 0,
    };
    let policy = always(StateSpace::new(false), Action::Stand);
    let report = evaluate_policy(&mut env, &policy, 40, None).unwrap();
    assert_eq!(report.episodes, 40);
    assert_eq!(report.wins, 20);
    assert_eq!(report.losses, 10);
    assert_eq!(report.draws, 10);
    assert_abs_diff_eq!(report.net, 15.0, epsilon = 1e-12);
}

#[test]
fn always_stand_on_a_real_table() {
    let mut env = table(3);
    let policy = always(StateSpace::new(true), Action::Stand);
    let report = evaluate_policy(&mut env, &policy, 5_000, None).unwrap();
    assert_eq!(report.wins + report.losses + report.draws, 5_000);
    // No natural bonus, so every result is a whole unit.
    assert_abs_diff_eq!(
        report.net,
        report.wins as f64 - report.losses as f64,
        epsilon = 1e-9
    );
    // Standing on everything loses.
    assert!(report.mean_return() < 0.0);
}

#[test]
fn always_hit_never_wins() {
    let mut env = table(4);
    let policy = always(StateSpace::new(false), Action::Hit);
    let report = evaluate_policy(&mut env, &policy, 1_000, None).unwrap();
    assert_eq!(report.losses, 1_000);
    assert_eq!(report.win_rate(), 0.0);
}

#[test]
fn solved_policy_beats_always_stand() {
    let solution = ValueIterationSolver::new(SolverConfig::default(), None)
        .unwrap()
        .solve()
        .unwrap();
    let stand = always(solution.policy.space(), Action::Stand);

    let solved = evaluate_policy(&mut table(9), &solution.policy, 20_000, None).unwrap();
    let naive = evaluate_policy(&mut table(9), &stand, 20_000, None).unwrap();
    assert!(
        solved.mean_return() > naive.mean_return(),
        "solved {:.4} vs stand {:.4}",
        solved.mean_return(),
        naive.mean_return()
    );
}

#[test]
fn search_player_plays_full_rounds() {
    let mut solver = TreeSearchSolver::new(SearchConfig {
        iterations: 50,
        seed: 1,
        ..SearchConfig::default()
    })
    .unwrap();
    let report = evaluate_search(&mut table(5), &mut solver, 30, None).unwrap();
    assert_eq!(report.episodes, 30);
    assert_eq!(report.wins + report.losses + report.draws, 30);
}

#[test]
fn play_episode_sums_rewards() {
    let mut env = table(12);
    let reward = play_episode(&mut env, |_, obs| {
        Ok(if obs.player_total < 17 {
            Action::Hit
        } else {
            Action::Stand
        })
    })
    .unwrap();
    assert!([-1.0, 0.0, 1.0].contains(&reward));
}

#[test]
fn cancelled_harness() {
    let flag = CancelFlag::new();
    flag.cancel();
    let policy = always(StateSpace::new(false), Action::Stand);
    assert!(matches!(
        evaluate_policy(&mut table(1), &policy, 10, Some(&flag)),
        Err(BjError::Cancelled)
    ));
}
