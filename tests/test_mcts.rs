//! Tree search against mock and real environments.

use bj_solver::cancel::CancelFlag;
use bj_solver::config::{SearchConfig, TableConfig};
use bj_solver::env::{BlackjackTable, Environment, Step};
use bj_solver::error::BjError;
use bj_solver::mcts::{TreeSearchSolver, MAX_ROLLOUT_STEPS};
use bj_solver::state::{Action, Observation};

// ---------------------------------------------------------------------------
// Mock environments
// ---------------------------------------------------------------------------

/// Deterministic table: every hit deals `card`, the dealer always ends on 18.
#[derive(Clone)]
struct FixedDealer {
    start: u8,
    total: u8,
    card: u8,
    done: bool,
}

impl FixedDealer {
    fn new(start: u8, card: u8) -> Self {
        FixedDealer {
            start,
            total: start,
            card,
            done: false,
        }
    }

    fn obs(&self) -> Observation {
        Observation {
            player_total: self.total,
            dealer_upcard: 8,
            usable_ace: false,
            temperature: None,
        }
    }
}

impl Environment for FixedDealer {
    fn reset(&mut self) -> Observation {
        self.total = self.start;
        self.done = false;
        self.obs()
    }

    fn step(&mut self, action: Action) -> Step {
        let reward = match action {
            Action::Hit => {
                self.total += self.card;
                if self.total > 21 {
                    self.done = true;
                    -1.0
                } else {
                    0.0
                }
            }
            Action::Stand => {
                self.done = true;
                match self.total.cmp(&18) {
                    std::cmp::Ordering::Greater => 1.0,
                    std::cmp::Ordering::Less => -1.0,
                    std::cmp::Ordering::Equal => 0.0,
                }
            }
        };
        Step {
            observation: self.obs(),
            reward,
            terminated: self.done,
        }
    }

    fn legal_actions(&self) -> Vec<Action> {
        if self.done {
            Vec::new()
        } else {
            Action::ALL.to_vec()
        }
    }
}

/// Never terminates and offers no action.
#[derive(Clone)]
struct Stuck;

impl Environment for Stuck {
    fn reset(&mut self) -> Observation {
        stuck_obs()
    }

    fn step(&mut self, _action: Action) -> Step {
        Step {
            observation: stuck_obs(),
            reward: 0.0,
            terminated: false,
        }
    }

    fn legal_actions(&self) -> Vec<Action> {
        Vec::new()
    }
}

/// Always offers an action, never terminates.
#[derive(Clone)]
struct Endless;

impl Environment for Endless {
    fn reset(&mut self) -> Observation {
        stuck_obs()
    }

    fn step(&mut self, _action: Action) -> Step {
        Step {
            observation: stuck_obs(),
            reward: 0.0,
            terminated: false,
        }
    }
}

/// Every action ends the round as a push.
#[derive(Clone)]
struct Push;

impl Environment for Push {
    fn reset(&mut self) -> Observation {
        stuck_obs()
    }

    fn step(&mut self, _action: Action) -> Step {
        Step {
            observation: stuck_obs(),
            reward: 0.0,
            terminated: true,
        }
    }
}

fn stuck_obs() -> Observation {
    Observation {
        player_total: 12,
        dealer_upcard: 5,
        usable_ace: false,
        temperature: None,
    }
}

fn solver(iterations: usize, seed: u64) -> TreeSearchSolver {
    TreeSearchSolver::new(SearchConfig {
        iterations,
        seed,
        ..SearchConfig::default()
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[test]
fn stands_on_20_against_18() {
    let mut env = FixedDealer::new(20, 5);
    let root = env.reset();
    let outcome = solver(200, 1).search(&env, root).unwrap();
    assert_eq!(outcome.action, Action::Stand);
    let stand = outcome.stats(Action::Stand).unwrap();
    let hit = outcome.stats(Action::Hit).unwrap();
    assert_eq!(stand.mean, 1.0);
    assert_eq!(hit.mean, -1.0);
    assert!(hit.terminal && stand.terminal);
    assert_eq!(outcome.root.player_total, 20);
    assert_eq!(stand.observation.player_total, 20);
    assert_eq!(hit.observation.player_total, 25);
}

#[test]
fn hits_from_10() {
    // Stand at 10 loses for sure; 10 + 5 + 5 = 20 beats the dealer.
    let mut env = FixedDealer::new(10, 5);
    let root = env.reset();
    let outcome = solver(500, 2).search(&env, root).unwrap();
    assert_eq!(outcome.action, Action::Hit);
    assert!(outcome.stats(Action::Hit).unwrap().mean > -1.0);
    assert_eq!(outcome.stats(Action::Stand).unwrap().mean, -1.0);
}

#[test]
fn visits_add_up_to_iterations() {
    let mut env = FixedDealer::new(14, 3);
    let root = env.reset();
    let outcome = solver(300, 3).search(&env, root).unwrap();
    let visits: u32 = outcome.children.iter().map(|c| c.visits).sum();
    assert_eq!(visits as usize, outcome.iterations);
    assert_eq!(outcome.children.len(), 2);
}

#[test]
fn search_leaves_environment_untouched() {
    let mut env = FixedDealer::new(12, 4);
    let root = env.reset();
    solver(100, 4).search(&env, root).unwrap();
    assert_eq!(env.total, 12);
    assert!(!env.done);
}

// ---------------------------------------------------------------------------
// Reproducibility
// ---------------------------------------------------------------------------

#[test]
fn same_seed_same_outcome_mock() {
    let mut env = FixedDealer::new(13, 4);
    let root = env.reset();
    let a = solver(400, 99).search(&env, root).unwrap();
    let b = solver(400, 99).search(&env, root).unwrap();
    assert_eq!(a, b);
}

#[test]
fn same_seed_same_outcome_real_table() {
    let mut env = BlackjackTable::new(TableConfig::default(), 31).unwrap();
    let root = env.reset();
    let a = solver(300, 5).search(&env, root).unwrap();
    let b = solver(300, 5).search(&env.clone(), root).unwrap();
    assert_eq!(a, b);
}

#[test]
fn real_table_stands_on_hard_20() {
    let mut env = BlackjackTable::new(TableConfig::default(), 0).unwrap();
    let mut checked = 0;
    for _ in 0..500 {
        let root = env.reset();
        if root.player_total == 20 && !root.usable_ace {
            let outcome = solver(1000, 6).search(&env, root).unwrap();
            assert_eq!(outcome.action, Action::Stand, "{}", root);
            checked += 1;
            if checked == 3 {
                break;
            }
        }
        env.step(Action::Stand);
    }
    assert!(checked > 0);
}

#[test]
fn uct_ties_are_broken_by_the_seed() {
    // With C = 0 and both children at mean 0, the third iteration picks
    // between two equal scores.
    let pick = |seed: u64| {
        let mut solver = TreeSearchSolver::new(SearchConfig {
            iterations: 3,
            exploration: 0.0,
            seed,
        })
        .unwrap();
        let outcome = solver.search(&Push, stuck_obs()).unwrap();
        let stand = outcome.stats(Action::Stand).unwrap().visits;
        let hit = outcome.stats(Action::Hit).unwrap().visits;
        assert_eq!(stand + hit, 3);
        if stand == 2 {
            Action::Stand
        } else {
            Action::Hit
        }
    };

    let picks: Vec<Action> = (0..32).map(pick).collect();
    assert!(picks.contains(&Action::Stand));
    assert!(picks.contains(&Action::Hit));
    for seed in 0..8 {
        assert_eq!(pick(seed), picks[seed as usize]);
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn no_legal_action_is_no_expansion() {
    let env = Stuck;
    match solver(10, 0).search(&env, stuck_obs()) {
        Err(BjError::NoExpansion { depth }) => assert_eq!(depth, 0),
        other => panic!("expected NoExpansion, got {:?}", other),
    }
}

#[test]
fn endless_rollout_hits_limit() {
    let env = Endless;
    match solver(10, 0).search(&env, stuck_obs()) {
        Err(BjError::RolloutLimit(n)) => assert_eq!(n, MAX_ROLLOUT_STEPS),
        other => panic!("expected RolloutLimit, got {:?}", other),
    }
}

#[test]
fn cancel_stops_search() {
    let flag = CancelFlag::new();
    flag.cancel();
    let mut env = FixedDealer::new(15, 2);
    let root = env.reset();
    let mut s = solver(100, 0).with_cancel(flag);
    assert!(matches!(s.search(&env, root), Err(BjError::Cancelled)));
}

#[test]
fn rejects_zero_iterations() {
    let config = SearchConfig {
        iterations: 0,
        ..SearchConfig::default()
    };
    assert!(TreeSearchSolver::new(config).is_err());
}
