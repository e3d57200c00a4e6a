//! Value iteration over (player total, dealer upcard, usable ace,
//! temperature).
//!
//! The game is episodic with no discounting. Each state's value is the
//! better of standing (an exact expectation over the dealer's terminal
//! totals) and hitting (an expectation over the next card of the current
//! values of the resulting states). Bust states are fixed at -1.
//!
//! Two sweep modes are supported and never mixed within a solve:
//!
//! - in-place (Gauss-Seidel): states are updated in index order and later
//!   states see values written earlier in the same sweep;
//! - synchronous (Jacobi): a sweep reads only the previous sweep's values
//!   and writes a fresh buffer, computed in parallel.
//!
//! Both reach the same fixed point along different trajectories.

use std::path::Path;

use itertools::iproduct;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::composition::{CardDistribution, DeckCompositionTable};
use crate::config::{SolverConfig, SweepMode};
use crate::dealer::{dealer_table, DealerOutcomes};
use crate::deck::ACE;
use crate::error::{BjError, BjResult};
use crate::hand::{hand_value, is_natural};
use crate::policy::{Policy, StateValues};
use crate::state::{Action, State, StateSpace, BLACKJACK, NUM_UPCARDS};

pub const BUST_VALUE: f64 = -1.0;

// ---------------------------------------------------------------------------
// Transition model
// ---------------------------------------------------------------------------

/// Card odds and dealer outcomes per temperature bucket.
#[derive(Debug, Clone)]
pub struct Model {
    space: StateSpace,
    cards: Vec<CardDistribution>,
    dealer: Vec<[DealerOutcomes; NUM_UPCARDS]>,
}

impl Model {
    pub fn new(config: &SolverConfig, table: Option<&DeckCompositionTable>) -> BjResult<Self> {
        let space = StateSpace::new(config.counting_enabled);
        let cards: Vec<CardDistribution> = if config.counting_enabled {
            let table = table.ok_or(BjError::MissingTable)?;
            (0..space.temperatures() as u8).map(|t| *table.row(t)).collect()
        } else {
            vec![CardDistribution::uniform()]
        };
        let dealer = cards
            .iter()
            .map(|c| dealer_table(c, config.dealer_rule()))
            .collect::<BjResult<Vec<_>>>()?;
        Ok(Model {
            space,
            cards,
            dealer,
        })
    }

    pub fn space(&self) -> StateSpace {
        self.space
    }

    pub fn cards(&self, temperature: u8) -> &CardDistribution {
        &self.cards[temperature as usize]
    }

    pub fn dealer(&self, upcard: u8, temperature: u8) -> &DealerOutcomes {
        &self.dealer[temperature as usize][upcard as usize - 1]
    }

    pub fn stand_value(&self, s: State) -> f64 {
        self.dealer(s.dealer_upcard, s.temperature)
            .stand_value(s.player_total)
    }

    /// Expected value of one more card, bootstrapped from `values`.
    pub fn hit_value(&self, s: State, values: &[f64]) -> f64 {
        self.cards(s.temperature)
            .iter()
            .filter(|&(_, p)| p > 0.0)
            .map(|(rank, p)| {
                let best = hit_readings(s.player_total, s.usable_ace, rank)
                    .iter()
                    .flatten()
                    .map(|&(total, soft)| {
                        values[self.space.index(State::new(
                            total,
                            s.dealer_upcard,
                            soft,
                            s.temperature,
                        ))]
                    })
                    .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
                p * best.unwrap_or(BUST_VALUE)
            })
            .sum()
    }

    /// `[stand, hit]` for a non-bust state.
    pub fn action_values(&self, s: State, values: &[f64]) -> [f64; 2] {
        [self.stand_value(s), self.hit_value(s, values)]
    }

    /// Bellman optimality backup for the state at `index`.
    fn backup(&self, index: usize, values: &[f64]) -> f64 {
        let s = self.space.state(index);
        if s.is_bust() {
            return BUST_VALUE;
        }
        let [stand, hit] = self.action_values(s, values);
        stand.max(hit)
    }

    /// Expected return of a fresh round: two player cards and the upcard
    /// drawn independently at this temperature, naturals settled at once.
    pub fn opening_value(&self, temperature: u8, values: &[f64], natural_multiplier: f64) -> f64 {
        let cards = self.cards(temperature);
        iproduct!(cards.iter(), cards.iter(), cards.iter())
            .map(|((c1, p1), (c2, p2), (upcard, pu))| {
                let weight = p1 * p2 * pu;
                if weight == 0.0 {
                    return 0.0;
                }
                let dealer = self.dealer(upcard, temperature);
                if is_natural(&[c1, c2]) {
                    // Standing on 21 has no losing outcome; only the wins
                    // get the bonus.
                    return weight * natural_multiplier * dealer.stand_value(BLACKJACK);
                }
                let hand = hand_value(&[c1, c2]);
                let s = State::new(hand.total, upcard, hand.soft, temperature);
                weight * values[self.space.index(s)]
            })
            .sum()
    }
}

/// Readings of the hand after drawing `rank`, `None` where a reading busts.
///
/// A usable ace may stay soft or drop to 1; a drawn ace may be counted 11.
/// The solver takes the better of the valid readings.
pub fn hit_readings(total: u8, usable_ace: bool, rank: u8) -> [Option<(u8, bool)>; 2] {
    let valid = |t: u8| (1..=BLACKJACK).contains(&t);
    let raw = total + rank;
    if usable_ace {
        let soft = Some((raw, true)).filter(|&(t, _)| valid(t));
        let hard = raw.checked_sub(10).filter(|&t| valid(t)).map(|t| (t, false));
        [soft, hard]
    } else {
        let hard = Some((raw, false)).filter(|&(t, _)| valid(t));
        let soft = Some(raw + 10)
            .filter(|&t| rank == ACE && valid(t))
            .map(|t| (t, true));
        [hard, soft]
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

pub struct ValueIterationSolver {
    config: SolverConfig,
    model: Model,
    values: Vec<f64>,
    sweeps: usize,
    cancel: Option<CancelFlag>,
}

impl ValueIterationSolver {
    /// `table` is required in counting mode and ignored otherwise.
    pub fn new(config: SolverConfig, table: Option<&DeckCompositionTable>) -> BjResult<Self> {
        config.validate()?;
        let model = Model::new(&config, table)?;
        let space = model.space();
        let values = (0..space.len())
            .map(|i| if space.state(i).is_bust() { BUST_VALUE } else { 0.0 })
            .collect();
        Ok(ValueIterationSolver {
            config,
            model,
            values,
            sweeps: 0,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// One full sweep in the configured mode; returns the largest change.
    pub fn sweep(&mut self) -> f64 {
        self.sweeps += 1;
        match self.config.sweep {
            SweepMode::InPlace => {
                let mut delta = 0.0f64;
                for i in 0..self.values.len() {
                    let new = self.model.backup(i, &self.values);
                    let old = std::mem::replace(&mut self.values[i], new);
                    delta = delta.max((new - old).abs());
                }
                delta
            }
            SweepMode::Synchronous => {
                let model = &self.model;
                let prev = &self.values;
                let next: Vec<f64> = (0..prev.len())
                    .into_par_iter()
                    .map(|i| model.backup(i, prev))
                    .collect();
                let delta = prev
                    .iter()
                    .zip(&next)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0f64, f64::max);
                self.values = next;
                delta
            }
        }
    }

    pub fn solve(&mut self) -> BjResult<Solution> {
        self.solve_with_progress(|_, _| {})
    }

    /// Sweep until the largest change drops below theta. `progress` gets the
    /// sweep number and its delta after every sweep.
    pub fn solve_with_progress(
        &mut self,
        mut progress: impl FnMut(usize, f64),
    ) -> BjResult<Solution> {
        let theta = self.config.theta;
        let final_delta = loop {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                return Err(BjError::Cancelled);
            }
            let delta = self.sweep();
            progress(self.sweeps, delta);
            if delta < theta {
                break delta;
            }
            if self.sweeps >= self.config.max_sweeps {
                return Err(BjError::NotConverged {
                    sweeps: self.sweeps,
                    delta,
                    theta,
                });
            }
        };

        let multiplier = self.config.natural_multiplier();
        let opening_values = (0..self.model.space().temperatures() as u8)
            .map(|t| self.model.opening_value(t, &self.values, multiplier))
            .collect();

        Ok(Solution {
            config: self.config.clone(),
            values: StateValues::new(self.model.space(), self.values.clone()),
            policy: self.extract_policy(),
            sweeps: self.sweeps,
            final_delta,
            opening_values,
        })
    }

    /// Greedy policy from the current values; stand on exact ties.
    pub fn extract_policy(&self) -> Policy {
        let space = self.model.space();
        let actions = space
            .states()
            .map(|s| {
                if s.is_bust() {
                    return Action::Stand;
                }
                let [stand, hit] = self.model.action_values(s, &self.values);
                if hit > stand {
                    Action::Hit
                } else {
                    Action::Stand
                }
            })
            .collect();
        Policy::new(space, actions)
    }
}

// ---------------------------------------------------------------------------
// Solution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Solution {
    pub config: SolverConfig,
    pub values: StateValues,
    pub policy: Policy,
    pub sweeps: usize,
    pub final_delta: f64,
    /// Expected return of a fresh round per temperature bucket.
    pub opening_values: Vec<f64>,
}

/// JSON summary stored beside the binary artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub config: SolverConfig,
    pub shape: Vec<usize>,
    pub sweeps: usize,
    pub final_delta: f64,
    pub hit_states: usize,
    pub opening_values: Vec<f64>,
}

pub const POLICY_FILE: &str = "policy.bin";
pub const VALUES_FILE: &str = "values.bin";
pub const REPORT_FILE: &str = "report.json";

impl Solution {
    pub fn report(&self) -> SolveReport {
        SolveReport {
            config: self.config.clone(),
            shape: self.policy.space().shape(),
            sweeps: self.sweeps,
            final_delta: self.final_delta,
            hit_states: self.policy.hit_count(),
            opening_values: self.opening_values.clone(),
        }
    }

    /// Write policy, values and report into `dir`.
    pub fn save(&self, dir: &Path) -> BjResult<()> {
        std::fs::create_dir_all(dir)?;
        self.policy.save(&dir.join(POLICY_FILE))?;
        self.values.save(&dir.join(VALUES_FILE))?;
        let json = serde_json::to_string_pretty(&self.report())?;
        std::fs::write(dir.join(REPORT_FILE), json)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> BjResult<Self> {
        let json = std::fs::read_to_string(dir.join(REPORT_FILE))?;
        let report: SolveReport = serde_json::from_str(&json)?;
        let space = StateSpace::new(report.config.counting_enabled);
        Ok(Solution {
            policy: Policy::load(&dir.join(POLICY_FILE), space)?,
            values: StateValues::load(&dir.join(VALUES_FILE), space)?,
            config: report.config,
            sweeps: report.sweeps,
            final_delta: report.final_delta,
            opening_values: report.opening_values,
        })
    }
}
