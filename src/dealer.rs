//! Dealer terminal-outcome distribution.
//!
//! The dealer starts from the upcard and draws until reaching 17 or more.
//! Instead of recursing over every card sequence, weights are tabulated per
//! running total: each total is processed once, in ascending order, and
//! pushes `weight * p(card)` forward. Every draw raises the hard total, so a
//! total's weight is complete before it is processed.
//!
//! The weight carried forward is the product of the probabilities along the
//! whole path. Carrying only the last card's probability inflates the mass
//! far past 1, which `from_parts` rejects.

use serde::{Deserialize, Serialize};

use crate::composition::{CardDistribution, PROBABILITY_TOLERANCE};
use crate::deck::ACE;
use crate::error::{BjError, BjResult};
use crate::state::{BLACKJACK, NUM_UPCARDS};

pub const DEALER_STAND: u8 = 17;

/// Number of terminal totals 17..=21.
pub const NUM_DEALER_TOTALS: usize = (BLACKJACK - DEALER_STAND + 1) as usize;

// Highest hard total reachable from a drawing hand: 16 + 10.
const MAX_HARD_TOTAL: usize = DEALER_STAND as usize - 1 + 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealerRule {
    /// Aces always count 1; the dealer stands on any hard 17+.
    HardTotals,
    /// One ace counts 11 when that stays at or under 21; stands on soft 17.
    StandSoft17,
}

impl DealerRule {
    #[inline]
    fn best_total(self, hard: usize, has_ace: bool) -> usize {
        match self {
            DealerRule::StandSoft17 if has_ace && hard + 10 <= BLACKJACK as usize => hard + 10,
            _ => hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DealerRule::HardTotals => "hard totals",
            DealerRule::StandSoft17 => "stands on soft 17",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DealerOutcomes {
    upcard: u8,
    totals: [f64; NUM_DEALER_TOTALS],
}

impl DealerOutcomes {
    pub fn compute(upcard: u8, cards: &CardDistribution, rule: DealerRule) -> BjResult<Self> {
        if !(1..=NUM_UPCARDS as u8).contains(&upcard) {
            return Err(BjError::InvalidCard(upcard));
        }

        // weights[hard][has_ace] for hands the dealer still has to draw on.
        let mut weights = [[0.0f64; 2]; MAX_HARD_TOTAL + 1];
        weights[upcard as usize][(upcard == ACE) as usize] = 1.0;

        let mut totals = [0.0f64; NUM_DEALER_TOTALS];
        let mut busted = 0.0f64;

        for hard in 1..DEALER_STAND as usize {
            for ace in 0..2 {
                let weight = weights[hard][ace];
                if weight == 0.0 {
                    continue;
                }
                for (rank, p) in cards.iter() {
                    if p == 0.0 {
                        continue;
                    }
                    let next_hard = hard + rank as usize;
                    let next_ace = ace == 1 || rank == ACE;
                    let path = weight * p;
                    let best = rule.best_total(next_hard, next_ace);

                    if best > BLACKJACK as usize {
                        busted += path;
                    } else if best >= DEALER_STAND as usize {
                        totals[best - DEALER_STAND as usize] += path;
                    } else {
                        weights[next_hard][next_ace as usize] += path;
                    }
                }
            }
        }

        Self::from_parts(upcard, totals, busted)
    }

    /// Build from accumulated terminal mass, checking that the five totals
    /// plus the bust mass add up to one.
    pub fn from_parts(
        upcard: u8,
        totals: [f64; NUM_DEALER_TOTALS],
        busted: f64,
    ) -> BjResult<Self> {
        let mapped: f64 = totals.iter().sum();
        let mass = mapped + busted;
        let residual = 1.0 - mapped;
        if (mass - 1.0).abs() > PROBABILITY_TOLERANCE
            || residual < -PROBABILITY_TOLERANCE
            || totals.iter().any(|&p| p < 0.0)
        {
            return Err(BjError::ProbabilityMass { upcard, mass });
        }
        Ok(DealerOutcomes { upcard, totals })
    }

    pub fn upcard(&self) -> u8 {
        self.upcard
    }

    /// P(dealer finishes on `total`), zero outside 17..=21.
    pub fn probability(&self, total: u8) -> f64 {
        if (DEALER_STAND..=BLACKJACK).contains(&total) {
            self.totals[(total - DEALER_STAND) as usize]
        } else {
            0.0
        }
    }

    pub fn totals(&self) -> &[f64; NUM_DEALER_TOTALS] {
        &self.totals
    }

    /// Implied bust probability: whatever the five totals leave over.
    pub fn bust(&self) -> f64 {
        1.0 - self.totals.iter().sum::<f64>()
    }

    /// Expected reward of standing on `player_total`. A dealer bust always
    /// pays the player, so this must not be called for a busted player.
    pub fn stand_value(&self, player_total: u8) -> f64 {
        debug_assert!(player_total <= BLACKJACK, "stand evaluated for a bust");
        let mut value = self.bust();
        for (i, &p) in self.totals.iter().enumerate() {
            let dealer = DEALER_STAND + i as u8;
            match player_total.cmp(&dealer) {
                std::cmp::Ordering::Greater => value += p,
                std::cmp::Ordering::Less => value -= p,
                std::cmp::Ordering::Equal => {}
            }
        }
        value
    }
}

/// Outcomes for upcards 1..=10 under one card distribution.
pub fn dealer_table(
    cards: &CardDistribution,
    rule: DealerRule,
) -> BjResult<[DealerOutcomes; NUM_UPCARDS]> {
    let mut out = [DealerOutcomes {
        upcard: 1,
        totals: [0.0; NUM_DEALER_TOTALS],
    }; NUM_UPCARDS];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = DealerOutcomes::compute(i as u8 + 1, cards, rule)?;
    }
    Ok(out)
}
