//! Episodic table environment.
//!
//! `Environment` is the seam between the game and anything that plays it
//! (the tree search, the evaluation harness). `BlackjackTable` is the
//! concrete table: an N-deck shoe reshuffled at a penetration threshold,
//! one player hand against the dealer.

use std::cmp::Ordering;

use crate::config::TableConfig;
use crate::dealer::DEALER_STAND;
use crate::deck::Shoe;
use crate::error::BjResult;
use crate::hand::{hand_value, is_bust, is_natural};
use crate::state::{Action, Observation, BLACKJACK};

/// Result of one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub observation: Observation,
    /// Zero until the episode terminates.
    pub reward: f64,
    pub terminated: bool,
}

pub trait Environment: Clone {
    /// Deal a new episode.
    fn reset(&mut self) -> Observation;

    fn step(&mut self, action: Action) -> Step;

    fn legal_actions(&self) -> Vec<Action> {
        Action::ALL.to_vec()
    }

    /// Replace the chance source for all future draws. Used by the tree
    /// search to sample a different future on every iteration.
    fn reseed(&mut self, _seed: u64) {}
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BlackjackTable {
    config: TableConfig,
    shoe: Shoe,
    player: Vec<u8>,
    dealer: Vec<u8>,
    done: bool,
}

impl BlackjackTable {
    pub fn new(config: TableConfig, seed: u64) -> BjResult<Self> {
        config.validate()?;
        let shoe = Shoe::new(config.decks, seed);
        Ok(BlackjackTable {
            config,
            shoe,
            player: Vec::new(),
            dealer: Vec::new(),
            done: true,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn player_cards(&self) -> &[u8] {
        &self.player
    }

    pub fn dealer_cards(&self) -> &[u8] {
        &self.dealer
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn observe(&self) -> Observation {
        let hand = hand_value(&self.player);
        Observation {
            player_total: hand.total,
            dealer_upcard: self.dealer[0],
            usable_ace: hand.soft,
            temperature: self.config.counting.then(|| self.shoe.temperature()),
        }
    }

    fn settle(&mut self) -> f64 {
        while hand_value(&self.dealer).total < DEALER_STAND {
            let card = self.shoe.draw();
            self.dealer.push(card);
        }
        let player = hand_value(&self.player).total;
        let dealer = if is_bust(&self.dealer) {
            0
        } else {
            hand_value(&self.dealer).total
        };
        match player.cmp(&dealer) {
            Ordering::Greater if self.config.natural_bonus && is_natural(&self.player) => 1.5,
            Ordering::Greater => 1.0,
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
        }
    }
}

impl Environment for BlackjackTable {
    fn reset(&mut self) -> Observation {
        if self.shoe.penetration() >= self.config.penetration {
            self.shoe.reset();
        }
        self.dealer = vec![self.shoe.draw(), self.shoe.draw()];
        self.player = vec![self.shoe.draw(), self.shoe.draw()];
        self.done = false;
        self.observe()
    }

    fn step(&mut self, action: Action) -> Step {
        debug_assert!(!self.done, "step after the episode ended");
        let (reward, terminated) = match action {
            Action::Hit => {
                let card = self.shoe.draw();
                self.player.push(card);
                if hand_value(&self.player).total > BLACKJACK {
                    (-1.0, true)
                } else {
                    (0.0, false)
                }
            }
            Action::Stand => (self.settle(), true),
        };
        self.done = terminated;
        Step {
            observation: self.observe(),
            reward,
            terminated,
        }
    }

    fn legal_actions(&self) -> Vec<Action> {
        if self.done {
            Vec::new()
        } else {
            Action::ALL.to_vec()
        }
    }

    /// The dealer's hole card is unseen, so it goes back into the shoe and
    /// is redrawn from the reshuffled remainder.
    fn reseed(&mut self, seed: u64) {
        self.shoe.reseed(seed);
        let hole = if self.done || self.dealer.len() != 2 {
            None
        } else {
            self.dealer.pop()
        };
        if let Some(card) = hole {
            self.shoe.put_back(card);
        }
        self.shoe.reshuffle_remaining();
        if hole.is_some() {
            let card = self.shoe.draw();
            self.dealer.push(card);
        }
    }
}
