//! State space shared by the value-iteration solver, the policy artifact and
//! environment observations.
//!
//! Layout is row-major over (player total, dealer upcard, usable ace,
//! temperature), so ascending flat index is exactly the sweep order:
//!
//! ```text
//! index = (((total - 1) * 10 + (upcard - 1)) * 2 + usable_ace) * T + temperature
//! ```
//!
//! `T` is 10 in counting mode and 1 otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest representable player total. Totals above 21 are bust states.
pub const MAX_PLAYER_TOTAL: u8 = 31;
pub const BLACKJACK: u8 = 21;
pub const NUM_UPCARDS: usize = 10;
pub const NUM_TEMPERATURES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    Stand = 0,
    Hit = 1,
}

impl Action {
    /// Both actions in tie-break order.
    pub const ALL: [Action; 2] = [Action::Stand, Action::Hit];

    pub fn from_index(value: u8) -> Option<Action> {
        match value {
            0 => Some(Action::Stand),
            1 => Some(Action::Hit),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Stand => "STAND",
            Action::Hit => "HIT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    pub player_total: u8,
    pub dealer_upcard: u8,
    pub usable_ace: bool,
    pub temperature: u8,
}

impl State {
    pub fn new(player_total: u8, dealer_upcard: u8, usable_ace: bool, temperature: u8) -> Self {
        State {
            player_total,
            dealer_upcard,
            usable_ace,
            temperature,
        }
    }

    #[inline]
    pub fn is_bust(&self) -> bool {
        self.player_total > BLACKJACK
    }
}

/// What an environment reports after `reset` or `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub player_total: u8,
    pub dealer_upcard: u8,
    pub usable_ace: bool,
    /// Present only when the environment tracks the deck temperature.
    pub temperature: Option<u8>,
}

impl Observation {
    pub fn state(&self) -> State {
        State::new(
            self.player_total,
            self.dealer_upcard,
            self.usable_ace,
            self.temperature.unwrap_or(0),
        )
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let soft = if self.usable_ace { "soft " } else { "" };
        write!(f, "{}{} vs {}", soft, self.player_total, self.dealer_upcard)?;
        if let Some(t) = self.temperature {
            write!(f, " (temp {})", t)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpace {
    temperatures: usize,
}

impl StateSpace {
    pub fn new(counting: bool) -> Self {
        StateSpace {
            temperatures: if counting { NUM_TEMPERATURES } else { 1 },
        }
    }

    #[inline]
    pub fn temperatures(&self) -> usize {
        self.temperatures
    }

    #[inline]
    pub fn is_counting(&self) -> bool {
        self.temperatures > 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        MAX_PLAYER_TOTAL as usize * NUM_UPCARDS * 2 * self.temperatures
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Array shape of the persisted artifacts.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![MAX_PLAYER_TOTAL as usize, NUM_UPCARDS, 2];
        if self.is_counting() {
            shape.push(self.temperatures);
        }
        shape
    }

    #[inline]
    pub fn index(&self, s: State) -> usize {
        assert!(
            (1..=MAX_PLAYER_TOTAL).contains(&s.player_total),
            "player total {} out of range",
            s.player_total
        );
        assert!(
            (1..=NUM_UPCARDS as u8).contains(&s.dealer_upcard),
            "dealer upcard {} out of range",
            s.dealer_upcard
        );
        let t = s.temperature as usize;
        assert!(t < self.temperatures, "temperature {} out of range", t);

        let total = (s.player_total - 1) as usize;
        let upcard = (s.dealer_upcard - 1) as usize;
        ((total * NUM_UPCARDS + upcard) * 2 + s.usable_ace as usize) * self.temperatures + t
    }

    pub fn state(&self, index: usize) -> State {
        assert!(index < self.len(), "state index {} out of range", index);
        let t = index % self.temperatures;
        let rest = index / self.temperatures;
        let usable_ace = rest % 2 == 1;
        let rest = rest / 2;
        let upcard = rest % NUM_UPCARDS;
        let total = rest / NUM_UPCARDS;
        State::new(total as u8 + 1, upcard as u8 + 1, usable_ace, t as u8)
    }

    /// Collapse an observation onto this space (drops the temperature when
    /// not counting).
    pub fn state_of(&self, obs: &Observation) -> State {
        let mut s = obs.state();
        if !self.is_counting() {
            s.temperature = 0;
        }
        s
    }

    /// All states in sweep order.
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.len()).map(move |i| self.state(i))
    }
}
