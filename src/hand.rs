//! Hand totals with ace softening.

use crate::deck::{ACE, TEN};
use crate::state::BLACKJACK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandValue {
    pub total: u8,
    /// One ace is counted as 11.
    pub soft: bool,
}

/// Best total of a hand: one ace counts 11 when that does not bust.
#[inline]
pub fn hand_value(cards: &[u8]) -> HandValue {
    let hard: u8 = cards.iter().sum();
    if cards.contains(&ACE) && hard + 10 <= BLACKJACK {
        HandValue {
            total: hard + 10,
            soft: true,
        }
    } else {
        HandValue {
            total: hard,
            soft: false,
        }
    }
}

#[inline]
pub fn is_bust(cards: &[u8]) -> bool {
    hand_value(cards).total > BLACKJACK
}

/// Ace plus a ten-valued card as the first two cards.
#[inline]
pub fn is_natural(cards: &[u8]) -> bool {
    cards.len() == 2 && cards.contains(&ACE) && cards.contains(&TEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_and_hard() {
        assert_eq!(hand_value(&[1, 6]), HandValue { total: 17, soft: true });
        assert_eq!(hand_value(&[1, 6, 9]), HandValue { total: 16, soft: false });
        assert_eq!(hand_value(&[1, 1]), HandValue { total: 12, soft: true });
        assert_eq!(hand_value(&[10, 9]), HandValue { total: 19, soft: false });
    }

    #[test]
    fn naturals() {
        assert!(is_natural(&[1, 10]));
        assert!(is_natural(&[10, 1]));
        assert!(!is_natural(&[1, 10, 10]));
        assert!(!is_natural(&[5, 6]));
    }

    #[test]
    fn bust() {
        assert!(is_bust(&[10, 10, 2]));
        assert!(!is_bust(&[1, 10, 10]));
    }
}
