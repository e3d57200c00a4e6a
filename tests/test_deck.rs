//! Shoe, composition and temperature tracking.

use bj_solver::deck::{
    categorize, Composition, DeckTracker, Shoe, RANK_COPIES, TEMPERATURE_BREAKPOINTS,
};
use bj_solver::error::BjError;

#[test]
fn fresh_shoe_is_bucket_four() {
    // Mean count value of a full shoe is 95/13 with aces at 11.
    for decks in [1, 2, 6, 8] {
        let c = Composition::full(decks);
        let mean = c.mean_count_value().unwrap();
        assert!((mean - 95.0 / 13.0).abs() < 1e-12);
        assert_eq!(c.temperature(), 4);
    }
}

#[test]
fn categorize_boundaries() {
    assert_eq!(categorize(7.0), 0);
    assert_eq!(categorize(TEMPERATURE_BREAKPOINTS[0]), 1);
    assert_eq!(categorize(7.40), 7);
    assert_eq!(categorize(8.242105263157894), 9);
    assert_eq!(categorize(9.5), 9);
}

#[test]
fn shoe_deals_every_card_once() {
    let mut shoe = Shoe::new(1, 42);
    let mut seen = [0u32; 10];
    for _ in 0..52 {
        seen[shoe.draw() as usize - 1] += 1;
    }
    assert_eq!(seen, RANK_COPIES);
    assert!(shoe.is_empty());
    assert!(shoe.remaining().is_empty());
    assert!((shoe.penetration() - 1.0).abs() < 1e-12);

    // An empty shoe reshuffles on the next draw.
    shoe.draw();
    assert_eq!(shoe.len(), 51);
}

#[test]
fn same_seed_same_order() {
    let mut a = Shoe::new(6, 9);
    let mut b = Shoe::new(6, 9);
    let da: Vec<u8> = (0..100).map(|_| a.draw()).collect();
    let db: Vec<u8> = (0..100).map(|_| b.draw()).collect();
    assert_eq!(da, db);
}

#[test]
fn reshuffle_keeps_composition() {
    let mut shoe = Shoe::new(2, 1);
    for _ in 0..30 {
        shoe.draw();
    }
    let before = *shoe.remaining();
    shoe.reseed(77);
    shoe.reshuffle_remaining();
    assert_eq!(*shoe.remaining(), before);
    assert_eq!(shoe.len(), 104 - 30);
}

#[test]
fn tracker_cools_on_tens_and_heats_on_small_cards() {
    let mut tracker = DeckTracker::new(6);
    assert_eq!(tracker.temperature(), 4);
    for _ in 0..20 {
        tracker.card_dealt(10).unwrap();
    }
    // 2080 / 292 = 7.12
    assert_eq!(tracker.temperature(), 0);

    assert_eq!(tracker.shuffle(), 4);
    for _ in 0..24 {
        tracker.card_dealt(5).unwrap();
    }
    // 2160 / 288 = 7.5
    assert_eq!(tracker.temperature(), 9);
}

#[test]
fn tracker_rejects_exhausted_rank() {
    let mut tracker = DeckTracker::new(1);
    for _ in 0..4 {
        tracker.card_dealt(1).unwrap();
    }
    let before = *tracker.remaining();
    assert!(matches!(tracker.card_dealt(1), Err(BjError::InvalidValue(_))));
    assert_eq!(*tracker.remaining(), before);
    assert!(matches!(tracker.card_dealt(0), Err(BjError::InvalidCard(0))));
    assert!(matches!(tracker.card_dealt(11), Err(BjError::InvalidCard(11))));
}
