//! Interactive deck tracker session.

use std::io::Cursor;

use bj_solver::deck::DeckTracker;
use bj_solver::policy::Policy;
use bj_solver::state::{Action, State, StateSpace};
use bj_solver::track::run_tracker_session;

fn session(input: &str, tracker: &mut DeckTracker, policy: Option<&Policy>) -> (String, usize, usize) {
    colored::control::set_override(false);
    let mut reader = Cursor::new(input.as_bytes().to_vec());
    let mut out = Vec::new();
    let summary = run_tracker_session(tracker, policy, &mut reader, &mut out);
    (
        String::from_utf8(out).unwrap(),
        summary.cards,
        summary.shuffles,
    )
}

#[test]
fn cards_are_counted() {
    let mut tracker = DeckTracker::new(1);
    let (out, cards, shuffles) = session("K Q J 10\nA 5\nq\n", &mut tracker, None);
    assert_eq!(cards, 6);
    assert_eq!(shuffles, 0);
    assert_eq!(tracker.remaining().total(), 46);
    assert!(out.contains("46 cards left"));
}

#[test]
fn shuffle_restores_the_shoe() {
    let mut tracker = DeckTracker::new(2);
    let (out, cards, shuffles) = session("2 3 4\nshuffle\n", &mut tracker, None);
    assert_eq!(cards, 3);
    assert_eq!(shuffles, 1);
    assert_eq!(tracker.remaining().total(), 104);
    assert!(out.contains("Shuffled."));
}

#[test]
fn bad_input_is_skipped() {
    let mut tracker = DeckTracker::new(1);
    let (out, cards, _) = session("x 7\nA A A A A\n", &mut tracker, None);
    assert_eq!(cards, 5);
    assert!(out.contains("'x' is not a card"));
    assert!(out.contains("no card of rank 1 left"));
}

#[test]
fn advise_reads_policy_at_current_temperature() {
    let space = StateSpace::new(true);
    let mut bytes = vec![Action::Stand.index(); space.len()];
    // Hit 16 vs 10 only when the shoe is at bucket 4.
    bytes[space.index(State::new(16, 10, false, 4))] = Action::Hit.index();
    let policy = Policy::from_bytes(space, &bytes).unwrap();

    let mut tracker = DeckTracker::new(6);
    let (out, _, _) = session("advise 16 K\n", &mut tracker, Some(&policy));
    assert!(out.contains("HIT"));

    let (out, _, _) = session("2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2 2\nadvise 16 K\n", &mut tracker, Some(&policy));
    assert!(out.contains("STAND"));
}

#[test]
fn advise_without_policy() {
    let mut tracker = DeckTracker::new(1);
    let (out, _, _) = session("advise 16 10\n", &mut tracker, None);
    assert!(out.contains("no policy loaded"));
}
