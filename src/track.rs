//! Interactive count tracking at a live table.
//!
//! Cards are typed as they are seen; the session keeps the remaining shoe
//! and prints the temperature after each one. With a solved counting policy
//! loaded, `advise` looks up hit/stand at the current temperature.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::deck::{DeckTracker, ACE, TEN};
use crate::display::styled_action;
use crate::policy::Policy;
use crate::state::{Observation, BLACKJACK, NUM_UPCARDS};

/// Parse a card as typed at the table: A, 2-10, T, J, Q, K.
pub fn parse_rank(text: &str) -> Option<u8> {
    match text.to_uppercase().as_str() {
        "A" | "1" | "11" => Some(ACE),
        "T" | "J" | "Q" | "K" | "10" => Some(TEN),
        s => s.parse::<u8>().ok().filter(|r| (2..=9).contains(r)),
    }
}

/// Cards seen and shuffles done by one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub cards: usize,
    pub shuffles: usize,
}

pub fn track_command(decks: u32, policy: Option<Policy>) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    let mut tracker = DeckTracker::new(decks);
    let summary = run_tracker_session(&mut tracker, policy.as_ref(), &mut reader, &mut writer);
    writeln!(
        writer,
        "\n  {} cards tracked, {} shuffles.",
        summary.cards, summary.shuffles
    )
    .ok();
}

pub fn run_tracker_session(
    tracker: &mut DeckTracker,
    policy: Option<&Policy>,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> SessionSummary {
    let mut summary = SessionSummary::default();

    writeln!(writer, "\n  {}", "Deck tracker".bold()).ok();
    writeln!(
        writer,
        "  Enter cards (A 2-10 T J Q K), {} to reset the shoe, {} for a decision, {} to quit.",
        "shuffle".bold(),
        "advise <total> <upcard> [soft]".bold(),
        "q".bold()
    )
    .ok();
    writeln!(writer, "  Temperature: {}", tracker.temperature()).ok();

    loop {
        write!(writer, "> ").ok();
        writer.flush().ok();

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().map(|w| w.to_lowercase()) {
            None => continue,
            Some(w) if w == "q" || w == "quit" => break,
            Some(w) if w == "shuffle" || w == "s" => {
                let t = tracker.shuffle();
                summary.shuffles += 1;
                writeln!(writer, "  {} Temperature: {}", "Shuffled.".yellow(), t).ok();
            }
            Some(w) if w == "advise" => advise(tracker, policy, &words[1..], writer),
            Some(_) => {
                for word in &words {
                    match parse_rank(word) {
                        Some(rank) => match tracker.card_dealt(rank) {
                            Ok(_) => summary.cards += 1,
                            Err(e) => {
                                writeln!(writer, "  {} {}", "Skipped:".red(), e).ok();
                            }
                        },
                        None => {
                            writeln!(writer, "  {} '{}' is not a card", "Skipped:".red(), word).ok();
                        }
                    }
                }
                writeln!(
                    writer,
                    "  Temperature: {}  ({} cards left)",
                    tracker.temperature(),
                    tracker.remaining().total()
                )
                .ok();
            }
        }
    }

    summary
}

fn advise(tracker: &DeckTracker, policy: Option<&Policy>, args: &[&str], writer: &mut dyn Write) {
    let Some(policy) = policy else {
        writeln!(writer, "  {} no policy loaded", "Error:".red()).ok();
        return;
    };
    let total = args.first().and_then(|a| a.parse::<u8>().ok());
    let upcard = args.get(1).and_then(|a| parse_rank(a));
    let (Some(total), Some(upcard)) = (total, upcard) else {
        writeln!(writer, "  usage: advise <total> <upcard> [soft]").ok();
        return;
    };
    if !(4..=BLACKJACK).contains(&total) || !(1..=NUM_UPCARDS as u8).contains(&upcard) {
        writeln!(writer, "  usage: advise <total> <upcard> [soft]").ok();
        return;
    }
    let obs = Observation {
        player_total: total,
        dealer_upcard: upcard,
        usable_ace: args.get(2).is_some_and(|a| a.eq_ignore_ascii_case("soft")),
        temperature: Some(tracker.temperature()),
    };
    writeln!(writer, "  {}  {}", styled_action(policy.action_for(&obs)), obs).ok();
}
