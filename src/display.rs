use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::composition::DeckCompositionTable;
use crate::dealer::{DealerOutcomes, DEALER_STAND};
use crate::harness::HarnessReport;
use crate::mcts::SearchOutcome;
use crate::policy::Policy;
use crate::state::{Action, State, BLACKJACK, NUM_TEMPERATURES};

/// Upcards in the order a basic-strategy chart lists them.
const GRID_UPCARDS: [u8; 10] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 1];

pub fn card_label(rank: u8) -> String {
    match rank {
        1 => "A".to_string(),
        r => r.to_string(),
    }
}

/// Hit/stand chart for one ace class at one temperature.
pub fn policy_grid(policy: &Policy, usable_ace: bool, temperature: u8, title: &str) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("")];
    for &u in &GRID_UPCARDS {
        header.push(Cell::new(card_label(u)).set_alignment(CellAlignment::Center));
    }
    table.set_header(header);

    // A soft hand holds an ace counted 11 plus at least one more card.
    let lowest = if usable_ace { 12 } else { 4 };
    for total in lowest..=BLACKJACK {
        let label = if usable_ace {
            format!("A{}", total - 11)
        } else {
            total.to_string()
        };
        let mut row = vec![Cell::new(label.bold().to_string())];
        for &u in &GRID_UPCARDS {
            let action = policy.action(State::new(total, u, usable_ace, temperature));
            row.push(Cell::new(action_letter(action)).set_alignment(CellAlignment::Center));
        }
        table.add_row(row);
    }

    format!("  {}\n{}", title.bold(), table)
}

fn action_letter(action: Action) -> String {
    match action {
        Action::Hit => "H".red().bold().to_string(),
        Action::Stand => "S".green().bold().to_string(),
    }
}

pub fn styled_action(action: Action) -> String {
    match action {
        Action::Hit => action.as_str().red().bold().to_string(),
        Action::Stand => action.as_str().green().bold().to_string(),
    }
}

pub fn print_action(action: Action, detail: &str) {
    let styled = styled_action(action);
    if detail.is_empty() {
        println!("  {}", styled);
    } else {
        println!("  {}  {}", styled, detail);
    }
}

pub fn signed_value(value: f64) -> String {
    let text = format!("{:+.4}", value);
    if value >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

pub fn pct(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Terminal-total distribution for every upcard.
pub fn dealer_odds_table(outcomes: &[DealerOutcomes]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Upcard")];
    for total in DEALER_STAND..=BLACKJACK {
        header.push(Cell::new(total).set_alignment(CellAlignment::Right));
    }
    header.push(Cell::new("Bust").set_alignment(CellAlignment::Right));
    table.set_header(header);

    for d in outcomes {
        let mut row = vec![Cell::new(card_label(d.upcard()).bold().to_string())];
        for &p in d.totals() {
            row.push(Cell::new(pct(p)).set_alignment(CellAlignment::Right));
        }
        row.push(Cell::new(pct(d.bust()).yellow().to_string()).set_alignment(CellAlignment::Right));
        table.add_row(row);
    }

    table.to_string()
}

/// Per-bucket draw odds, optionally with how many samples backed each row.
pub fn composition_table(table_data: &DeckCompositionTable, bucket_draws: Option<&[u64]>) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Temp")];
    for rank in 1..=10u8 {
        header.push(Cell::new(card_label(rank)).set_alignment(CellAlignment::Right));
    }
    if bucket_draws.is_some() {
        header.push(Cell::new("Draws").set_alignment(CellAlignment::Right));
    }
    table.set_header(header);

    for t in 0..NUM_TEMPERATURES as u8 {
        let mut row = vec![Cell::new(t.to_string().bold().to_string())];
        for (_, p) in table_data.row(t).iter() {
            row.push(Cell::new(format!("{:.4}", p)).set_alignment(CellAlignment::Right));
        }
        if let Some(draws) = bucket_draws {
            row.push(
                Cell::new(draws[t as usize].to_string().dimmed().to_string())
                    .set_alignment(CellAlignment::Right),
            );
        }
        table.add_row(row);
    }

    table.to_string()
}

pub fn search_table(outcome: &SearchOutcome) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Action"),
        Cell::new("Visits").set_alignment(CellAlignment::Right),
        Cell::new("Mean").set_alignment(CellAlignment::Right),
    ]);

    let mut children = outcome.children.clone();
    children.sort_by_key(|c| c.action);
    for c in &children {
        let name = if c.action == outcome.action {
            styled_action(c.action)
        } else {
            c.action.as_str().dimmed().to_string()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(c.visits).set_alignment(CellAlignment::Right),
            Cell::new(signed_value(c.mean)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

pub fn harness_table(report: &HarnessReport) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric").set_alignment(CellAlignment::Left),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);

    let share = |n: usize| {
        if report.episodes == 0 {
            0.0
        } else {
            n as f64 / report.episodes as f64
        }
    };

    table.add_row(vec![
        Cell::new("Episodes".bold().to_string()),
        Cell::new(report.episodes),
    ]);
    table.add_row(vec![
        Cell::new("Wins".bold().to_string()),
        Cell::new(format!("{} ({})", report.wins, pct(share(report.wins)))),
    ]);
    table.add_row(vec![
        Cell::new("Losses".bold().to_string()),
        Cell::new(format!("{} ({})", report.losses, pct(share(report.losses)))),
    ]);
    table.add_row(vec![
        Cell::new("Draws".bold().to_string()),
        Cell::new(format!("{} ({})", report.draws, pct(share(report.draws)))),
    ]);
    table.add_row(vec![
        Cell::new("Net".bold().to_string()),
        Cell::new(signed_value(report.net)),
    ]);
    table.add_row(vec![
        Cell::new("Per episode".bold().to_string()),
        Cell::new(signed_value(report.mean_return())),
    ]);

    table.to_string()
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
