//! End-to-end runs of the `bj` subcommands through `run_with_args`.

use std::path::PathBuf;

use bj_solver::cli::run_with_args;
use bj_solver::composition::DeckCompositionTable;
use bj_solver::value_iteration::{Solution, POLICY_FILE, REPORT_FILE, VALUES_FILE};

fn tmp(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bj_cli_{}_{}", std::process::id(), name))
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn dealer_command_runs() {
    run_with_args(args(&["bj", "dealer"]));
    run_with_args(args(&["bj", "dealer", "--soft17"]));
}

#[test]
fn solve_then_show() {
    let dir = tmp("solution");
    let out = dir.to_string_lossy().to_string();
    run_with_args(args(&["bj", "solve", "policy", "--out", &out]));

    for file in [POLICY_FILE, VALUES_FILE, REPORT_FILE] {
        assert!(dir.join(file).exists(), "missing {}", file);
    }
    let solution = Solution::load(&dir).unwrap();
    assert!(!solution.config.counting_enabled);
    assert!(solution.policy.hit_count() > 0);

    run_with_args(args(&["bj", "show", &out]));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn composition_then_counting_solve() {
    let table_path = tmp("composition.bin");
    let dir = tmp("counting");
    let table_arg = table_path.to_string_lossy().to_string();
    let out = dir.to_string_lossy().to_string();

    run_with_args(args(&[
        "bj", "solve", "composition", "-n", "100000", "--chunks", "4", "--out", &table_arg,
    ]));
    assert!(DeckCompositionTable::load(&table_path).is_ok());

    run_with_args(args(&[
        "bj", "solve", "policy", "--counting", "--table", &table_arg, "--out", &out,
    ]));
    let solution = Solution::load(&dir).unwrap();
    assert!(solution.policy.space().is_counting());
    assert_eq!(solution.opening_values.len(), 10);

    std::fs::remove_file(&table_path).ok();
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn counting_without_table_writes_nothing() {
    let dir = tmp("no_table");
    let out = dir.to_string_lossy().to_string();
    run_with_args(args(&["bj", "solve", "policy", "--counting", "--out", &out]));
    assert!(!dir.exists());
}

#[test]
fn search_command_runs() {
    run_with_args(args(&["bj", "search", "-i", "50", "--deal-seed", "3"]));
}
