use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::composition::DeckCompositionTable;
use crate::config::{SamplerConfig, SearchConfig, SolverConfig, SweepMode, TableConfig};
use crate::dealer::dealer_table;
use crate::display::{
    composition_table, dealer_odds_table, harness_table, pct, policy_grid, print_action,
    print_error, print_success, search_table, signed_value,
};
use crate::env::{BlackjackTable, Environment};
use crate::harness::{evaluate_policy, evaluate_search};
use crate::mcts::TreeSearchSolver;
use crate::state::NUM_TEMPERATURES;
use crate::track::track_command;
use crate::value_iteration::{Solution, ValueIterationSolver};

#[derive(Parser)]
#[command(name = "bj", version = "1.0.0", about = "Blackjack hit/stand solver with deck-temperature counting.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SweepArg {
    #[value(name = "in-place")]
    InPlace,
    #[value(name = "synchronous")]
    Synchronous,
}

impl SweepArg {
    fn mode(self) -> SweepMode {
        match self {
            SweepArg::InPlace => SweepMode::InPlace,
            SweepArg::Synchronous => SweepMode::Synchronous,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Player {
    /// Follow a solved policy
    Policy,
    /// Tree search for every decision
    Search,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a solver and save its artifacts
    Solve {
        #[command(subcommand)]
        solver: SolverCommands,
    },
    /// Show the dealer's terminal-total odds for every upcard
    Dealer {
        /// Dealer counts an ace as 11 and stands on soft 17
        #[arg(long)]
        soft17: bool,
        /// Composition table; without it cards are drawn with infinite-deck odds
        #[arg(long)]
        table: Option<PathBuf>,
        /// Temperature bucket to read from the table (0-9)
        #[arg(short, long, default_value = "0")]
        temp: u8,
    },
    /// Print the hit/stand charts of a saved solution
    Show {
        /// Solution directory
        #[arg(default_value = "solution")]
        dir: PathBuf,
        /// Temperature bucket (counting solutions only)
        #[arg(short, long, default_value = "0")]
        temp: u8,
    },
    /// Track the count at a live table, card by card
    Track {
        /// Decks in the shoe
        #[arg(short, long, default_value = "6")]
        decks: u32,
        /// Solution directory used by `advise`
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Deal one round and search the first decision
    Search {
        /// Playouts per decision [default: 1000]
        #[arg(short, long)]
        iterations: Option<usize>,
        /// UCT exploration constant [default: 1.41]
        #[arg(short = 'c', long)]
        exploration: Option<f64>,
        /// Search seed [default: 0]
        #[arg(long)]
        seed: Option<u64>,
        /// Seed of the shoe the round is dealt from
        #[arg(long, default_value = "0")]
        deal_seed: u64,
        /// Decks in the shoe
        #[arg(short, long, default_value = "6")]
        decks: u32,
        /// Search config file (JSON); flags above override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Play many rounds and report wins, losses and net return
    Evaluate {
        /// Who makes the decisions
        #[arg(long, value_enum, default_value = "policy")]
        player: Player,
        /// Solution directory (policy player)
        #[arg(long, default_value = "solution")]
        policy: PathBuf,
        /// Rounds to play
        #[arg(short = 'n', long, default_value = "100000")]
        episodes: usize,
        /// Decks in the shoe
        #[arg(short, long, default_value = "6")]
        decks: u32,
        /// Fraction of the shoe dealt before a reshuffle
        #[arg(long, default_value = "0.7")]
        penetration: f64,
        /// A winning natural pays 3:2
        #[arg(long)]
        natural_bonus: bool,
        /// Table seed
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Playouts per decision (search player)
        #[arg(short, long, default_value = "200")]
        iterations: usize,
    },
}

#[derive(Subcommand)]
enum SolverCommands {
    /// Value iteration over the full state space
    Policy {
        /// Add the temperature axis (needs --table)
        #[arg(long)]
        counting: bool,
        /// Composition table from `solve composition`
        #[arg(long)]
        table: Option<PathBuf>,
        /// A winning natural pays 3:2
        #[arg(long)]
        natural_bonus: bool,
        /// Dealer counts an ace as 11 and stands on soft 17
        #[arg(long)]
        soft17: bool,
        /// Convergence threshold
        #[arg(long)]
        theta: Option<f64>,
        /// Sweep cap
        #[arg(long)]
        max_sweeps: Option<usize>,
        /// Update order of a sweep
        #[arg(long, value_enum)]
        sweep: Option<SweepArg>,
        /// Solver config file (JSON); flags above override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "solution")]
        out: PathBuf,
    },
    /// Estimate the per-temperature card odds by dealing shoes
    Composition {
        /// Decks in the shoe
        #[arg(short, long, default_value = "6")]
        decks: u32,
        /// Fraction of each shoe dealt before it is replaced
        #[arg(long, default_value = "0.7")]
        penetration: f64,
        /// Cards to draw in total
        #[arg(short = 'n', long, default_value = "1000000")]
        draws: u64,
        /// Sampler seed
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Independently seeded shoes dealt in parallel
        #[arg(long, default_value = "16")]
        chunks: usize,
        /// Output file
        #[arg(short, long, default_value = "composition.bin")]
        out: PathBuf,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

pub fn run_with_args(args: Vec<String>) {
    let cli = Cli::parse_from(args);
    dispatch(cli);
}

fn dispatch(cli: Cli) {
    match cli.command {
        Commands::Solve { solver } => match solver {
            SolverCommands::Policy {
                counting,
                table,
                natural_bonus,
                soft17,
                theta,
                max_sweeps,
                sweep,
                config,
                out,
            } => {
                let base = match config {
                    Some(path) => match SolverConfig::load(&path) {
                        Ok(c) => c,
                        Err(e) => {
                            print_error(&format!("Failed to load {}: {}", path.display(), e));
                            return;
                        }
                    },
                    None => SolverConfig::default(),
                };
                let config = SolverConfig {
                    counting_enabled: base.counting_enabled || counting,
                    natural_bonus: base.natural_bonus || natural_bonus,
                    dealer_soft_stand_17: base.dealer_soft_stand_17 || soft17,
                    theta: theta.unwrap_or(base.theta),
                    max_sweeps: max_sweeps.unwrap_or(base.max_sweeps),
                    sweep: sweep.map(SweepArg::mode).unwrap_or(base.sweep),
                };
                cmd_solve_policy(config, table, out);
            }
            SolverCommands::Composition {
                decks,
                penetration,
                draws,
                seed,
                chunks,
                out,
            } => cmd_solve_composition(
                SamplerConfig {
                    decks,
                    penetration,
                    draws,
                    seed,
                    chunks,
                },
                out,
            ),
        },
        Commands::Dealer { soft17, table, temp } => cmd_dealer(soft17, table, temp),
        Commands::Show { dir, temp } => cmd_show(dir, temp),
        Commands::Track { decks, policy } => cmd_track(decks, policy),
        Commands::Search {
            iterations,
            exploration,
            seed,
            deal_seed,
            decks,
            config,
        } => {
            let base = match config {
                Some(path) => match SearchConfig::load(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        print_error(&format!("Failed to load {}: {}", path.display(), e));
                        return;
                    }
                },
                None => SearchConfig::default(),
            };
            let config = SearchConfig {
                iterations: iterations.unwrap_or(base.iterations),
                exploration: exploration.unwrap_or(base.exploration),
                seed: seed.unwrap_or(base.seed),
            };
            cmd_search(config, decks, deal_seed);
        }
        Commands::Evaluate {
            player,
            policy,
            episodes,
            decks,
            penetration,
            natural_bonus,
            seed,
            iterations,
        } => {
            let table = TableConfig {
                decks,
                penetration,
                natural_bonus,
                counting: true,
            };
            cmd_evaluate(player, policy, episodes, table, seed, iterations);
        }
    }
}

fn load_table(path: Option<PathBuf>) -> Option<DeckCompositionTable> {
    let path = path?;
    match DeckCompositionTable::load(&path) {
        Ok(t) => Some(t),
        Err(e) => {
            print_error(&format!("Failed to load table {}: {}", path.display(), e));
            None
        }
    }
}

fn cmd_solve_policy(config: SolverConfig, table_path: Option<PathBuf>, out: PathBuf) {
    if let Err(e) = config.validate() {
        print_error(&e.to_string());
        return;
    }
    let table = match (config.counting_enabled, table_path) {
        (true, None) => {
            print_error("Counting needs a composition table (--table). Build one with `bj solve composition`.");
            return;
        }
        (true, path) => match load_table(path) {
            Some(t) => Some(t),
            None => return,
        },
        (false, _) => None,
    };

    println!();
    println!(
        "  {} Value iteration | counting: {} | natural bonus: {} | dealer: {} | {} sweeps | theta {}",
        "BJ".bold(),
        config.counting_enabled,
        config.natural_bonus,
        config.dealer_rule().as_str(),
        config.sweep.as_str(),
        config.theta,
    );
    println!();

    let mut solver = match ValueIterationSolver::new(config, table.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    let start = Instant::now();
    let result = solver.solve_with_progress(|sweep, delta| {
        println!("  [sweep {:>3}] delta {:.3e}", sweep, delta);
    });
    let solution = match result {
        Ok(s) => s,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    println!();
    println!(
        "  Converged in {} sweeps ({:.2}s), final delta {:.3e}",
        solution.sweeps.to_string().bold(),
        start.elapsed().as_secs_f64(),
        solution.final_delta,
    );
    println!();
    print_solution(&solution, 0);

    match solution.save(&out) {
        Ok(()) => {
            println!();
            println!("  Solution saved to {}", out.display().to_string().dimmed());
            println!(
                "  Use {} to replay it.",
                format!("bj evaluate --policy {}", out.display()).bold()
            );
        }
        Err(e) => print_error(&format!("Failed to save solution: {}", e)),
    }
    println!();
}

fn print_solution(solution: &Solution, temperature: u8) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Temp".bold().to_string()),
        Cell::new("Round EV").set_alignment(CellAlignment::Right),
    ]);
    for (t, &v) in solution.opening_values.iter().enumerate() {
        table.add_row(vec![
            Cell::new(t),
            Cell::new(signed_value(v)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);
    println!(
        "  {} of {} states hit",
        solution.policy.hit_count(),
        solution.policy.space().len()
    );
    println!();

    let suffix = if solution.config.counting_enabled {
        format!(" (temperature {})", temperature)
    } else {
        String::new()
    };
    println!(
        "{}",
        policy_grid(&solution.policy, false, temperature, &format!("Hard totals{}", suffix))
    );
    println!();
    println!(
        "{}",
        policy_grid(&solution.policy, true, temperature, &format!("Soft totals{}", suffix))
    );
}

fn cmd_solve_composition(config: SamplerConfig, out: PathBuf) {
    if let Err(e) = config.validate() {
        print_error(&e.to_string());
        return;
    }

    println!();
    println!(
        "  {} Sampling {} draws | {} decks | {:.0}% penetration | {} chunks | seed {}",
        "BJ".bold(),
        config.draws,
        config.decks,
        config.penetration * 100.0,
        config.chunks,
        config.seed,
    );

    let start = Instant::now();
    let estimate = match DeckCompositionTable::estimate(&config) {
        Ok(e) => e,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    println!("  Done in {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!(
        "{}",
        composition_table(&estimate.table, Some(&estimate.bucket_draws[..]))
    );

    match estimate.table.save(&out) {
        Ok(()) => {
            println!();
            println!("  Table saved to {}", out.display().to_string().dimmed());
        }
        Err(e) => print_error(&format!("Failed to save table: {}", e)),
    }
    println!();
}

fn cmd_dealer(soft17: bool, table_path: Option<PathBuf>, temp: u8) {
    if temp as usize >= NUM_TEMPERATURES {
        print_error(&format!("Temperature must be 0-{}", NUM_TEMPERATURES - 1));
        return;
    }
    let has_table = table_path.is_some();
    let table = match load_table(table_path) {
        Some(t) => t,
        None if has_table => return,
        None => DeckCompositionTable::uniform(),
    };
    let config = SolverConfig {
        dealer_soft_stand_17: soft17,
        ..SolverConfig::default()
    };
    let rule = config.dealer_rule();

    let outcomes = match dealer_table(table.row(temp), rule) {
        Ok(o) => o,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    println!();
    let source = if has_table {
        format!("temperature {}", temp)
    } else {
        "infinite deck".to_string()
    };
    println!("  {} Dealer outcomes | {} | {}", "BJ".bold(), rule.as_str(), source);
    println!();
    println!("{}", dealer_odds_table(&outcomes));
    println!();
}

fn cmd_show(dir: PathBuf, temp: u8) {
    let solution = match Solution::load(&dir) {
        Ok(s) => s,
        Err(e) => {
            print_error(&format!("Failed to load solution from {}: {}", dir.display(), e));
            return;
        }
    };
    let temps = solution.policy.space().temperatures();
    if temp as usize >= temps {
        print_error(&format!("Temperature must be below {}", temps));
        return;
    }
    println!();
    println!(
        "  {} {} | {} sweeps | dealer: {}",
        "BJ".bold(),
        dir.display(),
        solution.sweeps,
        solution.config.dealer_rule().as_str(),
    );
    println!();
    print_solution(&solution, temp);
    println!();
}

fn cmd_track(decks: u32, policy_dir: Option<PathBuf>) {
    if decks == 0 {
        print_error("The shoe needs at least one deck");
        return;
    }
    let policy = match policy_dir {
        Some(dir) => match Solution::load(&dir) {
            Ok(s) if s.policy.space().is_counting() => Some(s.policy),
            Ok(s) => {
                println!(
                    "  {} policy has no temperature axis; advice ignores the count",
                    "Note:".yellow()
                );
                Some(s.policy)
            }
            Err(e) => {
                print_error(&format!("Failed to load solution from {}: {}", dir.display(), e));
                return;
            }
        },
        None => None,
    };
    track_command(decks, policy);
}

fn cmd_search(config: SearchConfig, decks: u32, deal_seed: u64) {
    let table_config = TableConfig {
        decks,
        ..TableConfig::default()
    };
    let mut env = match BlackjackTable::new(table_config, deal_seed) {
        Ok(e) => e,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    let mut solver = match TreeSearchSolver::new(config) {
        Ok(s) => s,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    let root = env.reset();
    println!();
    println!(
        "  {} Dealt {} | {} playouts, C = {}",
        "BJ".bold(),
        root.to_string().bold(),
        solver.config().iterations,
        solver.config().exploration,
    );

    let start = Instant::now();
    match solver.search(&env, root) {
        Ok(outcome) => {
            println!("  Searched {} nodes in {:.2}s", outcome.nodes, start.elapsed().as_secs_f64());
            println!();
            println!("{}", search_table(&outcome));
            println!();
            print_action(outcome.action, "");
        }
        Err(e) => print_error(&e.to_string()),
    }
    println!();
}

fn cmd_evaluate(
    player: Player,
    policy_dir: PathBuf,
    episodes: usize,
    table: TableConfig,
    seed: u64,
    iterations: usize,
) {
    if episodes == 0 {
        print_error("Need at least one episode");
        return;
    }
    let mut env = match BlackjackTable::new(table, seed) {
        Ok(e) => e,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    println!();
    let start = Instant::now();
    let result = match player {
        Player::Policy => {
            let solution = match Solution::load(&policy_dir) {
                Ok(s) => s,
                Err(e) => {
                    print_error(&format!(
                        "Failed to load solution from {}: {}",
                        policy_dir.display(),
                        e
                    ));
                    return;
                }
            };
            println!(
                "  {} Evaluating {} over {} rounds",
                "BJ".bold(),
                policy_dir.display(),
                episodes
            );
            evaluate_policy(&mut env, &solution.policy, episodes, None)
        }
        Player::Search => {
            let config = SearchConfig {
                iterations,
                seed,
                ..SearchConfig::default()
            };
            let mut solver = match TreeSearchSolver::new(config) {
                Ok(s) => s,
                Err(e) => {
                    print_error(&e.to_string());
                    return;
                }
            };
            println!(
                "  {} Evaluating tree search ({} playouts) over {} rounds",
                "BJ".bold(),
                iterations,
                episodes
            );
            evaluate_search(&mut env, &mut solver, episodes, None)
        }
    };

    match result {
        Ok(report) => {
            println!("  Done in {:.2}s", start.elapsed().as_secs_f64());
            println!();
            println!("{}", harness_table(&report));
            println!();
            print_success(&format!("Win rate {}", pct(report.win_rate())));
        }
        Err(e) => print_error(&e.to_string()),
    }
    println!();
}
