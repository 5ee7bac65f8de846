//! Watopoly CLI - Command-line interface for playing and simulating Watopoly.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Watopoly - A campus property trading game
#[derive(Parser, Debug)]
#[command(name = "watopoly")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play an interactive game on stdin/stdout
    Play {
        /// Resume from a save file instead of starting fresh
        #[arg(short, long)]
        load: Option<std::path::PathBuf>,

        /// Testing mode: roll accepts explicit dice values
        #[arg(short, long)]
        testing: bool,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run scripted games in parallel and aggregate statistics
    Sim {
        /// Seat policies, one per player (2-8 seats required)
        #[arg(required = true, num_args = 2..=8)]
        policies: Vec<cli::PolicyName>,

        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum turns per game (default: 1000)
        #[arg(short = 't', long)]
        max_turns: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::SimFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Play {
            load,
            testing,
            seed,
        } => cli::play::execute(load, testing, seed),

        Commands::Sim {
            policies,
            games,
            seed,
            threads,
            max_turns,
            format,
            progress,
        } => cli::sim::execute(policies, games, seed, threads, max_turns, format, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
