//! Sim command implementation.

// Seed derivation and games/sec display cast on purpose
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use super::output::{format_batch_text, JsonBatchResult};
use super::{CliError, PolicyName, SimFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use watopoly::sim::{run_batch, SimConfig};

/// Execute the sim command.
///
/// # Errors
///
/// Returns an error if the batch fails to run.
pub(crate) fn execute(
    policies: Vec<PolicyName>,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_turns: Option<u32>,
    format: SimFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    // Base seed
    let base_seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });

    // Config
    let seats: Vec<_> = policies.iter().map(|p| p.to_kind()).collect();
    let seat_names: Vec<String> = seats
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("{}{}", kind.name(), i + 1))
        .collect();
    let mut config = SimConfig::new(seats);
    if let Some(t) = max_turns {
        config.max_turns = t;
    }

    // Progress bar
    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
                .expect("valid template")
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Run the batch; per-game parallelism lives in the library
    let stats = run_batch(&config, base_seed, games)?;

    // Update progress bar after completion (no atomic overhead in hot path)
    if let Some(pb) = pb {
        pb.set_position(stats.games);
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    // Calculate games per second
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    // Output based on format
    match format {
        SimFormat::Text => {
            println!();
            print!("{}", format_batch_text(&stats, &seat_names));
            println!();
            println!(
                "Duration: {:.2}s ({:.0} games/sec)",
                duration.as_secs_f64(),
                games_per_sec
            );
        }
        SimFormat::Json => {
            let json_result = JsonBatchResult::from_stats(&stats, &seat_names);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
