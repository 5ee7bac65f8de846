//! Output formatting utilities for CLI.

// Percentage displays cast game counters on purpose
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;
use watopoly::sim::BatchStats;

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Total games simulated.
    games: u64,
    /// Per-seat statistics.
    seats: Vec<JsonSeatResult>,
    /// Games that hit the turn cap with no winner.
    draws: u64,
    /// Games that failed to finish.
    failures: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-seat batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonSeatResult {
    /// Seat index (1-based).
    seat: usize,
    /// Policy label.
    policy: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final net worth.
    avg_worth: f64,
}

impl JsonBatchResult {
    /// Create from stats and seat labels.
    pub(super) fn from_stats(stats: &BatchStats, seat_names: &[String]) -> Self {
        let seats = (0..seat_names.len())
            .map(|i| JsonSeatResult {
                seat: i + 1,
                policy: seat_names.get(i).cloned().unwrap_or_default(),
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                avg_worth: stats.avg_worth(i),
            })
            .collect();

        Self {
            games: stats.games,
            seats,
            draws: stats.draws,
            failures: stats.failures,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format batch stats as human-readable text.
pub(super) fn format_batch_text(stats: &BatchStats, seat_names: &[String]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Simulation Results ({} games)\n", stats.games));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, name) in seat_names.iter().enumerate() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let rate = stats.win_rate(i) * 100.0;
        output.push_str(&format!(
            "  Seat {} ({}): {:.1}% ({} wins)\n",
            i + 1,
            name,
            rate,
            wins
        ));
    }
    if stats.games > 0 {
        output.push_str(&format!(
            "  Draws: {} ({:.1}%)\n",
            stats.draws,
            (stats.draws as f64 / stats.games as f64) * 100.0
        ));
    } else {
        output.push_str(&format!("  Draws: {}\n", stats.draws));
    }
    if stats.failures > 0 {
        output.push_str(&format!("  Failed games: {}\n", stats.failures));
    }
    output.push('\n');

    output.push_str("Average Final Net Worth:\n");
    for (i, name) in seat_names.iter().enumerate() {
        output.push_str(&format!(
            "  Seat {} ({}): ${:.0}\n",
            i + 1,
            name,
            stats.avg_worth(i)
        ));
    }

    output.push_str(&format!(
        "\nAverage Game Length: {:.0} turns\n",
        stats.avg_turns()
    ));

    output
}
