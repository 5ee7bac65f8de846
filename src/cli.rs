//! CLI command implementations for Watopoly.

pub(crate) mod play;
pub(crate) mod sim;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use watopoly::sim::PolicyKind;

/// Seat policy for the `sim` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolicyName {
    /// Buys whatever it can afford and bids up to half its cash.
    Greedy,
    /// Never volunteers money for property.
    Frugal,
}

impl PolicyName {
    /// The library policy this name selects.
    pub(crate) const fn to_kind(self) -> PolicyKind {
        match self {
            Self::Greedy => PolicyKind::Greedy,
            Self::Frugal => PolicyKind::Frugal,
        }
    }
}

/// Output format for the `sim` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SimFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<watopoly::GameError> for CliError {
    fn from(e: watopoly::GameError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<watopoly::save::SaveError> for CliError {
    fn from(e: watopoly::save::SaveError) -> Self {
        Self::new(e.to_string())
    }
}
