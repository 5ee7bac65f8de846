// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Watopoly: a deterministic property-trading board game engine.
//!
//! This crate provides a turn-based board game engine designed for:
//! - Bit-exact deterministic play from a seed
//! - Explicit decision suspension points instead of callbacks
//! - Batch simulation across many independent games
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     CLI / Batch Simulation          │
//! ├─────────────────────────────────────┤
//! │   Turn Engine (decision protocol)   │
//! ├─────────────────────────────────────┤
//! │  Board · Players · Rent · Economy   │
//! └─────────────────────────────────────┘
//! ```
//!
//! The engine never blocks on input. [`game::Turn::begin`] plays a turn
//! forward until it either completes or needs a choice, in which case it
//! hands back a [`game::DecisionRequest`]; the driver answers through
//! [`game::Turn::resume`]. Everything else (rendering, persistence,
//! policies) sits on top of that loop.

pub mod error;
pub mod game;
pub mod render;
pub mod save;
pub mod sim;

pub use error::{GameError, GameResult};

// Re-export key game types at crate root for convenience
pub use game::{
    Decision, DecisionRequest, GameState, Money, Player, Square, Step, Token, Turn, TurnReport,
};
