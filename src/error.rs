//! Error types for the game engine.

use std::fmt;

use crate::game::Money;

/// Why a requested operation was declined or could not be addressed.
///
/// Validation failures leave the game state untouched: the operation is
/// refused, nothing else changes. Inability to pay an enforced debt is not
/// represented here because it is not an error; it routes into the
/// liquidation flow instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// No ownable property with this name exists on the board.
    UnknownProperty(String),
    /// No player with this token is in the game.
    UnknownPlayer(char),
    /// The token is not one of the eight playing pieces.
    InvalidToken(char),
    /// Two players picked the same token.
    DuplicateToken(char),
    /// Games take two to eight players.
    PlayerCount(usize),
    /// Board positions are 0..=39.
    PositionOutOfRange(u8),
    /// The player has already gone bankrupt and left the game.
    PlayerBankrupt(char),
    /// The acting player does not own the property.
    NotOwner {
        /// Property the operation targeted.
        property: String,
        /// Token of the player who attempted it.
        token: char,
    },
    /// The player cannot cover a voluntary cost.
    InsufficientFunds {
        /// Cost of the operation.
        needed: Money,
        /// Cash the player actually has.
        available: Money,
    },
    /// Improving requires owning the whole block, all of it unmortgaged.
    MissingMonopoly(String),
    /// The building already has the maximum number of improvements.
    MaxImprovements(String),
    /// The building has no improvements to sell.
    NoImprovements(String),
    /// Residences and gyms cannot take improvements.
    NotImprovable(String),
    /// The property is mortgaged and the operation requires clear title.
    Mortgaged(String),
    /// The property is not mortgaged.
    NotMortgaged(String),
    /// A building in the property's block still carries improvements.
    BlockHasImprovements(String),
    /// Both sides of a trade belong to the same player.
    TradeWithSelf,
    /// Money amounts supplied to an operation must be non-negative.
    NegativeAmount(Money),
    /// Auction raises must strictly exceed the standing high bid.
    BidTooLow {
        /// The standing high bid.
        high_bid: Money,
    },
    /// The player has no Roll Up the Rim cup to use.
    NoCups(char),
    /// The supplied decision does not answer the pending request.
    DecisionMismatch,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            GameError::UnknownPlayer(token) => write!(f, "unknown player: {token}"),
            GameError::InvalidToken(token) => {
                write!(f, "invalid token: {token} (pick one of G B D P S $ L T)")
            }
            GameError::DuplicateToken(token) => write!(f, "token {token} is already taken"),
            GameError::PlayerCount(count) => {
                write!(f, "invalid player count: {count} (need 2 to 8)")
            }
            GameError::PositionOutOfRange(pos) => write!(f, "position out of range: {pos}"),
            GameError::PlayerBankrupt(token) => write!(f, "player {token} is bankrupt"),
            GameError::NotOwner { property, token } => {
                write!(f, "player {token} does not own {property}")
            }
            GameError::InsufficientFunds { needed, available } => {
                write!(f, "insufficient funds: need ${needed}, have ${available}")
            }
            GameError::MissingMonopoly(name) => {
                write!(f, "{name}: the whole block must be owned and unmortgaged")
            }
            GameError::MaxImprovements(name) => {
                write!(f, "{name} already has the maximum number of improvements")
            }
            GameError::NoImprovements(name) => write!(f, "{name} has no improvements"),
            GameError::NotImprovable(name) => write!(f, "{name} cannot take improvements"),
            GameError::Mortgaged(name) => write!(f, "{name} is mortgaged"),
            GameError::NotMortgaged(name) => write!(f, "{name} is not mortgaged"),
            GameError::BlockHasImprovements(name) => {
                write!(f, "{name}: a building in its block still has improvements")
            }
            GameError::TradeWithSelf => write!(f, "cannot trade with yourself"),
            GameError::NegativeAmount(amount) => {
                write!(f, "amounts must be non-negative, got {amount}")
            }
            GameError::BidTooLow { high_bid } => {
                write!(f, "bid must exceed the standing high bid of ${high_bid}")
            }
            GameError::NoCups(token) => {
                write!(f, "player {token} has no Roll Up the Rim cup")
            }
            GameError::DecisionMismatch => {
                write!(f, "decision does not match the pending request")
            }
        }
    }
}

impl std::error::Error for GameError {}

/// Result type for engine operations.
pub type GameResult<T> = Result<T, GameError>;
