//! Game layer for Watopoly.
//!
//! Implements the board game rules as a pure state machine:
//! - The 40-square board with titles, mortgages, and improvements
//! - Players with money, position, jail status, and cups
//! - Rent, purchases, auctions, and two-party trades
//! - Enforced payments with liquidation and bankruptcy
//! - One turn at a time, suspended on typed decision requests

mod auction;
mod board;
mod economy;
mod invariants;
mod landing;
mod player;
mod rent;
mod solvency;
mod state;
mod turn;

pub use auction::{Auction, AuctionOutcome, BidOutcome};
pub use board::{
    Block, Board, Square, SquareKind, BOARD_SIZE, GYM_PRICE, JAIL_POSITION, MAX_IMPROVEMENTS,
    RESIDENCE_PRICE,
};
pub use economy::{
    degrade, improve, mortgage, net_worth, propose_trade, respond_trade, unmortgage,
    unmortgage_cost, TradeOffer, TradeSide, UNMORTGAGE_PREMIUM_PERCENT,
};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use landing::{resolve_landing, Landing, COOP_FEE, TUITION_FLAT, TUITION_PERCENT};
pub use player::{token_name, Money, Player, Token, STARTING_MONEY, TOKENS};
pub use rent::{academic_rent, gym_rent, rent_due, residence_rent};
pub use solvency::{
    enforce_payment, transfer_estate, DebtOutcome, Liquidation, LiquidationAction, PaymentStatus,
    MORTGAGE_INTEREST_PERCENT,
};
pub use state::{GameState, MAX_CUPS, MAX_PLAYERS, MIN_PLAYERS};
pub use turn::{
    Decision, DecisionRequest, JailRelease, Step, Turn, TurnEvent, TurnReport, JAIL_FEE,
    JAIL_ROLL_ATTEMPTS, PASS_BONUS,
};
