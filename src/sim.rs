//! Scripted batch simulation.
//!
//! Runs complete games under scripted decision policies, either one at a
//! time or in parallel across games with `rayon`. A single game is
//! strictly sequential; parallelism exists only between independent
//! games, each with its own seed derived from the base seed.
//!
//! The [`Policy`] trait is the seam: anything that can answer a
//! [`DecisionRequest`] can drive a seat, so the same loop serves the
//! built-in policies here and custom ones from callers.

use crate::error::{GameError, GameResult};
use crate::game::{
    net_worth, Decision, DecisionRequest, GameState, LiquidationAction, Money, Step, Token, Turn,
    MAX_PLAYERS, MIN_PLAYERS, TOKENS,
};
use rayon::prelude::*;

/// Turn cap for scripted games; hitting it ends the game in a draw.
pub const DEFAULT_MAX_TURNS: u32 = 1_000;

/// How much a greedy bidder raises over the standing high bid.
const AUCTION_RAISE: Money = 10;

/// A scripted decision maker driving one seat.
pub trait Policy {
    /// Answer a pending decision request.
    fn decide(&mut self, state: &GameState, request: &DecisionRequest) -> Decision;
}

/// Buys whatever it can afford and bids up to half its cash.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

/// Never volunteers money for property; only pays what it must.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrugalPolicy;

impl Policy for GreedyPolicy {
    fn decide(&mut self, state: &GameState, request: &DecisionRequest) -> Decision {
        match *request {
            DecisionRequest::JailChoice {
                cup_available,
                fee_affordable,
                ..
            } => {
                if cup_available {
                    Decision::UseCup
                } else if fee_affordable {
                    Decision::PayJailFee
                } else {
                    Decision::RollForRelease
                }
            }
            DecisionRequest::Purchase { token, price, .. } => {
                if money_of(state, token) >= price {
                    Decision::Buy
                } else {
                    Decision::Decline
                }
            }
            DecisionRequest::Tuition {
                flat, percent_due, ..
            } => cheaper_tuition(flat, percent_due),
            DecisionRequest::AuctionBid {
                bidder, high_bid, ..
            } => {
                let raise = high_bid + AUCTION_RAISE;
                if raise * 2 <= money_of(state, bidder) {
                    Decision::Bid(raise)
                } else {
                    Decision::Pass
                }
            }
            DecisionRequest::Liquidate { debtor, .. } => {
                Decision::Liquidate(liquidation_choice(state, debtor))
            }
        }
    }
}

impl Policy for FrugalPolicy {
    fn decide(&mut self, state: &GameState, request: &DecisionRequest) -> Decision {
        match *request {
            DecisionRequest::JailChoice { cup_available, .. } => {
                if cup_available {
                    Decision::UseCup
                } else {
                    Decision::RollForRelease
                }
            }
            DecisionRequest::Purchase { .. } => Decision::Decline,
            DecisionRequest::Tuition {
                flat, percent_due, ..
            } => cheaper_tuition(flat, percent_due),
            DecisionRequest::AuctionBid { .. } => Decision::Pass,
            DecisionRequest::Liquidate { debtor, .. } => {
                Decision::Liquidate(liquidation_choice(state, debtor))
            }
        }
    }
}

/// The built-in policies, as a buildable tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// [`GreedyPolicy`].
    Greedy,
    /// [`FrugalPolicy`].
    Frugal,
}

impl PolicyKind {
    /// Short name used in rosters and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Frugal => "frugal",
        }
    }

    /// Construct a fresh policy of this kind.
    #[must_use]
    pub fn build(self) -> Box<dyn Policy + Send> {
        match self {
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Frugal => Box::new(FrugalPolicy),
        }
    }
}

/// Configuration for scripted games.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// One policy per seat; seat `i` plays token `TOKENS[i]`.
    pub seats: Vec<PolicyKind>,
    /// Hard stop: the game ends in a draw after this many player turns.
    pub max_turns: u32,
}

impl SimConfig {
    /// Configuration for the given seats with the default turn cap.
    #[must_use]
    pub const fn new(seats: Vec<PolicyKind>) -> Self {
        Self {
            seats,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(vec![PolicyKind::Greedy, PolicyKind::Greedy])
    }
}

/// What one scripted game ended as.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// The seed the game ran under.
    pub seed: u64,
    /// Winning seat, or `None` for a draw at the turn cap.
    pub winner: Option<usize>,
    /// Player turns completed.
    pub turns: u32,
    /// Final net worth per seat (zero for bankrupt seats).
    pub final_worth: Vec<Money>,
}

/// Aggregate statistics over a batch of games.
#[derive(Debug, Clone)]
pub struct BatchStats {
    /// Games completed.
    pub games: u64,
    /// Win count per seat.
    pub wins: Vec<u64>,
    /// Games that hit the turn cap with no winner.
    pub draws: u64,
    /// Games that failed to run at all.
    pub failures: u64,
    /// Player turns across all completed games.
    pub total_turns: u64,
    /// Summed final net worth per seat.
    total_worth: Vec<Money>,
}

impl BatchStats {
    /// Empty statistics for the given number of seats.
    #[must_use]
    pub fn new(seats: usize) -> Self {
        Self {
            games: 0,
            wins: vec![0; seats],
            draws: 0,
            failures: 0,
            total_turns: 0,
            total_worth: vec![0; seats],
        }
    }

    /// Fold one game outcome in.
    pub fn record(&mut self, outcome: &GameOutcome) {
        self.games += 1;
        self.total_turns += u64::from(outcome.turns);
        match outcome.winner {
            Some(seat) if seat < self.wins.len() => self.wins[seat] += 1,
            Some(_) => {}
            None => self.draws += 1,
        }
        for (seat, worth) in outcome.final_worth.iter().enumerate() {
            if let Some(slot) = self.total_worth.get_mut(seat) {
                *slot += worth;
            }
        }
    }

    /// Fold another batch in.
    pub fn merge(&mut self, other: &Self) {
        self.games += other.games;
        self.draws += other.draws;
        self.failures += other.failures;
        self.total_turns += other.total_turns;
        for (mine, theirs) in self.wins.iter_mut().zip(&other.wins) {
            *mine += theirs;
        }
        for (mine, theirs) in self.total_worth.iter_mut().zip(&other.total_worth) {
            *mine += theirs;
        }
    }

    /// Win rate for a seat, 0.0 to 1.0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, seat: usize) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games as f64
    }

    /// Mean final net worth for a seat.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_worth(&self, seat: usize) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_worth.get(seat).copied().unwrap_or(0) as f64 / self.games as f64
    }

    /// Mean game length in player turns.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_turns(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games as f64
    }
}

/// Run one complete game under the configured policies.
///
/// # Errors
///
/// Fails if the seat count is outside 2..=8, or if the engine rejects a
/// turn in a way the fallback decision cannot recover from.
pub fn run_game(config: &SimConfig, seed: u64) -> GameResult<GameOutcome> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&config.seats.len()) {
        return Err(GameError::PlayerCount(config.seats.len()));
    }

    let mut policies: Vec<Box<dyn Policy + Send>> =
        config.seats.iter().map(|kind| kind.build()).collect();
    let names: Vec<String> = config
        .seats
        .iter()
        .enumerate()
        .map(|(seat, kind)| format!("{}{}", kind.name(), seat + 1))
        .collect();
    let roster: Vec<(Token, &str)> = names
        .iter()
        .enumerate()
        .map(|(seat, name)| (TOKENS[seat], name.as_str()))
        .collect();

    let mut state = GameState::new(seed, &roster)?;
    while !state.is_game_over() && state.turn < config.max_turns {
        let token = state.current_token();
        let extra = drive_turn(&mut state, token, &mut policies)?;
        if state.is_game_over() {
            break;
        }
        if !extra {
            state.advance_turn();
        }
    }

    let winner = state.winner().and_then(|token| seat_of(&state, token));
    let final_worth = state
        .players
        .iter()
        .map(|player| net_worth(&state.board, player))
        .collect();
    Ok(GameOutcome {
        seed,
        winner,
        turns: state.turn,
        final_worth,
    })
}

/// Run a batch of games in parallel, one seed per game.
///
/// Game `i` runs under `base_seed + i`, so a batch is reproducible and
/// any single game from it can be re-run alone.
///
/// # Errors
///
/// Fails if the seat count is outside 2..=8.
pub fn run_batch(config: &SimConfig, base_seed: u64, games: u64) -> GameResult<BatchStats> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&config.seats.len()) {
        return Err(GameError::PlayerCount(config.seats.len()));
    }

    let stats = (0..games)
        .into_par_iter()
        .fold(
            || BatchStats::new(config.seats.len()),
            |mut stats, game| {
                let seed = base_seed.wrapping_add(game);
                match run_game(config, seed) {
                    Ok(outcome) => stats.record(&outcome),
                    Err(_) => stats.failures += 1,
                }
                stats
            },
        )
        .reduce(
            || BatchStats::new(config.seats.len()),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );
    Ok(stats)
}

/// Play one turn to completion, answering requests from the policies.
fn drive_turn(
    state: &mut GameState,
    token: Token,
    policies: &mut [Box<dyn Policy + Send>],
) -> GameResult<bool> {
    let (mut turn, mut step) = Turn::begin(state, token, None)?;
    loop {
        match step {
            Step::Complete(report) => return Ok(report.extra_turn),
            Step::Pending(request) => {
                let actor = request_actor(&request);
                let seat = seat_of(state, actor).ok_or(GameError::UnknownPlayer(actor))?;
                let decision = policies[seat].decide(state, &request);
                step = match turn.resume(state, &decision) {
                    Ok(next) => next,
                    Err(_) => turn.resume(state, &fallback(&request))?,
                };
            }
        }
    }
}

const fn request_actor(request: &DecisionRequest) -> Token {
    match request {
        DecisionRequest::JailChoice { token, .. }
        | DecisionRequest::Purchase { token, .. }
        | DecisionRequest::Tuition { token, .. } => *token,
        DecisionRequest::AuctionBid { bidder, .. } => *bidder,
        DecisionRequest::Liquidate { debtor, .. } => *debtor,
    }
}

/// A decision that always makes progress, whatever the policy answered.
const fn fallback(request: &DecisionRequest) -> Decision {
    match request {
        DecisionRequest::JailChoice { .. } => Decision::RollForRelease,
        DecisionRequest::Purchase { .. } => Decision::Decline,
        DecisionRequest::Tuition { .. } => Decision::TuitionFlat,
        DecisionRequest::AuctionBid { .. } => Decision::Pass,
        DecisionRequest::Liquidate { .. } => Decision::Liquidate(LiquidationAction::Surrender),
    }
}

fn seat_of(state: &GameState, token: Token) -> Option<usize> {
    state.players.iter().position(|p| p.token == token)
}

fn money_of(state: &GameState, token: Token) -> Money {
    state.get_player(token).map_or(0, |p| p.money)
}

const fn cheaper_tuition(flat: Money, percent_due: Money) -> Decision {
    if percent_due < flat {
        Decision::TuitionPercent
    } else {
        Decision::TuitionFlat
    }
}

/// Sell improvements first, then mortgage, then give up.
fn liquidation_choice(state: &GameState, debtor: Token) -> LiquidationAction {
    if let Some(name) = improved_holding(state, debtor) {
        return LiquidationAction::SellImprovement(name.to_string());
    }
    if let Some(name) = mortgage_candidate(state, debtor) {
        return LiquidationAction::Mortgage(name.to_string());
    }
    LiquidationAction::Surrender
}

fn improved_holding(state: &GameState, token: Token) -> Option<&'static str> {
    state
        .board
        .owned_by(token)
        .find(|square| square.improvements > 0)
        .map(|square| square.name)
}

fn mortgage_candidate(state: &GameState, token: Token) -> Option<&'static str> {
    state
        .board
        .owned_by(token)
        .find(|square| {
            !square.mortgaged
                && square
                    .block()
                    .is_none_or(|block| !state.board.block_improved(block))
        })
        .map(|square| square.name)
}
