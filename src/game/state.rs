//! Game state management.

use crate::error::{GameError, GameResult};
use crate::game::player::token_name;
use crate::game::{Board, Player, Token};

/// Maximum number of players in a game.
pub const MAX_PLAYERS: usize = 8;

/// Minimum number of players in a game.
pub const MIN_PLAYERS: usize = 2;

/// Most Roll Up the Rim cups allowed in circulation at once.
pub const MAX_CUPS: u32 = 4;

/// Deterministic xorshift64 generator for dice and event draws.
#[derive(Debug, Clone, Copy)]
struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG from a seed.
    fn new(seed: u64) -> Self {
        // xorshift64 has a fixed point at zero
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Generate the next random u64.
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform value in `0..max`.
    fn below(&mut self, max: u64) -> u64 {
        self.next_u64() % max
    }

    /// One die face, 1..=6.
    fn die(&mut self) -> u8 {
        match self.below(6) {
            0 => 1,
            1 => 2,
            2 => 3,
            3 => 4,
            4 => 5,
            _ => 6,
        }
    }
}

/// Complete game state.
///
/// Holds the board, the players, and the turn rotation. All engine
/// operations take this by reference; nothing here blocks or waits.
#[derive(Debug, Clone)]
pub struct GameState {
    /// The board with all title state.
    pub board: Board,
    /// All players, in seating order.
    pub players: Vec<Player>,
    /// Number of player turns completed so far.
    pub turn: u32,
    /// Index into `players` of the player whose turn it is.
    pub current: usize,
    /// Consecutive doubles rolled in the current rotation. Not persisted.
    pub(crate) doubles_streak: u8,
    /// Random source for dice and event draws.
    rng: Rng,
}

impl GameState {
    /// Create a new game with the canonical board and the given roster.
    ///
    /// Every player starts at COLLECT OSAP with starting money. The same
    /// seed and roster always produce the same game.
    ///
    /// # Errors
    ///
    /// Rejects rosters outside 2..=8 players, unknown tokens, and
    /// duplicate tokens.
    pub fn new(seed: u64, roster: &[(Token, &str)]) -> GameResult<Self> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&roster.len()) {
            return Err(GameError::PlayerCount(roster.len()));
        }

        let mut players = Vec::with_capacity(roster.len());
        for &(token, name) in roster {
            if token_name(token).is_none() {
                return Err(GameError::InvalidToken(token));
            }
            if players.iter().any(|p: &Player| p.token == token) {
                return Err(GameError::DuplicateToken(token));
            }
            players.push(Player::new(token, name));
        }

        Ok(Self {
            board: Board::new(),
            players,
            turn: 0,
            current: 0,
            doubles_streak: 0,
            rng: Rng::new(seed),
        })
    }

    /// Reassemble a game from loaded parts.
    ///
    /// Used by save-file loading. Play resumes from the first player.
    #[must_use]
    pub fn from_parts(board: Board, players: Vec<Player>, seed: u64) -> Self {
        Self {
            board,
            players,
            turn: 0,
            current: 0,
            doubles_streak: 0,
            rng: Rng::new(seed),
        }
    }

    /// Get a player by token.
    #[must_use]
    pub fn get_player(&self, token: Token) -> Option<&Player> {
        self.players.iter().find(|p| p.token == token)
    }

    /// Get a mutable reference to a player by token.
    #[must_use]
    pub fn get_player_mut(&mut self, token: Token) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.token == token)
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    /// Token of the player whose turn it is.
    #[must_use]
    pub fn current_token(&self) -> Token {
        self.players[self.current].token
    }

    /// Hand the turn to the next solvent player.
    pub fn advance_turn(&mut self) {
        self.turn = self.turn.saturating_add(1);
        self.doubles_streak = 0;
        if self.players.iter().all(|p| p.bankrupt) {
            return;
        }
        loop {
            self.current = (self.current + 1) % self.players.len();
            if !self.players[self.current].bankrupt {
                return;
            }
        }
    }

    /// Get all players still in the game.
    pub fn solvent_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.bankrupt)
    }

    /// Check if the game is over (at most one solvent player).
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.solvent_players().count() <= 1
    }

    /// Token of the winner, once everyone else is bankrupt.
    #[must_use]
    pub fn winner(&self) -> Option<Token> {
        let mut solvent = self.solvent_players();
        let first = solvent.next()?;
        if solvent.next().is_none() {
            Some(first.token)
        } else {
            None
        }
    }

    /// Roll Up the Rim cups currently held across all players.
    #[must_use]
    pub fn cups_in_circulation(&self) -> u32 {
        self.players.iter().map(|p| u32::from(p.cups)).sum()
    }

    /// Move a property title to a new owner (None = the bank).
    ///
    /// Updates both the board side and the player-side ownership lists.
    /// Mortgage flag and improvement level are left untouched.
    ///
    /// # Errors
    ///
    /// Fails on unknown property names and unknown receiving players.
    pub fn transfer_property(&mut self, name: &str, to: Option<Token>) -> GameResult<()> {
        if let Some(token) = to {
            if self.get_player(token).is_none() {
                return Err(GameError::UnknownPlayer(token));
            }
        }
        let square = self
            .board
            .property_mut(name)
            .ok_or_else(|| GameError::UnknownProperty(name.to_string()))?;
        let static_name = square.name;
        let from = square.owner;
        square.owner = to;

        if let Some(token) = from {
            if let Some(player) = self.get_player_mut(token) {
                player.remove_property(static_name);
            }
        }
        if let Some(token) = to {
            if let Some(player) = self.get_player_mut(token) {
                player.add_property(static_name);
            }
        }
        Ok(())
    }

    /// Roll one die.
    pub(crate) fn roll_die(&mut self) -> u8 {
        self.rng.die()
    }

    /// Uniform draw in `0..max`.
    pub(crate) fn random_below(&mut self, max: u64) -> u64 {
        self.rng.below(max)
    }

    /// True with the given percent probability.
    pub(crate) fn random_percent(&mut self, percent: u64) -> bool {
        self.rng.below(100) < percent
    }
}
