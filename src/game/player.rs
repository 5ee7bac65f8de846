//! Player state management.

use crate::game::board::JAIL_POSITION;

/// Single-character token identifying a player.
pub type Token = char;

/// Amount of in-game currency.
pub type Money = i64;

/// Cash every player starts with.
pub const STARTING_MONEY: Money = 1_500;

/// The eight playing pieces.
pub const TOKENS: [Token; 8] = ['G', 'B', 'D', 'P', 'S', '$', 'L', 'T'];

/// Full name of a playing piece.
#[must_use]
pub const fn token_name(token: Token) -> Option<&'static str> {
    match token {
        'G' => Some("Goose"),
        'B' => Some("GRT Bus"),
        'D' => Some("Tim Hortons Doughnut"),
        'P' => Some("Professor"),
        'S' => Some("Student"),
        '$' => Some("Money"),
        'L' => Some("Laptop"),
        'T' => Some("Pink Tie"),
        _ => None,
    }
}

/// State for a single player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Token identifying this player on the board.
    pub token: Token,
    /// Display name, used in save files to identify property owners.
    pub name: String,
    /// Cash on hand.
    pub money: Money,
    /// Board position, 0..=39.
    pub position: u8,
    /// Whether the player is locked up in the DC Tims Line.
    pub in_jail: bool,
    /// Failed escape attempts this stay, 0..=2.
    pub jail_turns: u8,
    /// Roll Up the Rim cups held.
    pub cups: u8,
    /// Whether the player has gone bankrupt and left the game.
    pub bankrupt: bool,
    /// Names of owned properties, in acquisition order.
    pub properties: Vec<&'static str>,
}

impl Player {
    /// Create a new player at COLLECT OSAP with starting money.
    #[must_use]
    pub fn new(token: Token, name: &str) -> Self {
        Self {
            token,
            name: name.to_string(),
            money: STARTING_MONEY,
            position: 0,
            in_jail: false,
            jail_turns: 0,
            cups: 0,
            bankrupt: false,
            properties: Vec::new(),
        }
    }

    /// Add money to the player's cash.
    pub fn credit(&mut self, amount: Money) {
        self.money = self.money.saturating_add(amount);
    }

    /// Remove money from the player's cash.
    pub fn debit(&mut self, amount: Money) {
        self.money = self.money.saturating_sub(amount);
    }

    /// Whether the player can pay an amount out of cash.
    #[must_use]
    pub const fn can_afford(&self, amount: Money) -> bool {
        self.money >= amount
    }

    /// Send the player to the DC Tims Line.
    pub fn go_to_jail(&mut self) {
        self.position = JAIL_POSITION;
        self.in_jail = true;
        self.jail_turns = 0;
    }

    /// Release the player from the DC Tims Line.
    pub fn release_from_jail(&mut self) {
        self.in_jail = false;
        self.jail_turns = 0;
    }

    /// Record ownership of a property.
    pub fn add_property(&mut self, name: &'static str) {
        if !self.properties.contains(&name) {
            self.properties.push(name);
        }
    }

    /// Drop ownership of a property.
    pub fn remove_property(&mut self, name: &str) {
        self.properties.retain(|p| *p != name);
    }

    /// Whether the player owns a property.
    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        self.properties.iter().any(|p| *p == name)
    }

    /// Remove the player from the game.
    ///
    /// Asset disposition (properties, cups, cash) is the caller's job.
    pub fn eliminate(&mut self) {
        self.bankrupt = true;
        self.in_jail = false;
        self.jail_turns = 0;
    }
}
