//! Auction protocol.
//!
//! When a purchase is declined or unaffordable, the title goes under the
//! hammer. Bidding runs round-robin over the solvent players in seating
//! order, starting with the player after the decliner; the decliner bids
//! too. Every turn a bidder either raises strictly above the standing
//! high bid or drops out for good. A bid above the bidder's own cash
//! throws the bidder out instead of being rejected.

use crate::error::{GameError, GameResult};
use crate::game::{GameState, Money, Token};

/// What a valid call did to the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// The raise stands; the next bidder is up.
    Accepted,
    /// The bidder overbid their own cash and is out.
    Eliminated,
}

/// Final result once bidding has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionOutcome {
    /// The surviving bidder buys at their own last valid bid.
    Won {
        /// Who takes the title.
        winner: Token,
        /// What they pay, zero if they never had to raise.
        price: Money,
    },
    /// No bidder was ever active: the bank keeps the title.
    Unsold,
}

/// An open auction for one property.
#[derive(Debug, Clone)]
pub struct Auction {
    /// Property under the hammer.
    property: &'static str,
    /// Bidders in call order.
    order: Vec<Token>,
    /// Whether each bidder is still in.
    active: Vec<bool>,
    /// Last valid bid per bidder, zero until they raise.
    last_bid: Vec<Money>,
    /// Index of the bidder whose call it is.
    next: usize,
    /// Standing high bid.
    high_bid: Money,
}

impl Auction {
    /// Open an auction for `property`, declined by `decliner`.
    #[must_use]
    pub fn new(state: &GameState, property: &'static str, decliner: Token) -> Self {
        let solvent: Vec<Token> = state.solvent_players().map(|p| p.token).collect();
        let start = solvent
            .iter()
            .position(|&t| t == decliner)
            .map_or(0, |i| (i + 1) % solvent.len());
        let order: Vec<Token> = solvent[start..]
            .iter()
            .chain(solvent[..start].iter())
            .copied()
            .collect();
        let count = order.len();
        Self {
            property,
            order,
            active: vec![true; count],
            last_bid: vec![0; count],
            next: 0,
            high_bid: 0,
        }
    }

    /// Property under the hammer.
    #[must_use]
    pub const fn property(&self) -> &'static str {
        self.property
    }

    /// Standing high bid.
    #[must_use]
    pub const fn high_bid(&self) -> Money {
        self.high_bid
    }

    /// Whose call it is, None once bidding has closed.
    #[must_use]
    pub fn current_bidder(&self) -> Option<Token> {
        if self.is_open() {
            Some(self.order[self.next])
        } else {
            None
        }
    }

    /// Whether the auction is still taking calls.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.active.iter().filter(|a| **a).count() > 1
    }

    /// Final result, None while bidding is open.
    #[must_use]
    pub fn outcome(&self) -> Option<AuctionOutcome> {
        if self.is_open() {
            return None;
        }
        let survivor = self.active.iter().position(|a| *a);
        Some(match survivor {
            Some(i) => AuctionOutcome::Won {
                winner: self.order[i],
                price: self.last_bid[i],
            },
            None => AuctionOutcome::Unsold,
        })
    }

    /// The current bidder raises to `amount`.
    ///
    /// A raise above the bidder's own cash eliminates the bidder instead.
    ///
    /// # Errors
    ///
    /// Rejects calls after close and raises at or below the high bid,
    /// without changing the auction.
    pub fn bid(&mut self, bidder_money: Money, amount: Money) -> GameResult<BidOutcome> {
        if !self.is_open() {
            return Err(GameError::DecisionMismatch);
        }
        if amount <= self.high_bid {
            return Err(GameError::BidTooLow {
                high_bid: self.high_bid,
            });
        }
        if amount > bidder_money {
            self.active[self.next] = false;
            self.advance();
            return Ok(BidOutcome::Eliminated);
        }
        self.high_bid = amount;
        self.last_bid[self.next] = amount;
        self.advance();
        Ok(BidOutcome::Accepted)
    }

    /// The current bidder drops out for good.
    ///
    /// # Errors
    ///
    /// Rejects calls after close.
    pub fn pass(&mut self) -> GameResult<()> {
        if !self.is_open() {
            return Err(GameError::DecisionMismatch);
        }
        self.active[self.next] = false;
        self.advance();
        Ok(())
    }

    /// Move to the next active bidder, if any are left to call.
    fn advance(&mut self) {
        if !self.is_open() {
            return;
        }
        loop {
            self.next = (self.next + 1) % self.order.len();
            if self.active[self.next] {
                return;
            }
        }
    }
}
