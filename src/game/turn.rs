//! The turn engine: one player's turn as a resumable state machine.
//!
//! [`Turn::begin`] starts a turn and runs it as far as the dice allow. When
//! the player must choose something (escape method, purchase, tax method,
//! auction bid, liquidation action) the engine suspends with a typed
//! [`DecisionRequest`]; [`Turn::resume`] feeds the answer back in and runs to
//! the next suspension or to the completed-turn report. Invalid answers are
//! rejected without touching game state, and the same request stands.

use crate::error::{GameError, GameResult};
use crate::game::auction::{Auction, AuctionOutcome};
use crate::game::board::BOARD_SIZE;
use crate::game::landing::{self, Landing, SlcMove, COOP_FEE, TUITION_FLAT, TUITION_PERCENT};
use crate::game::solvency::{self, DebtOutcome, Liquidation, LiquidationAction, PaymentStatus};
use crate::game::state::{GameState, MAX_CUPS};
use crate::game::{economy, rent, Money, Token};

/// Fee to get out of the DC Tims Line.
pub const JAIL_FEE: Money = 50;

/// Escape rolls allowed per jail stay; the last failure forces the fee.
pub const JAIL_ROLL_ATTEMPTS: u8 = 3;

/// Paid for passing (or landing on) COLLECT OSAP.
pub const PASS_BONUS: Money = 200;

/// A choice the engine needs before the turn can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRequest {
    /// The player starts their turn in the DC Tims Line.
    JailChoice {
        /// Whose turn it is.
        token: Token,
        /// Whether they hold a Roll Up the Rim cup to spend.
        cup_available: bool,
        /// Whether they can cover the release fee from cash.
        fee_affordable: bool,
    },
    /// The player landed on an unowned property.
    Purchase {
        /// Whose turn it is.
        token: Token,
        /// The property on offer.
        property: &'static str,
        /// Its asking price.
        price: Money,
    },
    /// The player landed on TUITION and picks how to pay.
    Tuition {
        /// Whose turn it is.
        token: Token,
        /// The flat charge.
        flat: Money,
        /// What the net-worth percentage would come to right now.
        percent_due: Money,
    },
    /// An auction is running and it is this bidder's turn to act.
    AuctionBid {
        /// Who must bid or pass.
        bidder: Token,
        /// The property under the hammer.
        property: &'static str,
        /// The standing high bid.
        high_bid: Money,
    },
    /// The player owes more than they have and must liquidate or surrender.
    Liquidate {
        /// Who owes.
        debtor: Token,
        /// The full amount owed.
        owed: Money,
        /// How much cash they are still short.
        shortfall: Money,
        /// Who collects (None = the bank).
        creditor: Option<Token>,
    },
}

/// The answer to a [`DecisionRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Spend a cup to leave the DC Tims Line.
    UseCup,
    /// Pay the fee to leave the DC Tims Line.
    PayJailFee,
    /// Try to roll doubles for release.
    RollForRelease,
    /// Buy the offered property at list price.
    Buy,
    /// Refuse the purchase, sending the property to auction.
    Decline,
    /// Pay the flat tuition charge.
    TuitionFlat,
    /// Pay the net-worth percentage instead.
    TuitionPercent,
    /// Raise the auction to this amount.
    Bid(Money),
    /// Drop out of the auction.
    Pass,
    /// Take a liquidation action against an open debt.
    Liquidate(LiquidationAction),
}

/// How a jailed player got out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JailRelease {
    /// Spent a Roll Up the Rim cup.
    Cup,
    /// Paid the fee voluntarily.
    Fee,
    /// Rolled doubles.
    Doubles,
    /// Paid the fee under force after the last failed roll.
    ForcedFee,
}

/// Something that happened during a turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// The player moved along the board.
    Moved {
        /// Where they started.
        from: u8,
        /// Where they stopped.
        to: u8,
    },
    /// The player collected the COLLECT OSAP payout.
    OsapCollected,
    /// The player bought a property at list price.
    Purchased {
        /// What they bought.
        property: &'static str,
        /// What they paid.
        price: Money,
    },
    /// Rent came due to another player.
    RentPaid {
        /// Who collects.
        to: Token,
        /// How much.
        amount: Money,
    },
    /// An auction closed with a sale.
    AuctionWon {
        /// The property sold.
        property: &'static str,
        /// Who bought it.
        winner: Token,
        /// What they paid.
        price: Money,
    },
    /// An auction closed with no sale.
    AuctionUnsold {
        /// The property that found no buyer.
        property: &'static str,
    },
    /// Tuition came due at the chosen amount.
    TuitionPaid {
        /// The chosen charge.
        amount: Money,
    },
    /// The COOP FEE came due.
    CoopFeePaid,
    /// NEEDLES HALL moved money.
    MoneyDrawn {
        /// The drawn delta, negative for a loss.
        delta: Money,
    },
    /// The player won a Roll Up the Rim cup.
    CupWon,
    /// SLC teleported the player.
    Relocated {
        /// Where they ended up.
        to: u8,
    },
    /// The player was sent to the DC Tims Line.
    Jailed,
    /// A release roll failed and the player stays put.
    StayedInJail {
        /// Which escape attempt this was, 1-based.
        attempt: u8,
    },
    /// The player left the DC Tims Line.
    Released(JailRelease),
    /// The player went bankrupt.
    Bankrupted {
        /// Who inherited the estate (None = the bank).
        creditor: Option<Token>,
    },
}

/// What happened over a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Whose turn it was.
    pub token: Token,
    /// The dice rolled this turn.
    pub dice: (u8, u8),
    /// Whether doubles earned the player another turn.
    pub extra_turn: bool,
    /// Everything that happened, in order.
    pub events: Vec<TurnEvent>,
}

/// One step of turn execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The engine is suspended waiting for a decision.
    Pending(DecisionRequest),
    /// The turn finished.
    Complete(TurnReport),
}

/// What to do once an open debt settles.
#[derive(Debug, Clone, Copy)]
enum DebtNext {
    /// Nothing left: finish the turn.
    EndTurn,
    /// The forced jail fee is paid: release the player and move them.
    MoveAfterRelease {
        /// The roll total still owed as movement.
        total: u8,
    },
}

#[derive(Debug)]
enum Phase {
    AwaitJail,
    AwaitPurchase { position: u8, price: Money },
    AwaitTuition { percent_due: Money },
    InAuction(Auction),
    InDebt { debt: Liquidation, next: DebtNext },
    Finished,
}

/// One player's turn in progress.
#[derive(Debug)]
pub struct Turn {
    token: Token,
    phase: Phase,
    forced: Option<(u8, u8)>,
    dice: (u8, u8),
    extra: bool,
    events: Vec<TurnEvent>,
}

impl Turn {
    /// Start a turn for `token`, optionally with fixed dice for the first
    /// roll of the turn.
    ///
    /// Runs until the first suspension point or straight to completion.
    ///
    /// # Errors
    ///
    /// Rejects unknown and bankrupt players.
    pub fn begin(
        state: &mut GameState,
        token: Token,
        forced: Option<(u8, u8)>,
    ) -> GameResult<(Self, Step)> {
        let Some(player) = state.get_player(token) else {
            return Err(GameError::UnknownPlayer(token));
        };
        if player.bankrupt {
            return Err(GameError::PlayerBankrupt(token));
        }
        let in_jail = player.in_jail;
        let cup_available = player.cups > 0;
        let fee_affordable = player.can_afford(JAIL_FEE);

        let mut turn = Self {
            token,
            phase: Phase::Finished,
            forced,
            dice: (0, 0),
            extra: false,
            events: Vec::new(),
        };
        let step = if in_jail {
            turn.phase = Phase::AwaitJail;
            Step::Pending(DecisionRequest::JailChoice {
                token,
                cup_available,
                fee_affordable,
            })
        } else {
            turn.free_move(state)
        };
        Ok((turn, step))
    }

    /// Whose turn this is.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.token
    }

    /// Feed the pending decision back in and run to the next suspension
    /// point or to completion.
    ///
    /// # Errors
    ///
    /// A decision that does not answer the pending request, or that is
    /// invalid for it (buying without funds, bidding low, liquidating assets
    /// the debtor does not hold), is rejected; game state and the pending
    /// request are unchanged.
    #[allow(clippy::too_many_lines)]
    pub fn resume(&mut self, state: &mut GameState, decision: &Decision) -> GameResult<Step> {
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);
        match (phase, decision) {
            (Phase::AwaitJail, Decision::UseCup) => {
                let Some(player) = state.get_player_mut(self.token) else {
                    self.phase = Phase::AwaitJail;
                    return Err(GameError::UnknownPlayer(self.token));
                };
                if player.cups == 0 {
                    self.phase = Phase::AwaitJail;
                    return Err(GameError::NoCups(self.token));
                }
                player.cups -= 1;
                player.release_from_jail();
                self.events.push(TurnEvent::Released(JailRelease::Cup));
                Ok(self.free_move(state))
            }
            (Phase::AwaitJail, Decision::PayJailFee) => {
                let Some(player) = state.get_player_mut(self.token) else {
                    self.phase = Phase::AwaitJail;
                    return Err(GameError::UnknownPlayer(self.token));
                };
                if !player.can_afford(JAIL_FEE) {
                    let available = player.money;
                    self.phase = Phase::AwaitJail;
                    return Err(GameError::InsufficientFunds {
                        needed: JAIL_FEE,
                        available,
                    });
                }
                player.debit(JAIL_FEE);
                player.release_from_jail();
                self.events.push(TurnEvent::Released(JailRelease::Fee));
                Ok(self.free_move(state))
            }
            (Phase::AwaitJail, Decision::RollForRelease) => {
                let (d1, d2) = self.roll(state);
                self.dice = (d1, d2);
                if d1 == d2 {
                    if let Some(player) = state.get_player_mut(self.token) {
                        player.release_from_jail();
                    }
                    self.events.push(TurnEvent::Released(JailRelease::Doubles));
                    return Ok(self.release_move(state, d1.saturating_add(d2)));
                }
                let attempt = state
                    .get_player(self.token)
                    .map_or(0, |p| p.jail_turns)
                    .saturating_add(1);
                if attempt >= JAIL_ROLL_ATTEMPTS {
                    return Ok(self.enforce(
                        state,
                        JAIL_FEE,
                        None,
                        DebtNext::MoveAfterRelease {
                            total: d1.saturating_add(d2),
                        },
                    ));
                }
                if let Some(player) = state.get_player_mut(self.token) {
                    player.jail_turns = attempt;
                }
                self.events.push(TurnEvent::StayedInJail { attempt });
                Ok(self.complete(state))
            }
            (Phase::AwaitPurchase { position, price }, Decision::Buy) => {
                let Some(property) = state.board.square(position).map(|sq| sq.name) else {
                    self.phase = Phase::AwaitPurchase { position, price };
                    return Err(GameError::PositionOutOfRange(position));
                };
                let available = state.get_player(self.token).map_or(0, |p| p.money);
                if available < price {
                    self.phase = Phase::AwaitPurchase { position, price };
                    return Err(GameError::InsufficientFunds {
                        needed: price,
                        available,
                    });
                }
                if let Some(player) = state.get_player_mut(self.token) {
                    player.debit(price);
                }
                state.transfer_property(property, Some(self.token))?;
                self.events.push(TurnEvent::Purchased { property, price });
                Ok(self.complete(state))
            }
            (Phase::AwaitPurchase { position, price }, Decision::Decline) => {
                let Some(property) = state.board.square(position).map(|sq| sq.name) else {
                    self.phase = Phase::AwaitPurchase { position, price };
                    return Err(GameError::PositionOutOfRange(position));
                };
                let auction = Auction::new(state, property, self.token);
                Ok(self.auction_step(state, auction))
            }
            (Phase::AwaitTuition { .. }, Decision::TuitionFlat) => {
                self.events.push(TurnEvent::TuitionPaid {
                    amount: TUITION_FLAT,
                });
                Ok(self.enforce(state, TUITION_FLAT, None, DebtNext::EndTurn))
            }
            (Phase::AwaitTuition { percent_due }, Decision::TuitionPercent) => {
                self.events.push(TurnEvent::TuitionPaid {
                    amount: percent_due,
                });
                Ok(self.enforce(state, percent_due, None, DebtNext::EndTurn))
            }
            (Phase::InAuction(mut auction), Decision::Bid(amount)) => {
                let Some(bidder) = auction.current_bidder() else {
                    self.phase = Phase::InAuction(auction);
                    return Err(GameError::DecisionMismatch);
                };
                let money = state.get_player(bidder).map_or(0, |p| p.money);
                if let Err(err) = auction.bid(money, *amount) {
                    self.phase = Phase::InAuction(auction);
                    return Err(err);
                }
                Ok(self.auction_step(state, auction))
            }
            (Phase::InAuction(mut auction), Decision::Pass) => {
                if let Err(err) = auction.pass() {
                    self.phase = Phase::InAuction(auction);
                    return Err(err);
                }
                Ok(self.auction_step(state, auction))
            }
            (Phase::InDebt { mut debt, next }, Decision::Liquidate(action)) => {
                match debt.apply(state, action) {
                    Ok(None) => {
                        let request = Self::debt_request(&debt, state);
                        self.phase = Phase::InDebt { debt, next };
                        Ok(Step::Pending(request))
                    }
                    Ok(Some(DebtOutcome::Paid)) => Ok(self.debt_settled(state, next)),
                    Ok(Some(DebtOutcome::Bankrupt)) => {
                        self.events.push(TurnEvent::Bankrupted {
                            creditor: debt.creditor(),
                        });
                        Ok(self.complete(state))
                    }
                    Err(err) => {
                        self.phase = Phase::InDebt { debt, next };
                        Err(err)
                    }
                }
            }
            (phase, _) => {
                self.phase = phase;
                Err(GameError::DecisionMismatch)
            }
        }
    }

    /// Take the forced dice if any, otherwise roll.
    fn roll(&mut self, state: &mut GameState) -> (u8, u8) {
        match self.forced.take() {
            Some(dice) => dice,
            None => (state.roll_die(), state.roll_die()),
        }
    }

    /// Roll under the free rules: doubles streak, jailing on the third
    /// double, movement with the pass bonus, landing resolution.
    fn free_move(&mut self, state: &mut GameState) -> Step {
        let (d1, d2) = self.roll(state);
        self.dice = (d1, d2);
        if d1 == d2 {
            state.doubles_streak = state.doubles_streak.saturating_add(1);
            if state.doubles_streak >= 3 {
                state.doubles_streak = 0;
                if let Some(player) = state.get_player_mut(self.token) {
                    player.go_to_jail();
                }
                self.events.push(TurnEvent::Jailed);
                self.extra = false;
                return self.complete(state);
            }
            self.extra = true;
        } else {
            state.doubles_streak = 0;
            self.extra = false;
        }
        let steps = d1.saturating_add(d2);
        self.travel(state, steps);
        self.resolve_landing(state, steps > 0)
    }

    /// Move after a jail release roll: no streak, no extra turn.
    fn release_move(&mut self, state: &mut GameState, total: u8) -> Step {
        self.travel(state, total);
        self.resolve_landing(state, total > 0)
    }

    /// Advance the player with wraparound, paying the pass bonus on a
    /// strict crossing of COLLECT OSAP. An exact landing pays through the
    /// landing resolution instead.
    fn travel(&mut self, state: &mut GameState, steps: u8) {
        let Some(player) = state.get_player_mut(self.token) else {
            return;
        };
        let from = player.position;
        let raw = u16::from(from) + u16::from(steps);
        let to = u8::try_from(raw % u16::from(BOARD_SIZE)).unwrap_or(0);
        player.position = to;
        self.events.push(TurnEvent::Moved { from, to });
        if raw > u16::from(BOARD_SIZE) {
            player.credit(PASS_BONUS);
            self.events.push(TurnEvent::OsapCollected);
        }
    }

    /// Resolve the effect of the square under the player, looping once when
    /// SLC relocates them.
    ///
    /// `arrived` is whether the player actually moved onto the square; a
    /// zero-step roll re-resolves it, but standing still on COLLECT OSAP
    /// earns nothing.
    fn resolve_landing(&mut self, state: &mut GameState, mut arrived: bool) -> Step {
        loop {
            let Some(position) = state.get_player(self.token).map(|p| p.position) else {
                return self.complete(state);
            };
            match landing::resolve_landing(state, position, self.token) {
                Landing::PromptPurchase { position, price } => {
                    let Some(property) = state.board.square(position).map(|sq| sq.name) else {
                        return self.complete(state);
                    };
                    self.phase = Phase::AwaitPurchase { position, price };
                    return Step::Pending(DecisionRequest::Purchase {
                        token: self.token,
                        property,
                        price,
                    });
                }
                Landing::PayRent { position, owner } => {
                    let total = self.dice.0.saturating_add(self.dice.1);
                    let owner_in_jail = state.get_player(owner).is_some_and(|p| p.in_jail);
                    let amount = state.board.square(position).map_or(0, |square| {
                        rent::rent_due(&state.board, square, total, owner_in_jail)
                    });
                    if amount == 0 {
                        return self.complete(state);
                    }
                    self.events.push(TurnEvent::RentPaid { to: owner, amount });
                    return self.enforce(state, amount, Some(owner), DebtNext::EndTurn);
                }
                Landing::OwnedNoOp | Landing::NoEffect => return self.complete(state),
                Landing::CollectOsap => {
                    if arrived {
                        if let Some(player) = state.get_player_mut(self.token) {
                            player.credit(PASS_BONUS);
                        }
                        self.events.push(TurnEvent::OsapCollected);
                    }
                    return self.complete(state);
                }
                Landing::PayTuition => {
                    // a loaded game can carry negative worth; tuition never refunds
                    let percent_due = state.get_player(self.token).map_or(0, |p| {
                        (economy::net_worth(&state.board, p) * TUITION_PERCENT / 100).max(0)
                    });
                    self.phase = Phase::AwaitTuition { percent_due };
                    return Step::Pending(DecisionRequest::Tuition {
                        token: self.token,
                        flat: TUITION_FLAT,
                        percent_due,
                    });
                }
                Landing::PayCoopFee => {
                    self.events.push(TurnEvent::CoopFeePaid);
                    return self.enforce(state, COOP_FEE, None, DebtNext::EndTurn);
                }
                Landing::MoneyEvent => {
                    let delta = landing::needles_delta(state.random_below(18));
                    self.events.push(TurnEvent::MoneyDrawn { delta });
                    self.award_cup(state);
                    if delta >= 0 {
                        if let Some(player) = state.get_player_mut(self.token) {
                            player.credit(delta);
                        }
                        return self.complete(state);
                    }
                    return self.enforce(state, -delta, None, DebtNext::EndTurn);
                }
                Landing::Relocate => {
                    let card = landing::slc_move(state.random_below(24));
                    self.award_cup(state);
                    match card {
                        SlcMove::Back(n) => {
                            self.teleport(state, (position + BOARD_SIZE - n) % BOARD_SIZE);
                        }
                        SlcMove::Forward(n) => {
                            self.teleport(state, (position + n) % BOARD_SIZE);
                        }
                        SlcMove::ToOsap => self.teleport(state, 0),
                        SlcMove::ToTims => {
                            if let Some(player) = state.get_player_mut(self.token) {
                                player.go_to_jail();
                            }
                            self.events.push(TurnEvent::Jailed);
                            self.extra = false;
                            return self.complete(state);
                        }
                    }
                    arrived = true;
                }
                Landing::GoToJail => {
                    if let Some(player) = state.get_player_mut(self.token) {
                        player.go_to_jail();
                    }
                    self.events.push(TurnEvent::Jailed);
                    self.extra = false;
                    return self.complete(state);
                }
            }
        }
    }

    /// Drop the player on `to` without movement semantics: no pass bonus.
    fn teleport(&mut self, state: &mut GameState, to: u8) {
        if let Some(player) = state.get_player_mut(self.token) {
            player.position = to;
        }
        self.events.push(TurnEvent::Relocated { to });
    }

    /// The 1-in-100 Roll Up the Rim draw, rolled on every SLC and NEEDLES
    /// HALL visit so the dice stream does not depend on the cup cap.
    fn award_cup(&mut self, state: &mut GameState) {
        let lucky = state.random_percent(1);
        if !lucky || state.cups_in_circulation() >= MAX_CUPS {
            return;
        }
        if let Some(player) = state.get_player_mut(self.token) {
            player.cups = player.cups.saturating_add(1);
            self.events.push(TurnEvent::CupWon);
        }
    }

    /// Collect `amount` from the turn player, suspending into liquidation
    /// when cash falls short.
    fn enforce(
        &mut self,
        state: &mut GameState,
        amount: Money,
        creditor: Option<Token>,
        next: DebtNext,
    ) -> Step {
        match solvency::enforce_payment(state, self.token, amount, creditor) {
            PaymentStatus::Paid => self.debt_settled(state, next),
            PaymentStatus::NeedsLiquidation(debt) => {
                let request = Self::debt_request(&debt, state);
                self.phase = Phase::InDebt { debt, next };
                Step::Pending(request)
            }
        }
    }

    /// Continue the turn after a debt was paid in full.
    fn debt_settled(&mut self, state: &mut GameState, next: DebtNext) -> Step {
        match next {
            DebtNext::EndTurn => self.complete(state),
            DebtNext::MoveAfterRelease { total } => {
                if let Some(player) = state.get_player_mut(self.token) {
                    player.release_from_jail();
                }
                self.events.push(TurnEvent::Released(JailRelease::ForcedFee));
                self.release_move(state, total)
            }
        }
    }

    fn debt_request(debt: &Liquidation, state: &GameState) -> DecisionRequest {
        DecisionRequest::Liquidate {
            debtor: debt.debtor(),
            owed: debt.amount(),
            shortfall: debt.shortfall(state),
            creditor: debt.creditor(),
        }
    }

    /// Run the auction forward: suspend for the next bidder, or settle the
    /// outcome once bidding has closed.
    fn auction_step(&mut self, state: &mut GameState, auction: Auction) -> Step {
        if auction.is_open() {
            if let Some(bidder) = auction.current_bidder() {
                let request = DecisionRequest::AuctionBid {
                    bidder,
                    property: auction.property(),
                    high_bid: auction.high_bid(),
                };
                self.phase = Phase::InAuction(auction);
                return Step::Pending(request);
            }
        }
        match auction.outcome() {
            Some(AuctionOutcome::Won { winner, price }) => {
                if state.transfer_property(auction.property(), Some(winner)).is_ok() {
                    if let Some(player) = state.get_player_mut(winner) {
                        player.debit(price);
                    }
                    self.events.push(TurnEvent::AuctionWon {
                        property: auction.property(),
                        winner,
                        price,
                    });
                }
            }
            Some(AuctionOutcome::Unsold) | None => {
                self.events.push(TurnEvent::AuctionUnsold {
                    property: auction.property(),
                });
            }
        }
        self.complete(state)
    }

    /// Close out the turn. A player who was jailed or went bankrupt this
    /// turn forfeits any earned extra turn.
    fn complete(&mut self, state: &GameState) -> Step {
        self.phase = Phase::Finished;
        let eligible = state
            .get_player(self.token)
            .is_some_and(|p| !p.bankrupt && !p.in_jail);
        Step::Complete(TurnReport {
            token: self.token,
            dice: self.dice,
            extra_turn: self.extra && eligible,
            events: std::mem::take(&mut self.events),
        })
    }
}
