//! Solvency protocol: enforced payments, liquidation, bankruptcy.
//!
//! Debts (rent, fees, forced jail charges, money events) are not optional
//! and not errors. A debtor who cannot cover one from cash works through a
//! liquidation loop: sell an improvement, mortgage a title, or surrender.
//! The loop ends when the debt is paid or the debtor goes under and the
//! estate moves to the creditor (or back to the bank).

use crate::error::{GameError, GameResult};
use crate::game::{economy, GameState, Money, Token};

/// Interest a creditor owes the bank on each mortgaged title they inherit,
/// as a percentage of its mortgage value.
pub const MORTGAGE_INTEREST_PERCENT: Money = 10;

/// How an enforced payment attempt went.
#[derive(Debug, Clone, Copy)]
pub enum PaymentStatus {
    /// Paid in full from cash.
    Paid,
    /// Cash fell short; the returned machine carries the open debt.
    NeedsLiquidation(Liquidation),
}

/// How an open debt finally closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtOutcome {
    /// Raised enough and paid.
    Paid,
    /// Surrendered; the estate has been transferred.
    Bankrupt,
}

/// What a debtor can do about an open debt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidationAction {
    /// Sell one improvement off a named building for half its cost.
    SellImprovement(String),
    /// Mortgage a named property for half its price.
    Mortgage(String),
    /// Give up: hand the estate over and leave the game.
    Surrender,
}

/// An open debt being worked off.
#[derive(Debug, Clone, Copy)]
pub struct Liquidation {
    /// Who owes.
    debtor: Token,
    /// Who collects (None = the bank).
    creditor: Option<Token>,
    /// The full amount owed.
    amount: Money,
    /// Whether the debt has closed.
    done: bool,
}

/// Collect `amount` from `debtor`, paying `creditor` (None = the bank).
///
/// Pays immediately when cash covers the debt. Otherwise returns the
/// liquidation machine; feed it the debtor's decisions until it closes.
pub fn enforce_payment(
    state: &mut GameState,
    debtor: Token,
    amount: Money,
    creditor: Option<Token>,
) -> PaymentStatus {
    let mut liquidation = Liquidation {
        debtor,
        creditor,
        amount,
        done: false,
    };
    match liquidation.try_settle(state) {
        Some(DebtOutcome::Paid) => PaymentStatus::Paid,
        _ => PaymentStatus::NeedsLiquidation(liquidation),
    }
}

impl Liquidation {
    /// Who owes.
    #[must_use]
    pub const fn debtor(&self) -> Token {
        self.debtor
    }

    /// Who collects (None = the bank).
    #[must_use]
    pub const fn creditor(&self) -> Option<Token> {
        self.creditor
    }

    /// The full amount owed.
    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }

    /// How much cash the debtor is still short.
    #[must_use]
    pub fn shortfall(&self, state: &GameState) -> Money {
        state
            .get_player(self.debtor)
            .map_or(self.amount, |p| (self.amount - p.money).max(0))
    }

    /// Apply one liquidation decision.
    ///
    /// Returns the closing outcome once the debt settles, None while the
    /// debtor still owes.
    ///
    /// # Errors
    ///
    /// Invalid actions (selling improvements that do not exist, mortgaging
    /// the unmortgageable) are rejected and leave the debt open; calls
    /// after the debt has closed are a protocol error.
    pub fn apply(
        &mut self,
        state: &mut GameState,
        action: &LiquidationAction,
    ) -> GameResult<Option<DebtOutcome>> {
        if self.done {
            return Err(GameError::DecisionMismatch);
        }
        match action {
            LiquidationAction::SellImprovement(name) => {
                economy::degrade(state, self.debtor, name)?;
            }
            LiquidationAction::Mortgage(name) => {
                economy::mortgage(state, self.debtor, name)?;
            }
            LiquidationAction::Surrender => {
                transfer_estate(state, self.debtor, self.creditor)?;
                self.done = true;
                return Ok(Some(DebtOutcome::Bankrupt));
            }
        }
        Ok(self.try_settle(state))
    }

    /// Pay the debt off if cash now covers it.
    fn try_settle(&mut self, state: &mut GameState) -> Option<DebtOutcome> {
        let covered = state
            .get_player(self.debtor)
            .is_some_and(|p| p.can_afford(self.amount));
        if !covered {
            return None;
        }
        if let Some(player) = state.get_player_mut(self.debtor) {
            player.debit(self.amount);
        }
        if let Some(creditor) = self.creditor {
            if let Some(player) = state.get_player_mut(creditor) {
                player.credit(self.amount);
            }
        }
        self.done = true;
        Some(DebtOutcome::Paid)
    }
}

/// Hand a debtor's entire estate over and remove them from the game.
///
/// With a creditor: cash, cups, and every title transfer; each mortgaged
/// title costs the creditor an immediate interest charge to the bank and
/// arrives still mortgaged. Without one, titles revert to the bank with
/// mortgages and improvements wiped, and the cups leave circulation.
///
/// # Errors
///
/// Rejects an unknown debtor or creditor before anything moves.
pub fn transfer_estate(
    state: &mut GameState,
    debtor: Token,
    creditor: Option<Token>,
) -> GameResult<()> {
    if let Some(token) = creditor {
        if state.get_player(token).is_none() {
            return Err(GameError::UnknownPlayer(token));
        }
    }
    let Some(player) = state.get_player(debtor) else {
        return Err(GameError::UnknownPlayer(debtor));
    };
    let (cash, cups, names) = (player.money.max(0), player.cups, player.properties.clone());

    if let Some(player) = state.get_player_mut(debtor) {
        player.money = 0;
        player.cups = 0;
    }
    if let Some(token) = creditor {
        if let Some(player) = state.get_player_mut(token) {
            player.credit(cash);
            player.cups += cups;
        }
    }

    for name in names {
        let mortgaged = state
            .board
            .property(name)
            .is_some_and(|square| square.mortgaged);
        state.transfer_property(name, creditor)?;
        match creditor {
            Some(token) if mortgaged => {
                let interest = state
                    .board
                    .property(name)
                    .map_or(0, |square| {
                        square.mortgage_value() * MORTGAGE_INTEREST_PERCENT / 100
                    });
                if let Some(player) = state.get_player_mut(token) {
                    player.debit(interest);
                }
            }
            None => {
                if let Some(square) = state.board.property_mut(name) {
                    square.mortgaged = false;
                    square.improvements = 0;
                }
            }
            _ => {}
        }
    }

    if let Some(player) = state.get_player_mut(debtor) {
        player.eliminate();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_game() -> GameState {
        GameState::new(11, &[('G', "Ann"), ('B', "Ben")]).unwrap()
    }

    #[test]
    fn test_affordable_debt_pays_immediately() {
        let mut game = setup_game();
        let status = enforce_payment(&mut game, 'G', 600, Some('B'));
        assert!(matches!(status, PaymentStatus::Paid));
        assert_eq!(game.get_player('G').unwrap().money, 900);
        assert_eq!(game.get_player('B').unwrap().money, 2100);
    }

    #[test]
    fn test_bank_debt_sinks_money() {
        let mut game = setup_game();
        let status = enforce_payment(&mut game, 'G', 600, None);
        assert!(matches!(status, PaymentStatus::Paid));
        assert_eq!(game.get_player('G').unwrap().money, 900);
        assert_eq!(game.get_player('B').unwrap().money, 1500);
    }

    #[test]
    fn test_shortfall_opens_liquidation() {
        let mut game = setup_game();
        game.get_player_mut('G').unwrap().money = 100;
        let status = enforce_payment(&mut game, 'G', 250, Some('B'));
        let PaymentStatus::NeedsLiquidation(liquidation) = status else {
            panic!("expected open debt");
        };
        assert_eq!(liquidation.debtor(), 'G');
        assert_eq!(liquidation.amount(), 250);
        assert_eq!(liquidation.shortfall(&game), 150);
        // nothing has been debited yet
        assert_eq!(game.get_player('G').unwrap().money, 100);
    }

    #[test]
    fn test_mortgage_raises_funds_then_pays() {
        let mut game = setup_game();
        game.transfer_property("DC", Some('G')).unwrap();
        game.get_player_mut('G').unwrap().money = 100;
        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 250, Some('B'))
        else {
            panic!("expected open debt");
        };
        let outcome = liquidation
            .apply(&mut game, &LiquidationAction::Mortgage("DC".to_string()))
            .unwrap();
        assert_eq!(outcome, Some(DebtOutcome::Paid));
        // 100 + 200 mortgage - 250 debt
        assert_eq!(game.get_player('G').unwrap().money, 50);
        assert_eq!(game.get_player('B').unwrap().money, 1750);
        assert!(game.board.property("DC").unwrap().mortgaged);
        assert!(!game.get_player('G').unwrap().bankrupt);
    }

    #[test]
    fn test_selling_improvements_raises_funds() {
        let mut game = setup_game();
        game.transfer_property("MC", Some('G')).unwrap();
        game.transfer_property("DC", Some('G')).unwrap();
        economy::improve(&mut game, 'G', "MC").unwrap();
        economy::improve(&mut game, 'G', "MC").unwrap();
        game.get_player_mut('G').unwrap().money = 0;

        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 150, None)
        else {
            panic!("expected open debt");
        };
        let action = LiquidationAction::SellImprovement("MC".to_string());
        assert_eq!(liquidation.apply(&mut game, &action).unwrap(), None);
        assert_eq!(
            liquidation.apply(&mut game, &action).unwrap(),
            Some(DebtOutcome::Paid)
        );
        assert_eq!(game.board.property("MC").unwrap().improvements, 0);
        // two refunds of 100, minus the 150 debt
        assert_eq!(game.get_player('G').unwrap().money, 50);
    }

    #[test]
    fn test_invalid_action_keeps_debt_open() {
        let mut game = setup_game();
        game.get_player_mut('G').unwrap().money = 0;
        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 100, None)
        else {
            panic!("expected open debt");
        };
        let err = liquidation
            .apply(&mut game, &LiquidationAction::Mortgage("DC".to_string()))
            .unwrap_err();
        assert!(matches!(err, GameError::NotOwner { .. }));
        // still open, surrender still possible
        assert_eq!(
            liquidation
                .apply(&mut game, &LiquidationAction::Surrender)
                .unwrap(),
            Some(DebtOutcome::Bankrupt)
        );
        assert!(liquidation
            .apply(&mut game, &LiquidationAction::Surrender)
            .is_err());
    }

    #[test]
    fn test_surrender_to_creditor_moves_everything() {
        let mut game = setup_game();
        game.transfer_property("MKV", Some('G')).unwrap();
        game.transfer_property("AL", Some('G')).unwrap();
        economy::mortgage(&mut game, 'G', "MKV").unwrap();
        {
            let debtor = game.get_player_mut('G').unwrap();
            debtor.money = 40;
            debtor.cups = 2;
        }

        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 500, Some('B'))
        else {
            panic!("expected open debt");
        };
        liquidation
            .apply(&mut game, &LiquidationAction::Surrender)
            .unwrap();

        let debtor = game.get_player('G').unwrap();
        assert!(debtor.bankrupt);
        assert_eq!(debtor.money, 0);
        assert_eq!(debtor.cups, 0);
        assert!(debtor.properties.is_empty());

        let creditor = game.get_player('B').unwrap();
        // 1500 + 40 cash - 10 interest on MKV's 100 mortgage value
        assert_eq!(creditor.money, 1530);
        assert_eq!(creditor.cups, 2);
        assert!(creditor.owns("MKV"));
        assert!(creditor.owns("AL"));
        // the title arrives still mortgaged
        assert!(game.board.property("MKV").unwrap().mortgaged);
        assert!(!game.board.property("AL").unwrap().mortgaged);
    }

    #[test]
    fn test_surrender_to_bank_cleans_titles() {
        let mut game = setup_game();
        game.transfer_property("MC", Some('G')).unwrap();
        game.transfer_property("DC", Some('G')).unwrap();
        economy::improve(&mut game, 'G', "MC").unwrap();
        game.transfer_property("MKV", Some('G')).unwrap();
        economy::mortgage(&mut game, 'G', "MKV").unwrap();
        {
            let debtor = game.get_player_mut('G').unwrap();
            debtor.money = 0;
            debtor.cups = 3;
        }

        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 5_000, None)
        else {
            panic!("expected open debt");
        };
        liquidation
            .apply(&mut game, &LiquidationAction::Surrender)
            .unwrap();

        let mkv = game.board.property("MKV").unwrap();
        assert_eq!(mkv.owner, None);
        assert!(!mkv.mortgaged);
        let mc = game.board.property("MC").unwrap();
        assert_eq!(mc.owner, None);
        assert_eq!(mc.improvements, 0);
        // cups leave circulation entirely
        assert_eq!(game.cups_in_circulation(), 0);
        assert!(game.get_player('G').unwrap().bankrupt);
    }

    #[test]
    fn test_surrender_to_an_unknown_creditor_is_rejected() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        game.get_player_mut('G').unwrap().money = 0;
        let PaymentStatus::NeedsLiquidation(mut liquidation) =
            enforce_payment(&mut game, 'G', 100, Some('Z'))
        else {
            panic!("expected open debt");
        };
        let err = liquidation
            .apply(&mut game, &LiquidationAction::Surrender)
            .unwrap_err();
        assert_eq!(err, GameError::UnknownPlayer('Z'));
        // the debt stays open and the estate stays put
        let debtor = game.get_player('G').unwrap();
        assert!(!debtor.bankrupt);
        assert!(debtor.owns("AL"));
        assert_eq!(game.board.property("AL").unwrap().owner, Some('G'));
    }
}
