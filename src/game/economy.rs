//! Economy operations: improvements, mortgages, and trades.
//!
//! Every operation validates first and mutates only on success. A failed
//! validation returns the reason and leaves the game untouched.
//!
//! # Money rules
//!
//! - Improving costs the block's fixed improvement price; selling one back
//!   refunds half.
//! - Mortgaging credits half the purchase price; lifting the mortgage costs
//!   that amount plus a 10% premium.
//! - Net worth counts cash, unmortgaged titles at full price, mortgaged
//!   titles at half, and improvements at cost.

use crate::error::{GameError, GameResult};
use crate::game::board::MAX_IMPROVEMENTS;
use crate::game::{Board, GameState, Money, Player, Square, Token};

/// Premium percentage charged on top of the mortgage value to lift it.
pub const UNMORTGAGE_PREMIUM_PERCENT: Money = 10;

/// One side of a trade: flat cash or a single named property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeSide {
    /// A flat amount of money.
    Cash(Money),
    /// An owned, unmortgaged, improvement-free property.
    Property(String),
}

/// A validated trade offer awaiting the counterparty's answer.
///
/// Validated again at execution time, since the board can change between
/// the proposal and the answer.
#[derive(Debug, Clone)]
pub struct TradeOffer {
    /// Who proposed the trade.
    pub from: Token,
    /// Who has to answer it.
    pub to: Token,
    /// What the proposer hands over.
    pub give: TradeSide,
    /// What the proposer gets back.
    pub receive: TradeSide,
}

/// Cost to lift the mortgage on a square.
#[must_use]
pub const fn unmortgage_cost(square: &Square) -> Money {
    let value = square.mortgage_value();
    value + value * UNMORTGAGE_PREMIUM_PERCENT / 100
}

/// A player's net worth.
///
/// Cash plus full price of unmortgaged titles, half price of mortgaged
/// ones, and every improvement at its purchase cost.
#[must_use]
pub fn net_worth(board: &Board, player: &Player) -> Money {
    let mut worth = player.money;
    for square in board.owned_by(player.token) {
        worth += if square.mortgaged {
            square.mortgage_value()
        } else {
            square.price
        };
        if let Some(cost) = square.improvement_cost() {
            worth += cost * Money::from(square.improvements);
        }
    }
    worth
}

/// Buy one improvement on an academic building.
///
/// Requires ownership of the whole block with nothing in it mortgaged,
/// a level below the maximum, and the cash to pay. Returns the amount
/// paid.
///
/// # Errors
///
/// See [`GameError`] for the individual validation failures.
pub fn improve(state: &mut GameState, token: Token, property: &str) -> GameResult<Money> {
    check_player(state, token)?;
    let (name, block, improvements) = {
        let square = lookup(&state.board, property)?;
        check_owner(square, token)?;
        let block = square
            .block()
            .ok_or_else(|| GameError::NotImprovable(square.name.to_string()))?;
        (square.name, block, square.improvements)
    };
    if !state.board.has_monopoly(token, block) || state.board.block_mortgaged(block) {
        return Err(GameError::MissingMonopoly(name.to_string()));
    }
    if improvements >= MAX_IMPROVEMENTS {
        return Err(GameError::MaxImprovements(name.to_string()));
    }
    let cost = block.improvement_cost();
    let player = require_player(state, token)?;
    if !player.can_afford(cost) {
        return Err(GameError::InsufficientFunds {
            needed: cost,
            available: player.money,
        });
    }
    player.debit(cost);
    if let Some(square) = state.board.property_mut(name) {
        square.improvements += 1;
    }
    Ok(cost)
}

/// Sell one improvement off an academic building for half its cost.
///
/// Returns the amount refunded.
///
/// # Errors
///
/// Fails when the caller does not own the building, the building cannot
/// take improvements, or it has none to sell.
pub fn degrade(state: &mut GameState, token: Token, property: &str) -> GameResult<Money> {
    check_player(state, token)?;
    let (name, refund) = {
        let square = lookup(&state.board, property)?;
        check_owner(square, token)?;
        let block = square
            .block()
            .ok_or_else(|| GameError::NotImprovable(square.name.to_string()))?;
        if square.improvements == 0 {
            return Err(GameError::NoImprovements(square.name.to_string()));
        }
        (square.name, block.improvement_cost() / 2)
    };
    if let Some(player) = state.get_player_mut(token) {
        player.credit(refund);
    }
    if let Some(square) = state.board.property_mut(name) {
        square.improvements -= 1;
    }
    Ok(refund)
}

/// Mortgage a property for half its purchase price.
///
/// Academic buildings require their whole block to be improvement free.
/// Returns the amount credited.
///
/// # Errors
///
/// Fails on non-ownership, an existing mortgage, or improvements anywhere
/// in the block.
pub fn mortgage(state: &mut GameState, token: Token, property: &str) -> GameResult<Money> {
    check_player(state, token)?;
    let (name, value, block) = {
        let square = lookup(&state.board, property)?;
        check_owner(square, token)?;
        if square.mortgaged {
            return Err(GameError::Mortgaged(square.name.to_string()));
        }
        (square.name, square.mortgage_value(), square.block())
    };
    if let Some(block) = block {
        if state.board.block_improved(block) {
            return Err(GameError::BlockHasImprovements(name.to_string()));
        }
    }
    if let Some(player) = state.get_player_mut(token) {
        player.credit(value);
    }
    if let Some(square) = state.board.property_mut(name) {
        square.mortgaged = true;
    }
    Ok(value)
}

/// Lift a mortgage for its value plus the premium.
///
/// Returns the amount paid.
///
/// # Errors
///
/// Fails on non-ownership, a clear title, or insufficient cash.
pub fn unmortgage(state: &mut GameState, token: Token, property: &str) -> GameResult<Money> {
    check_player(state, token)?;
    let (name, cost) = {
        let square = lookup(&state.board, property)?;
        check_owner(square, token)?;
        if !square.mortgaged {
            return Err(GameError::NotMortgaged(square.name.to_string()));
        }
        (square.name, unmortgage_cost(square))
    };
    let player = require_player(state, token)?;
    if !player.can_afford(cost) {
        return Err(GameError::InsufficientFunds {
            needed: cost,
            available: player.money,
        });
    }
    player.debit(cost);
    if let Some(square) = state.board.property_mut(name) {
        square.mortgaged = false;
    }
    Ok(cost)
}

/// Propose a trade between two players.
///
/// Both sides are validated now and again when the answer comes in.
///
/// # Errors
///
/// Fails when either party is unknown or bankrupt, the parties are the
/// same player, a cash side is negative, or a property side is not owned
/// outright (mortgaged or in an improved block).
pub fn propose_trade(
    state: &GameState,
    from: Token,
    to: Token,
    give: TradeSide,
    receive: TradeSide,
) -> GameResult<TradeOffer> {
    if from == to {
        return Err(GameError::TradeWithSelf);
    }
    check_player(state, from)?;
    check_player(state, to)?;
    validate_trade_side(state, from, &give)?;
    validate_trade_side(state, to, &receive)?;
    Ok(TradeOffer {
        from,
        to,
        give,
        receive,
    })
}

/// Answer a trade offer.
///
/// A rejection drops the offer without touching the game. An acceptance
/// re-validates both sides and then moves the cash and titles.
///
/// # Errors
///
/// On acceptance, fails with the same validations as
/// [`propose_trade`] plus affordability of cash sides.
pub fn respond_trade(state: &mut GameState, offer: &TradeOffer, accepted: bool) -> GameResult<()> {
    if !accepted {
        return Ok(());
    }
    check_player(state, offer.from)?;
    check_player(state, offer.to)?;
    validate_trade_side(state, offer.from, &offer.give)?;
    validate_trade_side(state, offer.to, &offer.receive)?;
    check_trade_affordable(state, offer.from, &offer.give)?;
    check_trade_affordable(state, offer.to, &offer.receive)?;

    apply_trade_side(state, offer.from, offer.to, &offer.give)?;
    apply_trade_side(state, offer.to, offer.from, &offer.receive)?;
    Ok(())
}

/// Reject players that are unknown or already out of the game.
fn check_player(state: &GameState, token: Token) -> GameResult<()> {
    let player = state
        .get_player(token)
        .ok_or(GameError::UnknownPlayer(token))?;
    if player.bankrupt {
        return Err(GameError::PlayerBankrupt(token));
    }
    Ok(())
}

fn lookup<'a>(board: &'a Board, name: &str) -> GameResult<&'a Square> {
    board
        .property(name)
        .ok_or_else(|| GameError::UnknownProperty(name.to_string()))
}

fn check_owner(square: &Square, token: Token) -> GameResult<()> {
    if square.owner == Some(token) {
        Ok(())
    } else {
        Err(GameError::NotOwner {
            property: square.name.to_string(),
            token,
        })
    }
}

fn require_player(state: &mut GameState, token: Token) -> GameResult<&mut Player> {
    state
        .get_player_mut(token)
        .ok_or(GameError::UnknownPlayer(token))
}

fn validate_trade_side(state: &GameState, giver: Token, side: &TradeSide) -> GameResult<()> {
    match side {
        TradeSide::Cash(amount) => {
            if *amount < 0 {
                return Err(GameError::NegativeAmount(*amount));
            }
            Ok(())
        }
        TradeSide::Property(name) => {
            let square = lookup(&state.board, name)?;
            check_owner(square, giver)?;
            if square.mortgaged {
                return Err(GameError::Mortgaged(square.name.to_string()));
            }
            if let Some(block) = square.block() {
                if state.board.block_improved(block) {
                    return Err(GameError::BlockHasImprovements(square.name.to_string()));
                }
            }
            Ok(())
        }
    }
}

fn check_trade_affordable(state: &GameState, giver: Token, side: &TradeSide) -> GameResult<()> {
    if let TradeSide::Cash(amount) = side {
        let player = state
            .get_player(giver)
            .ok_or(GameError::UnknownPlayer(giver))?;
        if !player.can_afford(*amount) {
            return Err(GameError::InsufficientFunds {
                needed: *amount,
                available: player.money,
            });
        }
    }
    Ok(())
}

fn apply_trade_side(
    state: &mut GameState,
    giver: Token,
    taker: Token,
    side: &TradeSide,
) -> GameResult<()> {
    match side {
        TradeSide::Cash(amount) => {
            if let Some(player) = state.get_player_mut(giver) {
                player.debit(*amount);
            }
            if let Some(player) = state.get_player_mut(taker) {
                player.credit(*amount);
            }
            Ok(())
        }
        TradeSide::Property(name) => state.transfer_property(name, Some(taker)),
    }
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove the unmortgage premium never undercuts the mortgage value.
    #[kani::proof]
    fn prove_unmortgage_cost_covers_value() {
        let price: Money = kani::any();
        if !(0..=1_000_000).contains(&price) {
            return;
        }
        let square = Square {
            name: "X",
            kind: crate::game::SquareKind::Residence,
            price,
            owner: None,
            mortgaged: true,
            improvements: 0,
        };
        assert!(unmortgage_cost(&square) >= square.mortgage_value());
    }

    /// Prove mortgage value halving never goes negative for valid prices.
    #[kani::proof]
    fn prove_mortgage_value_non_negative() {
        let price: Money = kani::any();
        if price < 0 {
            return;
        }
        let square = Square {
            name: "X",
            kind: crate::game::SquareKind::Gym,
            price,
            owner: None,
            mortgaged: false,
            improvements: 0,
        };
        assert!(square.mortgage_value() >= 0);
        assert!(square.mortgage_value() <= price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_game() -> GameState {
        GameState::new(99, &[('G', "Alice"), ('B', "Bob")]).unwrap()
    }

    fn setup_math_monopoly(game: &mut GameState, token: Token) {
        game.transfer_property("MC", Some(token)).unwrap();
        game.transfer_property("DC", Some(token)).unwrap();
    }

    #[test]
    fn test_improve_requires_monopoly() {
        let mut game = setup_game();
        game.transfer_property("MC", Some('G')).unwrap();
        assert_eq!(
            improve(&mut game, 'G', "MC").unwrap_err(),
            GameError::MissingMonopoly("MC".to_string())
        );
    }

    #[test]
    fn test_improve_happy_path() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        let paid = improve(&mut game, 'G', "MC").unwrap();
        assert_eq!(paid, 200);
        assert_eq!(game.board.property("MC").unwrap().improvements, 1);
        assert_eq!(game.get_player('G').unwrap().money, 1300);
    }

    #[test]
    fn test_improve_rejects_non_owner() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        assert!(matches!(
            improve(&mut game, 'B', "MC").unwrap_err(),
            GameError::NotOwner { .. }
        ));
    }

    #[test]
    fn test_improve_rejects_residence() {
        let mut game = setup_game();
        game.transfer_property("MKV", Some('G')).unwrap();
        assert_eq!(
            improve(&mut game, 'G', "MKV").unwrap_err(),
            GameError::NotImprovable("MKV".to_string())
        );
    }

    #[test]
    fn test_improve_blocked_by_mortgaged_block_member() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        mortgage(&mut game, 'G', "DC").unwrap();
        assert_eq!(
            improve(&mut game, 'G', "MC").unwrap_err(),
            GameError::MissingMonopoly("MC".to_string())
        );
    }

    #[test]
    fn test_improve_stops_at_max() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        game.get_player_mut('G').unwrap().money = 10_000;
        for _ in 0..5 {
            improve(&mut game, 'G', "MC").unwrap();
        }
        assert_eq!(
            improve(&mut game, 'G', "MC").unwrap_err(),
            GameError::MaxImprovements("MC".to_string())
        );
    }

    #[test]
    fn test_improve_needs_cash() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        game.get_player_mut('G').unwrap().money = 150;
        assert_eq!(
            improve(&mut game, 'G', "MC").unwrap_err(),
            GameError::InsufficientFunds {
                needed: 200,
                available: 150
            }
        );
    }

    #[test]
    fn test_degrade_refunds_half() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        improve(&mut game, 'G', "MC").unwrap();
        let before = game.get_player('G').unwrap().money;
        let refund = degrade(&mut game, 'G', "MC").unwrap();
        assert_eq!(refund, 100);
        assert_eq!(game.get_player('G').unwrap().money, before + 100);
        assert_eq!(game.board.property("MC").unwrap().improvements, 0);
    }

    #[test]
    fn test_degrade_needs_improvements() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        assert_eq!(
            degrade(&mut game, 'G', "MC").unwrap_err(),
            GameError::NoImprovements("MC".to_string())
        );
    }

    #[test]
    fn test_mortgage_credits_half_price() {
        let mut game = setup_game();
        game.transfer_property("DC", Some('G')).unwrap();
        let credited = mortgage(&mut game, 'G', "DC").unwrap();
        assert_eq!(credited, 200);
        assert!(game.board.property("DC").unwrap().mortgaged);
        assert_eq!(game.get_player('G').unwrap().money, 1700);
    }

    #[test]
    fn test_mortgage_twice_fails() {
        let mut game = setup_game();
        game.transfer_property("DC", Some('G')).unwrap();
        mortgage(&mut game, 'G', "DC").unwrap();
        assert_eq!(
            mortgage(&mut game, 'G', "DC").unwrap_err(),
            GameError::Mortgaged("DC".to_string())
        );
    }

    #[test]
    fn test_mortgage_blocked_by_block_improvements() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        improve(&mut game, 'G', "MC").unwrap();
        // DC itself is unimproved, but its block is not
        assert_eq!(
            mortgage(&mut game, 'G', "DC").unwrap_err(),
            GameError::BlockHasImprovements("DC".to_string())
        );
    }

    #[test]
    fn test_unmortgage_costs_value_plus_premium() {
        let mut game = setup_game();
        game.transfer_property("DC", Some('G')).unwrap();
        mortgage(&mut game, 'G', "DC").unwrap();
        let paid = unmortgage(&mut game, 'G', "DC").unwrap();
        assert_eq!(paid, 220);
        assert!(!game.board.property("DC").unwrap().mortgaged);
        // net cost of the round trip is the 10% premium
        assert_eq!(game.get_player('G').unwrap().money, 1480);
    }

    #[test]
    fn test_unmortgage_requires_mortgage_and_cash() {
        let mut game = setup_game();
        game.transfer_property("DC", Some('G')).unwrap();
        assert_eq!(
            unmortgage(&mut game, 'G', "DC").unwrap_err(),
            GameError::NotMortgaged("DC".to_string())
        );
        mortgage(&mut game, 'G', "DC").unwrap();
        game.get_player_mut('G').unwrap().money = 100;
        assert_eq!(
            unmortgage(&mut game, 'G', "DC").unwrap_err(),
            GameError::InsufficientFunds {
                needed: 220,
                available: 100
            }
        );
    }

    #[test]
    fn test_net_worth_counts_everything() {
        let mut game = setup_game();
        setup_math_monopoly(&mut game, 'G');
        game.transfer_property("MKV", Some('G')).unwrap();
        improve(&mut game, 'G', "MC").unwrap();
        mortgage(&mut game, 'G', "MKV").unwrap();
        let player = game.get_player('G').unwrap();
        // cash 1500 - 200 + 100 = 1400
        assert_eq!(player.money, 1400);
        // 1400 + MC 350 + DC 400 + MKV mortgaged 100 + one improvement 200
        assert_eq!(net_worth(&game.board, player), 2450);
    }

    #[test]
    fn test_trade_property_for_cash() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        let offer = propose_trade(
            &game,
            'G',
            'B',
            TradeSide::Property("AL".to_string()),
            TradeSide::Cash(500),
        )
        .unwrap();
        respond_trade(&mut game, &offer, true).unwrap();
        assert_eq!(game.board.property("AL").unwrap().owner, Some('B'));
        assert_eq!(game.get_player('G').unwrap().money, 2000);
        assert_eq!(game.get_player('B').unwrap().money, 1000);
    }

    #[test]
    fn test_trade_rejection_changes_nothing() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        let offer = propose_trade(
            &game,
            'G',
            'B',
            TradeSide::Property("AL".to_string()),
            TradeSide::Cash(500),
        )
        .unwrap();
        respond_trade(&mut game, &offer, false).unwrap();
        assert_eq!(game.board.property("AL").unwrap().owner, Some('G'));
        assert_eq!(game.get_player('B').unwrap().money, 1500);
    }

    #[test]
    fn test_trade_rejects_mortgaged_and_improved() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        mortgage(&mut game, 'G', "AL").unwrap();
        assert_eq!(
            propose_trade(
                &game,
                'G',
                'B',
                TradeSide::Property("AL".to_string()),
                TradeSide::Cash(10),
            )
            .unwrap_err(),
            GameError::Mortgaged("AL".to_string())
        );

        setup_math_monopoly(&mut game, 'B');
        improve(&mut game, 'B', "DC").unwrap();
        assert_eq!(
            propose_trade(
                &game,
                'B',
                'G',
                TradeSide::Property("MC".to_string()),
                TradeSide::Cash(10),
            )
            .unwrap_err(),
            GameError::BlockHasImprovements("MC".to_string())
        );
    }

    #[test]
    fn test_trade_with_self_rejected() {
        let game = setup_game();
        assert_eq!(
            propose_trade(&game, 'G', 'G', TradeSide::Cash(1), TradeSide::Cash(1)).unwrap_err(),
            GameError::TradeWithSelf
        );
    }

    #[test]
    fn test_trade_cash_must_be_affordable_at_execution() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        let offer = propose_trade(
            &game,
            'G',
            'B',
            TradeSide::Property("AL".to_string()),
            TradeSide::Cash(500),
        )
        .unwrap();
        game.get_player_mut('B').unwrap().money = 400;
        assert_eq!(
            respond_trade(&mut game, &offer, true).unwrap_err(),
            GameError::InsufficientFunds {
                needed: 500,
                available: 400
            }
        );
        // nothing moved
        assert_eq!(game.board.property("AL").unwrap().owner, Some('G'));
    }

    #[test]
    fn test_trade_property_for_property() {
        let mut game = setup_game();
        game.transfer_property("AL", Some('G')).unwrap();
        game.transfer_property("DC", Some('B')).unwrap();
        let offer = propose_trade(
            &game,
            'G',
            'B',
            TradeSide::Property("AL".to_string()),
            TradeSide::Property("DC".to_string()),
        )
        .unwrap();
        respond_trade(&mut game, &offer, true).unwrap();
        assert_eq!(game.board.property("AL").unwrap().owner, Some('B'));
        assert_eq!(game.board.property("DC").unwrap().owner, Some('G'));
        assert!(game.get_player('G').unwrap().owns("DC"));
        assert!(!game.get_player('G').unwrap().owns("AL"));
    }

    #[test]
    fn test_negative_cash_rejected() {
        let game = setup_game();
        assert_eq!(
            propose_trade(&game, 'G', 'B', TradeSide::Cash(-5), TradeSide::Cash(0)).unwrap_err(),
            GameError::NegativeAmount(-5)
        );
    }
}
