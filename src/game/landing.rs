//! Landing resolution.
//!
//! Classifies what a square does to the player who just landed on it.
//! Resolution is pure; the turn engine applies the outcome, including the
//! dice-dependent rent amount and the random SLC and Needles Hall draws.

use crate::game::{GameState, Money, SquareKind, Token};

/// Flat tuition charge.
pub const TUITION_FLAT: Money = 300;

/// Tuition percentage alternative, applied to net worth.
pub const TUITION_PERCENT: Money = 10;

/// Coop fee charge.
pub const COOP_FEE: Money = 150;

/// What landing on a square does, before any money moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Unowned ownable square: the lander may buy it or send it to auction.
    PromptPurchase {
        /// Position of the square.
        position: u8,
        /// Asking price.
        price: Money,
    },
    /// Owned by someone else: rent may be owed.
    PayRent {
        /// Position of the square.
        position: u8,
        /// Who collects.
        owner: Token,
    },
    /// The lander already owns this square.
    OwnedNoOp,
    /// COLLECT OSAP: collect the payout.
    CollectOsap,
    /// TUITION: choose the flat charge or the net-worth percentage.
    PayTuition,
    /// COOP FEE: pay the fixed fee.
    PayCoopFee,
    /// NEEDLES HALL: random money delta.
    MoneyEvent,
    /// SLC: random relocation, then resolve the destination square.
    Relocate,
    /// GO TO TIMS: straight to the DC Tims Line.
    GoToJail,
    /// Nothing happens.
    NoEffect,
}

/// Classify what landing on `position` does for `token`.
#[must_use]
pub fn resolve_landing(state: &GameState, position: u8, token: Token) -> Landing {
    let Some(square) = state.board.square(position) else {
        return Landing::NoEffect;
    };
    if square.is_ownable() {
        return match square.owner {
            None => Landing::PromptPurchase {
                position,
                price: square.price,
            },
            Some(owner) if owner == token => Landing::OwnedNoOp,
            Some(owner) => Landing::PayRent { position, owner },
        };
    }
    match square.kind {
        SquareKind::CollectOsap => Landing::CollectOsap,
        SquareKind::Tuition => Landing::PayTuition,
        SquareKind::CoopFee => Landing::PayCoopFee,
        SquareKind::NeedlesHall => Landing::MoneyEvent,
        SquareKind::Slc => Landing::Relocate,
        SquareKind::GoToTims => Landing::GoToJail,
        _ => Landing::NoEffect,
    }
}

/// Money delta for a Needles Hall draw in `0..18`.
pub(crate) fn needles_delta(draw: u64) -> Money {
    match draw {
        0 => -200,
        1 | 2 => -100,
        3..=5 => -50,
        6..=11 => 25,
        12..=14 => 50,
        15 | 16 => 100,
        _ => 200,
    }
}

/// Where an SLC draw in `0..24` sends the lander.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlcMove {
    /// Move back this many squares.
    Back(u8),
    /// Move forward this many squares.
    Forward(u8),
    /// Go to the DC Tims Line, jailed.
    ToTims,
    /// Advance to COLLECT OSAP and collect.
    ToOsap,
}

/// Resolve an SLC draw in `0..24` into a move.
pub(crate) fn slc_move(draw: u64) -> SlcMove {
    match draw {
        0..=2 => SlcMove::Back(3),
        3..=6 => SlcMove::Back(2),
        7..=10 => SlcMove::Back(1),
        11..=14 => SlcMove::Forward(1),
        15..=18 => SlcMove::Forward(2),
        19..=21 => SlcMove::Forward(3),
        22 => SlcMove::ToTims,
        _ => SlcMove::ToOsap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    fn create_test_game() -> GameState {
        GameState::new(7, &[('G', "Alice"), ('B', "Bob")]).unwrap()
    }

    #[test]
    fn test_resolve_unowned_prompts_purchase() {
        let game = create_test_game();
        assert_eq!(
            resolve_landing(&game, 39, 'G'),
            Landing::PromptPurchase {
                position: 39,
                price: 400
            }
        );
    }

    #[test]
    fn test_resolve_owned_by_other_pays_rent() {
        let mut game = create_test_game();
        game.transfer_property("DC", Some('B')).unwrap();
        assert_eq!(
            resolve_landing(&game, 39, 'G'),
            Landing::PayRent {
                position: 39,
                owner: 'B'
            }
        );
    }

    #[test]
    fn test_resolve_own_square_is_noop() {
        let mut game = create_test_game();
        game.transfer_property("DC", Some('G')).unwrap();
        assert_eq!(resolve_landing(&game, 39, 'G'), Landing::OwnedNoOp);
    }

    #[test]
    fn test_resolve_action_squares() {
        let game = create_test_game();
        assert_eq!(resolve_landing(&game, 0, 'G'), Landing::CollectOsap);
        assert_eq!(resolve_landing(&game, 4, 'G'), Landing::PayTuition);
        assert_eq!(resolve_landing(&game, 38, 'G'), Landing::PayCoopFee);
        assert_eq!(resolve_landing(&game, 7, 'G'), Landing::MoneyEvent);
        assert_eq!(resolve_landing(&game, 2, 'G'), Landing::Relocate);
        assert_eq!(resolve_landing(&game, 30, 'G'), Landing::GoToJail);
        assert_eq!(resolve_landing(&game, 10, 'G'), Landing::NoEffect);
        assert_eq!(resolve_landing(&game, 20, 'G'), Landing::NoEffect);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let game = create_test_game();
        assert_eq!(resolve_landing(&game, 40, 'G'), Landing::NoEffect);
    }

    #[test]
    fn test_needles_distribution() {
        let mut count_negative = 0;
        let mut total: Money = 0;
        for draw in 0..18 {
            let delta = needles_delta(draw);
            if delta < 0 {
                count_negative += 1;
            }
            total += delta;
        }
        assert_eq!(count_negative, 6);
        // -200 - 200 - 150 + 150 + 150 + 200 + 200
        assert_eq!(total, 150);
        assert_eq!(needles_delta(0), -200);
        assert_eq!(needles_delta(17), 200);
    }

    #[test]
    fn test_slc_distribution() {
        let mut back = 0;
        let mut forward = 0;
        let mut tims = 0;
        let mut osap = 0;
        for draw in 0..24 {
            match slc_move(draw) {
                SlcMove::Back(n) => {
                    assert!((1..=3).contains(&n));
                    back += 1;
                }
                SlcMove::Forward(n) => {
                    assert!((1..=3).contains(&n));
                    forward += 1;
                }
                SlcMove::ToTims => tims += 1,
                SlcMove::ToOsap => osap += 1,
            }
        }
        assert_eq!(back, 11);
        assert_eq!(forward, 11);
        assert_eq!(tims, 1);
        assert_eq!(osap, 1);
    }
}
