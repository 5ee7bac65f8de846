//! Rent computation.
//!
//! Rent is context sensitive and computed only at the moment it is owed:
//! academic buildings look at improvement level and monopoly status,
//! residences at how many the owner holds, gyms at the dice total that
//! landed the payer there.

use crate::game::{Board, Money, Square, SquareKind};

/// Rent by residence count, indexed by count - 1.
const RESIDENCE_RENT: [Money; 4] = [25, 50, 100, 200];

/// Gym rent multiplier when the owner holds one gym.
const GYM_SINGLE_MULTIPLIER: Money = 4;

/// Gym rent multiplier when the owner holds both gyms.
const GYM_DOUBLE_MULTIPLIER: Money = 10;

/// Rent for an academic building.
///
/// A building earns double its base rent while its whole block is in one
/// hand with no improvements anywhere on it. Improvements read straight
/// from the rent table.
#[must_use]
pub fn academic_rent(
    rent_table: &[Money; 6],
    improvements: u8,
    unimproved_monopoly: bool,
) -> Money {
    let level = usize::from(improvements).min(rent_table.len() - 1);
    let base = rent_table[level];
    if unimproved_monopoly && improvements == 0 {
        base * 2
    } else {
        base
    }
}

/// Rent for a residence, by how many residences the owner holds.
#[must_use]
pub fn residence_rent(count: usize) -> Money {
    if count == 0 {
        return 0;
    }
    RESIDENCE_RENT[count.min(RESIDENCE_RENT.len()) - 1]
}

/// Rent for a gym, a multiple of the dice total that landed here.
#[must_use]
pub fn gym_rent(gyms_owned: usize, dice_total: u8) -> Money {
    let multiplier = match gyms_owned {
        0 => 0,
        1 => GYM_SINGLE_MULTIPLIER,
        _ => GYM_DOUBLE_MULTIPLIER,
    };
    multiplier * Money::from(dice_total)
}

/// Full contextual rent for landing on a square.
///
/// Returns zero whenever no rent changes hands: action squares, unowned
/// titles, mortgaged titles, and titles whose owner is sitting in the
/// DC Tims Line.
#[must_use]
pub fn rent_due(board: &Board, square: &Square, dice_total: u8, owner_in_jail: bool) -> Money {
    let Some(owner) = square.owner else {
        return 0;
    };
    if square.mortgaged || owner_in_jail {
        return 0;
    }
    match square.kind {
        SquareKind::Academic { block, rent } => academic_rent(
            &rent,
            square.improvements,
            board.has_monopoly(owner, block) && !board.block_improved(block),
        ),
        SquareKind::Residence => residence_rent(board.residences_owned(owner)),
        SquareKind::Gym => gym_rent(board.gyms_owned(owner), dice_total),
        _ => 0,
    }
}
