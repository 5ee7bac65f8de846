//! Game invariants - sanity checks that detect bugs.
//!
//! Every engine operation is supposed to keep these true between turns. If
//! one trips, the engine has a bug; none of these are gameplay rules a
//! player could break on purpose.

use crate::game::board::{BOARD_SIZE, JAIL_POSITION, MAX_IMPROVEMENTS};
use crate::game::state::MAX_CUPS;
use crate::game::GameState;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    // Title-side ownership consistency
    for (position, square) in state.board.iter() {
        let Some(owner) = square.owner else {
            if square.mortgaged || square.improvements > 0 {
                violations.push(InvariantViolation {
                    message: format!(
                        "Bank-owned {} at {} carries mortgage or improvements",
                        square.name, position
                    ),
                });
            }
            continue;
        };
        match state.get_player(owner) {
            None => violations.push(InvariantViolation {
                message: format!("{} is owned by unknown token {owner}", square.name),
            }),
            Some(player) if player.bankrupt => violations.push(InvariantViolation {
                message: format!("{} is owned by bankrupt player {owner}", square.name),
            }),
            Some(player) if !player.owns(square.name) => violations.push(InvariantViolation {
                message: format!(
                    "{} claims owner {owner} who does not list it",
                    square.name
                ),
            }),
            Some(_) => {}
        }

        if square.improvements > MAX_IMPROVEMENTS {
            violations.push(InvariantViolation {
                message: format!(
                    "{} has improvement level {} > max {}",
                    square.name, square.improvements, MAX_IMPROVEMENTS
                ),
            });
        }
        if square.mortgaged && square.improvements > 0 {
            violations.push(InvariantViolation {
                message: format!("{} is mortgaged while improved", square.name),
            });
        }
        if square.improvements > 0 {
            match square.block() {
                None => violations.push(InvariantViolation {
                    message: format!("{} is improved but is not an academic building", square.name),
                }),
                Some(block) => {
                    if !state.board.has_monopoly(owner, block) {
                        violations.push(InvariantViolation {
                            message: format!(
                                "{} is improved without {owner} holding the whole block",
                                square.name
                            ),
                        });
                    }
                }
            }
        }
    }

    // Player-side ownership consistency
    for player in &state.players {
        for name in &player.properties {
            let consistent = state
                .board
                .property(name)
                .is_some_and(|square| square.owner == Some(player.token));
            if !consistent {
                violations.push(InvariantViolation {
                    message: format!(
                        "Player {} lists {name} but the title disagrees",
                        player.token
                    ),
                });
            }
        }
        if player.bankrupt && !player.properties.is_empty() {
            violations.push(InvariantViolation {
                message: format!(
                    "Bankrupt player {} still lists {} properties",
                    player.token,
                    player.properties.len()
                ),
            });
        }
        if player.position >= BOARD_SIZE {
            violations.push(InvariantViolation {
                message: format!(
                    "Player {} is at position {} off the board",
                    player.token, player.position
                ),
            });
        }
        if player.in_jail && player.position != JAIL_POSITION {
            violations.push(InvariantViolation {
                message: format!(
                    "Player {} is jailed but standing at {}",
                    player.token, player.position
                ),
            });
        }
        if !player.in_jail && player.jail_turns != 0 {
            violations.push(InvariantViolation {
                message: format!(
                    "Player {} has {} failed escape rolls outside jail",
                    player.token, player.jail_turns
                ),
            });
        }
    }

    // Cup circulation cap
    let cups = state.cups_in_circulation();
    if cups > MAX_CUPS {
        violations.push(InvariantViolation {
            message: format!("{cups} cups in circulation exceeds the cap of {MAX_CUPS}"),
        });
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::economy;

    fn create_valid_game() -> GameState {
        let mut game = GameState::new(7, &[('G', "Ann"), ('B', "Ben")]).unwrap();
        game.transfer_property("MC", Some('G')).unwrap();
        game.transfer_property("DC", Some('G')).unwrap();
        game.transfer_property("PAC", Some('B')).unwrap();
        economy::improve(&mut game, 'G', "MC").unwrap();
        economy::mortgage(&mut game, 'B', "PAC").unwrap();
        game
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn test_orphaned_title_detected() {
        let mut game = create_valid_game();
        // title says B, the player list never heard of it
        game.board.property_mut("MKV").unwrap().owner = Some('B');

        let violations = check_invariants(&game);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("MKV"));
    }

    #[test]
    fn test_phantom_listing_detected() {
        let mut game = create_valid_game();
        game.get_player_mut('B').unwrap().add_property("REV");

        let violations = check_invariants(&game);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("REV"));
    }

    #[test]
    fn test_bankrupt_owner_detected() {
        let mut game = create_valid_game();
        game.get_player_mut('B').unwrap().bankrupt = true;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("bankrupt")));
    }

    #[test]
    fn test_mortgaged_improvement_detected() {
        let mut game = create_valid_game();
        game.board.property_mut("MC").unwrap().mortgaged = true;

        let violations = check_invariants(&game);
        assert!(violations
            .iter()
            .any(|v| v.message.contains("mortgaged while improved")));
    }

    #[test]
    fn test_improvement_without_monopoly_detected() {
        let mut game = create_valid_game();
        // break the Math monopoly while MC is still improved
        game.transfer_property("DC", Some('B')).unwrap();

        let violations = check_invariants(&game);
        assert!(violations
            .iter()
            .any(|v| v.message.contains("whole block")));
    }

    #[test]
    fn test_bank_title_with_mortgage_detected() {
        let mut game = create_valid_game();
        game.board.property_mut("REV").unwrap().mortgaged = true;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("Bank-owned")));
    }

    #[test]
    fn test_jail_position_mismatch_detected() {
        let mut game = create_valid_game();
        {
            let player = game.get_player_mut('G').unwrap();
            player.go_to_jail();
            player.position = 12;
        }

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("jailed")));
    }

    #[test]
    fn test_stale_jail_counter_detected() {
        let mut game = create_valid_game();
        game.get_player_mut('G').unwrap().jail_turns = 1;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("escape")));
    }

    #[test]
    fn test_cup_overflow_detected() {
        let mut game = create_valid_game();
        game.get_player_mut('G').unwrap().cups = 5;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("cups")));
    }

    #[test]
    fn test_off_board_position_detected() {
        let mut game = create_valid_game();
        game.get_player_mut('B').unwrap().position = 40;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("off the board")));
    }
}
