//! Saving and loading games as flat text files.
//!
//! The format is whitespace-delimited and line-oriented:
//!
//! - Line 1: number of players
//! - One line per player: `name token cups money position`. When the
//!   position is the DC Tims Line, one more field follows: `0` for a
//!   player just visiting, or `1 t` for a jailed player with `t` failed
//!   escape attempts so far.
//! - One line per ownable square: `name owner improvements`. The owner is
//!   a player name or `BANK`. Improvements are `-1` for a mortgaged
//!   title, otherwise the improvement count (always `0` for residences
//!   and gyms). Squares left out of the file stay with the bank.
//!
//! Bankrupt players are gone from the game and are not written. Dice
//! state is not persisted; a loaded game continues with a fresh seed and
//! play resuming from the first listed player.

use crate::game::{
    check_invariants, token_name, Board, GameState, Money, Player, Token, BOARD_SIZE,
    JAIL_POSITION, JAIL_ROLL_ATTEMPTS, MAX_IMPROVEMENTS, MAX_PLAYERS, MIN_PLAYERS,
};
use std::fs::File;
use std::io::{self, Read as IoRead, Write as IoWrite};
use std::path::Path;

/// Owner field marking an unowned title.
const BANK_OWNER: &str = "BANK";

/// Error type for save-file operations.
#[derive(Debug)]
pub enum SaveError {
    /// Underlying file I/O failed.
    Io(io::Error),
    /// A line of the file did not parse.
    Parse {
        /// 1-indexed line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
    /// The file parsed but describes a game the engine cannot resume.
    State(String),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "save file I/O failed: {e}"),
            Self::Parse { line, message } => write!(f, "line {line}: {message}"),
            Self::State(message) => write!(f, "inconsistent save file: {message}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { .. } | Self::State(_) => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Write the game to a save file.
///
/// # Errors
///
/// Returns an error if the file cannot be written, if fewer than two
/// solvent players remain, or if a player name cannot be represented in
/// the format (empty, containing whitespace, duplicated, or `BANK`).
pub fn save_game(state: &GameState, path: &Path) -> Result<(), SaveError> {
    let text = encode(state)?;
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Read a game back from a save file.
///
/// The seed feeds the dice for the resumed game; it is independent of
/// whatever seed the saved game was running with.
///
/// # Errors
///
/// Returns an error if the file cannot be read, if any line fails to
/// parse, or if the assembled game violates a board or player
/// consistency rule (such as improvements on a split block).
pub fn load_game(path: &Path, seed: u64) -> Result<GameState, SaveError> {
    let mut text = String::new();
    File::open(path)?.read_to_string(&mut text)?;
    parse(&text, seed)
}

fn encode(state: &GameState) -> Result<String, SaveError> {
    let live: Vec<&Player> = state.players.iter().filter(|p| !p.bankrupt).collect();
    if live.len() < MIN_PLAYERS {
        return Err(SaveError::State(
            "fewer than two solvent players left".to_string(),
        ));
    }
    for player in &live {
        if player.name.is_empty() || player.name.contains(char::is_whitespace) {
            return Err(SaveError::State(format!(
                "player name {:?} cannot be written to a save file",
                player.name
            )));
        }
        if player.name == BANK_OWNER {
            return Err(SaveError::State(format!(
                "player name {BANK_OWNER} is reserved for the bank"
            )));
        }
        if live.iter().filter(|p| p.name == player.name).count() > 1 {
            return Err(SaveError::State(format!(
                "duplicate player name: {}",
                player.name
            )));
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", live.len()));
    for player in &live {
        out.push_str(&format!(
            "{} {} {} {} {}",
            player.name, player.token, player.cups, player.money, player.position
        ));
        if player.position == JAIL_POSITION {
            if player.in_jail {
                out.push_str(&format!(" 1 {}", player.jail_turns));
            } else {
                out.push_str(" 0");
            }
        }
        out.push('\n');
    }
    for (_, square) in state.board.iter().filter(|(_, s)| s.is_ownable()) {
        let owner = square
            .owner
            .and_then(|token| state.get_player(token))
            .map_or(BANK_OWNER, |p| p.name.as_str());
        let improvements = if square.mortgaged {
            -1
        } else {
            Money::from(square.improvements)
        };
        out.push_str(&format!("{} {owner} {improvements}\n", square.name));
    }
    Ok(out)
}

fn parse(text: &str, seed: u64) -> Result<GameState, SaveError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut cursor = 0;

    let (lineno, line) = next_record(&lines, &mut cursor)?;
    let count_field = first_field(lineno, line)?;
    let count: usize = parse_field(lineno, count_field, "player count")?;
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("invalid player count: {count} (need 2 to 8)"),
        });
    }

    let mut players = Vec::with_capacity(count);
    for _ in 0..count {
        let (lineno, line) = next_record(&lines, &mut cursor)?;
        let player = parse_player(lineno, line)?;
        if players.iter().any(|p: &Player| p.token == player.token) {
            return Err(SaveError::Parse {
                line: lineno,
                message: format!("token {} is already taken", player.token),
            });
        }
        if players.iter().any(|p: &Player| p.name == player.name) {
            return Err(SaveError::Parse {
                line: lineno,
                message: format!("duplicate player name: {}", player.name),
            });
        }
        players.push(player);
    }

    let mut board = Board::new();
    let mut seen: Vec<&'static str> = Vec::new();
    while let Ok((lineno, line)) = next_record(&lines, &mut cursor) {
        apply_title(&mut board, &mut players, &mut seen, lineno, line)?;
    }

    let state = GameState::from_parts(board, players, seed);
    if let Some(violation) = check_invariants(&state).into_iter().next() {
        return Err(SaveError::State(violation.to_string()));
    }
    Ok(state)
}

/// Advance to the next non-blank line, returning its 1-indexed number.
fn next_record<'a>(lines: &[&'a str], cursor: &mut usize) -> Result<(usize, &'a str), SaveError> {
    while let Some(line) = lines.get(*cursor) {
        *cursor += 1;
        if !line.trim().is_empty() {
            return Ok((*cursor, line));
        }
    }
    Err(SaveError::Parse {
        line: lines.len(),
        message: "unexpected end of file".to_string(),
    })
}

fn first_field(lineno: usize, line: &str) -> Result<&str, SaveError> {
    let mut fields = line.split_whitespace();
    let first = fields.next().ok_or_else(|| SaveError::Parse {
        line: lineno,
        message: "empty record".to_string(),
    })?;
    if fields.next().is_some() {
        return Err(SaveError::Parse {
            line: lineno,
            message: "unexpected trailing fields".to_string(),
        });
    }
    Ok(first)
}

fn parse_field<T: std::str::FromStr>(
    lineno: usize,
    value: &str,
    what: &str,
) -> Result<T, SaveError> {
    value.parse().map_err(|_| SaveError::Parse {
        line: lineno,
        message: format!("invalid {what}: {value}"),
    })
}

fn parse_player(lineno: usize, line: &str) -> Result<Player, SaveError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(SaveError::Parse {
            line: lineno,
            message: "expected `name token cups money position`".to_string(),
        });
    }

    let name = fields[0];
    let token = parse_token(lineno, fields[1])?;
    let cups: u8 = parse_field(lineno, fields[2], "cup count")?;
    let money: Money = parse_field(lineno, fields[3], "money")?;
    let position: u8 = parse_field(lineno, fields[4], "position")?;
    if position >= BOARD_SIZE {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("position out of range: {position}"),
        });
    }

    let (in_jail, jail_turns, used) = if position == JAIL_POSITION {
        match fields.get(5).copied() {
            Some("0") => (false, 0, 6),
            Some("1") => {
                let turns: u8 = parse_field(
                    lineno,
                    fields.get(6).copied().unwrap_or(""),
                    "jail turn count",
                )?;
                if turns >= JAIL_ROLL_ATTEMPTS {
                    return Err(SaveError::Parse {
                        line: lineno,
                        message: format!("jail turn count out of range: {turns}"),
                    });
                }
                (true, turns, 7)
            }
            _ => {
                return Err(SaveError::Parse {
                    line: lineno,
                    message: "players on the DC Tims Line need a jail flag (0, or 1 with turns)"
                        .to_string(),
                });
            }
        }
    } else {
        (false, 0, 5)
    };
    if fields.len() > used {
        return Err(SaveError::Parse {
            line: lineno,
            message: "unexpected trailing fields".to_string(),
        });
    }

    let mut player = Player::new(token, name);
    player.cups = cups;
    player.money = money;
    player.position = position;
    player.in_jail = in_jail;
    player.jail_turns = jail_turns;
    Ok(player)
}

fn parse_token(lineno: usize, field: &str) -> Result<Token, SaveError> {
    let mut chars = field.chars();
    let token = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(SaveError::Parse {
                line: lineno,
                message: format!("token must be a single character: {field}"),
            });
        }
    };
    if token_name(token).is_none() {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("unknown token: {token}"),
        });
    }
    Ok(token)
}

fn apply_title(
    board: &mut Board,
    players: &mut [Player],
    seen: &mut Vec<&'static str>,
    lineno: usize,
    line: &str,
) -> Result<(), SaveError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(SaveError::Parse {
            line: lineno,
            message: "expected `name owner improvements`".to_string(),
        });
    }

    let improvements: Money = parse_field(lineno, fields[2], "improvement count")?;
    if !(-1..=Money::from(MAX_IMPROVEMENTS)).contains(&improvements) {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("improvement count out of range: {improvements}"),
        });
    }

    let owner_index = if fields[1] == BANK_OWNER {
        if improvements != 0 {
            return Err(SaveError::Parse {
                line: lineno,
                message: format!("bank titles carry no mortgage or improvements: {}", fields[0]),
            });
        }
        None
    } else {
        let index = players
            .iter()
            .position(|p| p.name == fields[1])
            .ok_or_else(|| SaveError::Parse {
                line: lineno,
                message: format!("unknown owner: {}", fields[1]),
            })?;
        Some(index)
    };

    let Some(square) = board.property_mut(fields[0]) else {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("unknown property: {}", fields[0]),
        });
    };
    if seen.contains(&square.name) {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("duplicate record for {}", square.name),
        });
    }
    seen.push(square.name);

    if improvements > 0 && square.improvement_cost().is_none() {
        return Err(SaveError::Parse {
            line: lineno,
            message: format!("{} cannot take improvements", square.name),
        });
    }

    let name = square.name;
    if let Some(index) = owner_index {
        square.owner = Some(players[index].token);
        if improvements == -1 {
            square.mortgaged = true;
        } else {
            square.improvements = u8::try_from(improvements).unwrap_or(0);
        }
        players[index].add_property(name);
    }
    Ok(())
}
