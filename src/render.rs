//! Text rendering of the board and player holdings.
//!
//! The board draws as the classic perimeter ring: positions 20..=30
//! across the top, 31..=39 down the right side, 10 down to 0 across the
//! bottom (COLLECT OSAP in the bottom-right corner), and 19 down to 11
//! up the left side. Each cell shows improvement ticks for academic
//! buildings, the square name, and the tokens of players standing there.
//! Everything returns a `String`; callers decide where it goes.

use crate::game::{net_worth, Board, GameState, Player};

/// Interior width of one board cell.
const CELL_WIDTH: usize = 9;

/// Cells along one edge of the ring.
const RING_COLUMNS: usize = 11;

/// Space between the left and right columns of the ring interior.
const MIDDLE_GAP: usize = RING_COLUMNS * (CELL_WIDTH + 1) + 1 - 2 * (CELL_WIDTH + 2);

/// Render the full board with a player status footer.
#[must_use]
pub fn render_board(state: &GameState) -> String {
    let mut out = String::new();
    push_separator(&mut out, RING_COLUMNS);

    let top: Vec<u8> = (20..=30).collect();
    push_edge_row(&mut out, state, &top);

    for row in 0..9u8 {
        push_middle_row(&mut out, state, 19 - row, 31 + row);
    }

    let bottom: Vec<u8> = (0..=10).rev().collect();
    push_edge_row(&mut out, state, &bottom);

    out.push('\n');
    out.push_str("=== PLAYER STATUS ===\n");
    for player in state.players.iter().filter(|p| !p.bankrupt) {
        out.push_str(&format!(
            "Player {} ({}) has ${}\n",
            player.token, player.name, player.money
        ));
    }
    out.push_str("=====================\n");
    out
}

/// Render one player's cash, cups, and property holdings.
#[must_use]
pub fn render_assets(player: &Player, board: &Board) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Assets of {} ({}) ===\n",
        player.name, player.token
    ));
    out.push_str(&format!("Money: ${}\n", player.money));
    out.push_str(&format!("Net worth: ${}\n", net_worth(board, player)));
    out.push_str(&format!("Roll Up the Rim cups: {}\n", player.cups));
    if player.properties.is_empty() {
        out.push_str("Properties: none\n");
    } else {
        out.push_str("Properties:\n");
        for name in &player.properties {
            let Some(square) = board.property(name) else {
                continue;
            };
            out.push_str(&format!("  {name}"));
            if square.mortgaged {
                out.push_str(" (mortgaged)");
            } else if square.improvements > 0 {
                out.push_str(&format!(" (improvements: {})", square.improvements));
            }
            out.push('\n');
        }
    }
    out
}

/// Render the holdings of every solvent player.
#[must_use]
pub fn render_all(state: &GameState) -> String {
    let mut out = String::new();
    for player in state.players.iter().filter(|p| !p.bankrupt) {
        out.push_str(&render_assets(player, &state.board));
        out.push('\n');
    }
    out
}

fn push_edge_row(out: &mut String, state: &GameState, positions: &[u8]) {
    push_cells(out, positions, |pos| improvements_cell(state, pos));
    push_cells(out, positions, |_| "-------".to_string());
    push_cells(out, positions, |pos| name_cell(state, pos));
    push_cells(out, positions, |pos| tokens_on(state, pos));
    push_separator(out, positions.len());
}

fn push_middle_row(out: &mut String, state: &GameState, left: u8, right: u8) {
    push_pair(
        out,
        &improvements_cell(state, left),
        &improvements_cell(state, right),
    );
    push_pair(out, &name_cell(state, left), &name_cell(state, right));
    push_pair(out, &tokens_on(state, left), &tokens_on(state, right));
    push_pair(out, &"_".repeat(CELL_WIDTH), &"_".repeat(CELL_WIDTH));
}

fn push_cells(out: &mut String, positions: &[u8], cell: impl Fn(u8) -> String) {
    out.push('|');
    for &pos in positions {
        out.push_str(&fit(&cell(pos)));
        out.push('|');
    }
    out.push('\n');
}

fn push_pair(out: &mut String, left: &str, right: &str) {
    out.push('|');
    out.push_str(&fit(left));
    out.push('|');
    out.push_str(&" ".repeat(MIDDLE_GAP));
    out.push('|');
    out.push_str(&fit(right));
    out.push('|');
    out.push('\n');
}

fn push_separator(out: &mut String, count: usize) {
    for _ in 0..count {
        out.push('|');
        out.push_str(&"_".repeat(CELL_WIDTH));
    }
    out.push_str("|\n");
}

/// Improvement ticks for academic buildings, the name otherwise.
fn improvements_cell(state: &GameState, position: u8) -> String {
    let Some(square) = state.board.square(position) else {
        return String::new();
    };
    if square.improvement_cost().is_some() {
        "I".repeat(usize::from(square.improvements))
    } else {
        square.name.to_string()
    }
}

fn name_cell(state: &GameState, position: u8) -> String {
    state
        .board
        .square(position)
        .map_or_else(String::new, |s| s.name.to_string())
}

fn tokens_on(state: &GameState, position: u8) -> String {
    let mut result = String::new();
    for player in state.players.iter().filter(|p| !p.bankrupt) {
        if player.position == position {
            result.push(player.token);
            result.push(' ');
        }
    }
    result
}

/// Pad or truncate to exactly one cell width.
fn fit(s: &str) -> String {
    let mut cell: String = s.chars().take(CELL_WIDTH).collect();
    let used = cell.chars().count();
    cell.push_str(&" ".repeat(CELL_WIDTH - used));
    cell
}
