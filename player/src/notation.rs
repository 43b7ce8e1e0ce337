//! Move notation for the terminal.
//!
//! Columns are letters starting at `A` with `I` skipped, as on a printed Go
//! board. Rows are numbered from 1 at the top. `h8` is column 7, row 7.
//! Raw `row,col` pairs (0-indexed) are accepted as well.

use anyhow::{anyhow, bail, Result};
use games_gomoku::Position;

/// Column letters in board order.
const COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Largest board whose columns can all be lettered.
pub const MAX_LETTERED_SIZE: usize = COLUMNS.len();

/// Letter for a column, if the column can be lettered.
pub fn column_letter(col: usize) -> Option<char> {
    COLUMNS.get(col).map(|&b| b as char)
}

/// Render a position as `H8`, or as `(r, c)` past the lettered columns.
pub fn format_move(pos: Position) -> String {
    match column_letter(pos.col) {
        Some(letter) => format!("{}{}", letter, pos.row + 1),
        None => pos.to_string(),
    }
}

/// Parse `h8`, `H8` or `7,7` into a position on a `board_size` board.
pub fn parse_move(input: &str, board_size: usize) -> Result<Position> {
    let input = input.trim();
    if input.is_empty() {
        bail!("empty move");
    }

    let pos = if let Some((row, col)) = input.split_once(',') {
        let row = row
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow!("invalid row '{}'", row.trim()))?;
        let col = col
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow!("invalid column '{}'", col.trim()))?;
        Position::new(row, col)
    } else {
        let mut chars = input.chars();
        let letter = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| anyhow!("empty move"))?;
        let col = COLUMNS
            .iter()
            .position(|&b| b as char == letter)
            .ok_or_else(|| anyhow!("invalid column '{}'", letter))?;
        let number = chars.as_str();
        let row = number
            .parse::<usize>()
            .ok()
            .filter(|&n| n >= 1)
            .ok_or_else(|| anyhow!("invalid row '{}'", number))?;
        Position::new(row - 1, col)
    };

    if pos.row >= board_size || pos.col >= board_size {
        bail!(
            "{} is outside the {}x{} board",
            format_move(pos),
            board_size,
            board_size
        );
    }
    Ok(pos)
}
