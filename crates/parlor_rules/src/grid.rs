//! Cell coordinates and emoji grid rendering shared by the grid games.
//!
//! A cell token is a row letter and a column digit in either order, so
//! `b3` and `3b` name the same cell.

use crate::MoveError;

/// Keycap labels for the column header.
pub const COLUMN_LABELS: [&str; 9] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];

/// Regional-indicator labels for the rows.
pub const ROW_LABELS: [&str; 9] = ["🇦", "🇧", "🇨", "🇩", "🇪", "🇫", "🇬", "🇭", "🇮"];

/// Largest grid dimension the labels can address.
pub const MAX_DIMENSION: usize = 9;

/// A (row, column) pair, zero based.
pub type Cell = (usize, usize);

/// Parses one cell token against a `rows` x `cols` grid.
///
/// # Errors
///
/// [`MoveError::Illegal`] for anything that is not one letter plus one
/// digit, [`MoveError::OutOfBounds`] for a cell off the grid.
pub fn parse_cell(token: &str, rows: usize, cols: usize) -> Result<Cell, MoveError> {
    let chars: Vec<char> = token.chars().map(|c| c.to_ascii_lowercase()).collect();
    let (letter, digit) = match chars.as_slice() {
        [a, b] if a.is_ascii_lowercase() && b.is_ascii_digit() => (*a, *b),
        [a, b] if a.is_ascii_digit() && b.is_ascii_lowercase() => (*b, *a),
        _ => return Err(MoveError::illegal(format!("'{}' is not a cell", token))),
    };

    let row = (letter as u8 - b'a') as usize;
    let col = match digit.to_digit(10) {
        Some(d) if d >= 1 => d as usize - 1,
        _ => return Err(MoveError::out_of_bounds(format!("no column {}", digit))),
    };
    if row >= rows || col >= cols {
        return Err(MoveError::out_of_bounds(format!("{} is off the board", token)));
    }
    Ok((row, col))
}

/// Splits a token made of `count` cell tokens and parses each.
pub fn parse_cells(token: &str, count: usize, rows: usize, cols: usize) -> Result<Vec<Cell>, MoveError> {
    if token.chars().count() != count * 2 || !token.is_ascii() {
        return Err(MoveError::illegal(format!(
            "'{}' should name {} cell(s)",
            token, count
        )));
    }
    (0..count)
        .map(|i| parse_cell(&token[i * 2..i * 2 + 2], rows, cols))
        .collect()
}

/// Cheap syntactic check that `text` is `count` letter+digit pairs.
pub fn looks_like_cells(text: &str, count: usize) -> bool {
    let text = text.trim();
    if text.len() != count * 2 || !text.is_ascii() {
        return false;
    }
    text.as_bytes().chunks(2).all(|pair| {
        let (a, b) = (pair[0], pair[1]);
        (a.is_ascii_alphabetic() && b.is_ascii_digit()) || (a.is_ascii_digit() && b.is_ascii_alphabetic())
    })
}

/// Formats a cell back into its canonical token, e.g. `(1, 2)` -> `b3`.
pub fn cell_name((row, col): Cell) -> String {
    format!("{}{}", (b'a' + row as u8) as char, col + 1)
}

/// Renders a grid with a keycap header and a row label after each row.
pub fn render_grid<'a>(rows: usize, cols: usize, cell: impl Fn(usize, usize) -> &'a str) -> String {
    let mut text = COLUMN_LABELS[..cols].join("|");
    text.push('\n');
    for row in 0..rows {
        for col in 0..cols {
            text.push_str(cell(row, col));
            text.push('|');
        }
        text.push_str(ROW_LABELS[row]);
        text.push('\n');
    }
    text
}

/// Orthogonal neighbours of a cell inside a `rows` x `cols` grid.
pub fn orthogonal_neighbours((row, col): Cell, rows: usize, cols: usize) -> impl Iterator<Item = Cell> {
    const STEPS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    STEPS.into_iter().filter_map(move |(dr, dc)| step((row, col), (dr, dc), rows, cols))
}

/// Moves one step in a direction, staying on the grid.
pub fn step((row, col): Cell, (dr, dc): (isize, isize), rows: usize, cols: usize) -> Option<Cell> {
    let r = row.checked_add_signed(dr)?;
    let c = col.checked_add_signed(dc)?;
    (r < rows && c < cols).then_some((r, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_either_order() {
        assert_eq!(parse_cell("b3", 9, 9), Ok((1, 2)));
        assert_eq!(parse_cell("3B", 9, 9), Ok((1, 2)));
    }

    #[test]
    fn test_cell_bounds() {
        assert!(matches!(parse_cell("i1", 8, 8), Err(MoveError::OutOfBounds(_))));
        assert!(matches!(parse_cell("a0", 8, 8), Err(MoveError::OutOfBounds(_))));
        assert!(matches!(parse_cell("a9", 8, 8), Err(MoveError::OutOfBounds(_))));
        assert!(matches!(parse_cell("aa", 8, 8), Err(MoveError::Illegal(_))));
        assert!(matches!(parse_cell("a", 8, 8), Err(MoveError::Illegal(_))));
    }

    #[test]
    fn test_looks_like_cells() {
        assert!(looks_like_cells("a1", 1));
        assert!(looks_like_cells("1a3c", 2));
        assert!(!looks_like_cells("hello", 1));
        assert!(!looks_like_cells("ab", 1));
        assert!(!looks_like_cells("a1", 2));
    }

    #[test]
    fn test_neighbour_counts() {
        assert_eq!(orthogonal_neighbours((0, 0), 3, 3).count(), 2);
        assert_eq!(orthogonal_neighbours((0, 1), 3, 3).count(), 3);
        assert_eq!(orthogonal_neighbours((1, 1), 3, 3).count(), 4);
    }

    #[test]
    fn test_cell_name_round_trip() {
        assert_eq!(cell_name((1, 2)), "b3");
        assert_eq!(parse_cell(&cell_name((4, 5)), 9, 9), Ok((4, 5)));
    }
}
