//! Conversions between 0-based (row, column) indexes and A1-style cell references.

/// Rows a worksheet can hold
pub(crate) const MAX_ROWS: usize = 1_048_576;
/// Columns a worksheet can hold, "A" to "XFD"
pub(crate) const MAX_COLUMNS: usize = 16_384;

/// Whether 0-based indexes fall inside the worksheet grid
pub(crate) fn in_bounds(row: usize, col: usize) -> bool {
    row < MAX_ROWS && col < MAX_COLUMNS
}

/// Converts a 0-based column index to its letters ("A", "Z", "AA", ...).
pub(crate) fn column_letters(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = Vec::new();
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.iter().rev().map(|letter| *letter as char).collect()
}

/// Converts 0-based row & column indexes to an Excel-style reference such as "B3".
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

/// Parses an Excel-style reference such as "B3" (absolute markers allowed) into 0-based indexes.
///
/// References outside the worksheet grid yield `None`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|character| character.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters
        .chars()
        .map(|character| (character.to_ascii_uppercase() as u8 - b'A') as usize + 1)
        .try_fold(0usize, |acc, digit| acc.checked_mul(26)?.checked_add(digit))?;
    let row = digits.parse::<usize>().ok()?;
    (row > 0 && in_bounds(row - 1, col - 1)).then(|| (row - 1, col - 1))
}
