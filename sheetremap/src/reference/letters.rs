//! Column letter codec (1 -> A, 26 -> Z, 27 -> AA)

/// Convert a 1-based column index to letters. Returns `None` for index 0.
pub fn column_letters(index: u32) -> Option<String> {
    if index == 0 {
        return None;
    }

    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).ok()
}

/// Convert column letters to a 1-based index, case-insensitively.
///
/// Returns `None` for empty input, non-alphabetic characters or overflow.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut col = 0u32;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col)
}

/// Parse an address like "C2" or "$C$2" into 1-based (row, col)
pub fn parse_cell_address(address: &str) -> Option<(u32, u32)> {
    let trimmed = address.trim();
    let letters_end = trimmed
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_digit())
        .map(|(idx, _)| idx)?;

    let (col_part, row_part) = trimmed.split_at(letters_end);
    let col = column_index(col_part.trim_matches('$'))?;
    let row_part = row_part.strip_prefix('$').unwrap_or(row_part);
    if row_part.is_empty() || !row_part.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let row = row_part.parse::<u32>().ok()?;

    if row == 0 {
        return None;
    }
    Some((row, col))
}
