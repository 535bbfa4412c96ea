/// Convert a byte offset into (line, col), both 1-indexed.
///
/// Columns count characters, not bytes, so offsets after non-ASCII text
/// still point at the right glyph.
pub fn offset_to_line_col(offset: usize, source: &str) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_1_for_start() {
        let src = "result = []\n";
        assert_eq!(offset_to_line_col(0, src), (1, 1));
    }

    #[test]
    fn test_second_line() {
        let src = "result = []\nfor i in x:\n";
        assert_eq!(offset_to_line_col(12, src), (2, 1));
    }

    #[test]
    fn test_column_within_line() {
        let src = "x = 1\n";
        assert_eq!(offset_to_line_col(4, src), (1, 5));
    }

    #[test]
    fn test_column_counts_chars() {
        let src = "é = 1\n";
        // `=` sits at byte 3 but is the third character.
        assert_eq!(offset_to_line_col(3, src), (1, 3));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(offset_to_line_col(0, ""), (1, 1));
    }
}
