use std::ops::Range;

/// 以空白切割的字數統計。 / Whitespace-split word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 位元組位置對應的（行, 欄）；行從 1 起算，欄為行內字元數。 /
/// (line, column) for a byte position; lines are 1-based, columns count chars from line start.
pub fn line_col_at(text: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(text.len());
    let before = &text[..pos];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let column = text[line_start..pos].chars().count();
    (line, column)
}

/// 將範圍擴展至涵蓋整行（不含行尾換行）。 /
/// Expands a range to full line bounds (exclusive of the trailing newline).
pub fn line_bounds(text: &str, range: Range<usize>) -> Range<usize> {
    let len = text.len();
    let from = range.start.min(len);
    let to = range.end.min(len).max(from);
    let start = text[..from].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let end = text[to..].find('\n').map(|idx| to + idx).unwrap_or(len);
    start..end
}

/// 在選取涵蓋的每一行前加上項目符號。 /
/// Prefixes every line covered by the selection with a bullet marker.
/// Returns `None` when the selection is empty.
pub fn bullet_lines(text: &str, range: Range<usize>) -> Option<String> {
    if range.start >= range.end {
        return None;
    }
    let bounds = line_bounds(text, range);
    let rebuilt: String = text[bounds.clone()]
        .split('\n')
        .map(|line| format!("• {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut result = String::with_capacity(text.len() + rebuilt.len());
    result.push_str(&text[..bounds.start]);
    result.push_str(&rebuilt);
    result.push_str(&text[bounds.end..]);
    Some(result)
}

/// 字元索引轉位元組偏移。 / Converts a char index to a byte offset.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("one  two\nthree\t four\n"), 4);
    }

    #[test]
    fn line_col_counts_chars_not_bytes() {
        let text = "ab\n中文c";
        assert_eq!(line_col_at(text, 0), (1, 0));
        assert_eq!(line_col_at(text, 2), (1, 2));
        assert_eq!(line_col_at(text, 3), (2, 0));
        // 「中」佔三個位元組，但只算一欄。 / Three bytes for the first CJK char, one column.
        assert_eq!(line_col_at(text, 6), (2, 1));
        assert_eq!(line_col_at(text, 9), (2, 2));
    }

    #[test]
    fn line_bounds_expands_to_full_lines() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_bounds(text, 5..6), 4..7);
        assert_eq!(line_bounds(text, 1..9), 0..13);
        assert_eq!(line_bounds(text, 0..0), 0..3);
    }

    #[test]
    fn bullet_lines_prefixes_each_covered_line() {
        let text = "alpha\nbeta\ngamma";
        let result = bullet_lines(text, 7..12).unwrap();
        assert_eq!(result, "alpha\n• beta\n• gamma");
    }

    #[test]
    fn bullet_lines_requires_selection() {
        assert!(bullet_lines("alpha", 2..2).is_none());
    }

    #[test]
    fn char_to_byte_handles_multibyte() {
        let text = "a中b";
        assert_eq!(char_to_byte(text, 0), 0);
        assert_eq!(char_to_byte(text, 1), 1);
        assert_eq!(char_to_byte(text, 2), 4);
        assert_eq!(char_to_byte(text, 3), 5);
    }
}
