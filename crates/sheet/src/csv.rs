//! Hand-rolled CSV reader/writer for the sheet grid.
//!
//! RFC 4180 quoting: fields containing commas, quotes or newlines are
//! wrapped in double quotes with embedded quotes doubled. Rows are
//! terminated with CRLF on write (what the original's csv module
//! emitted); both CRLF and LF are accepted on read.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::grid::{Grid, COLS, ROWS};

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("unexpected character {found:?} after closing quote on line {line}")]
    TrailingAfterQuote { found: char, line: usize },
}

/// Serialises the full grid, one CSV row per grid row.
pub fn to_csv(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid.rows() {
        let mut first = true;
        for cell in row {
            if !first {
                out.push(',');
            }
            first = false;
            write_field(&mut out, &cell.value);
        }
        out.push_str("\r\n");
    }
    out
}

fn write_field(out: &mut String, value: &str) {
    let needs_quoting = value.contains([',', '"', '\n', '\r']);
    if !needs_quoting {
        out.push_str(value);
        return;
    }
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Parses CSV text into rows of fields.
pub fn parse_csv(input: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_open_line = 1;
    let mut line = 1;
    let mut row_started = false;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                        // 結束引號後只允許分隔符或行尾。 / Only a separator or row end may follow.
                        match chars.peek() {
                            Some(',') | Some('\n') | Some('\r') | None => {}
                            Some(&found) => {
                                return Err(CsvError::TrailingAfterQuote { found, line });
                            }
                        }
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_open_line = line;
                row_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                row_started = true;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                if row_started || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut fields));
                }
                row_started = false;
            }
            '\n' => {
                line += 1;
                if row_started || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut fields));
                }
                row_started = false;
            }
            _ => {
                field.push(ch);
                row_started = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote {
            line: quote_open_line,
        });
    }
    if row_started || !field.is_empty() {
        fields.push(field);
        rows.push(fields);
    }
    Ok(rows)
}

/// Writes parsed values into the grid. Rows and columns beyond the
/// fixed grid bounds are ignored, and cells the CSV does not cover keep
/// their current contents, as the original loader behaved.
pub fn apply_csv(grid: &mut Grid, input: &str) -> Result<(), CsvError> {
    let rows = parse_csv(input)?;
    for (r, row) in rows.into_iter().enumerate() {
        if r >= ROWS {
            break;
        }
        for (c, value) in row.into_iter().enumerate() {
            if c >= COLS {
                break;
            }
            grid.set_value(r, c, value);
        }
    }
    Ok(())
}

pub fn save_csv(grid: &Grid, path: impl AsRef<Path>) -> Result<(), CsvError> {
    let path = path.as_ref();
    let payload = to_csv(grid);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload.as_bytes())?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load_csv(grid: &mut Grid, path: impl AsRef<Path>) -> Result<(), CsvError> {
    let contents = fs::read_to_string(path)?;
    apply_csv(grid, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_round_trip() {
        let mut grid = Grid::new();
        grid.set_value(0, 0, "alpha");
        grid.set_value(0, 1, "beta");
        grid.set_value(1, 0, "42");

        let csv = to_csv(&grid);
        let mut reloaded = Grid::new();
        apply_csv(&mut reloaded, &csv).unwrap();
        assert_eq!(reloaded.cell(0, 0).unwrap().value, "alpha");
        assert_eq!(reloaded.cell(0, 1).unwrap().value, "beta");
        assert_eq!(reloaded.cell(1, 0).unwrap().value, "42");
        assert_eq!(reloaded.cell(2, 2).unwrap().value, "");
    }

    #[test]
    fn quoting_handles_commas_quotes_and_newlines() {
        let mut grid = Grid::new();
        grid.set_value(0, 0, "a,b");
        grid.set_value(0, 1, "say \"hi\"");
        grid.set_value(0, 2, "two\nlines");

        let csv = to_csv(&grid);
        assert!(csv.starts_with("\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\","));

        let mut reloaded = Grid::new();
        apply_csv(&mut reloaded, &csv).unwrap();
        assert_eq!(reloaded.cell(0, 0).unwrap().value, "a,b");
        assert_eq!(reloaded.cell(0, 1).unwrap().value, "say \"hi\"");
        assert_eq!(reloaded.cell(0, 2).unwrap().value, "two\nlines");
    }

    #[test]
    fn parse_accepts_lf_only_rows() {
        let rows = parse_csv("a,b\nc,d\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn parse_keeps_empty_fields() {
        let rows = parse_csv("a,,c\r\n,,\r\n").unwrap();
        assert_eq!(rows[0], vec!["a", "", "c"]);
        assert_eq!(rows[1], vec!["", "", ""]);
    }

    #[test]
    fn oversized_input_is_truncated_to_grid_bounds() {
        let mut lines = Vec::new();
        for r in 0..30 {
            let row: Vec<String> = (0..20).map(|c| format!("r{r}c{c}")).collect();
            lines.push(row.join(","));
        }
        let input = lines.join("\n");

        let mut grid = Grid::new();
        apply_csv(&mut grid, &input).unwrap();
        assert_eq!(grid.cell(0, 0).unwrap().value, "r0c0");
        assert_eq!(grid.cell(ROWS - 1, COLS - 1).unwrap().value, "r24c11");
    }

    #[test]
    fn load_leaves_uncovered_cells_alone() {
        let mut grid = Grid::new();
        grid.set_value(5, 5, "keep me");
        apply_csv(&mut grid, "only,first,row\n").unwrap();
        assert_eq!(grid.cell(5, 5).unwrap().value, "keep me");
        assert_eq!(grid.cell(0, 0).unwrap().value, "only");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(matches!(
            parse_csv("\"open"),
            Err(CsvError::UnterminatedQuote { line: 1 })
        ));
    }

    #[test]
    fn garbage_after_closing_quote_is_an_error() {
        assert!(matches!(
            parse_csv("\"done\"x,next"),
            Err(CsvError::TrailingAfterQuote { found: 'x', .. })
        ));
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");

        let mut grid = Grid::new();
        grid.set_value(3, 4, "persisted");
        save_csv(&grid, &path).unwrap();

        let mut reloaded = Grid::new();
        load_csv(&mut reloaded, &path).unwrap();
        assert_eq!(reloaded.cell(3, 4).unwrap().value, "persisted");
    }
}
