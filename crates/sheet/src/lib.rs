pub mod csv;
pub mod grid;

pub use csv::{apply_csv, load_csv, parse_csv, save_csv, to_csv, CsvError};
pub use grid::{Cell, CellStyle, Grid, COLS, ROWS};
