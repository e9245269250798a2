use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use extracto_core::{ParseError, Result};
use serde::{Deserialize, Serialize};

use crate::table::DetectedBlock;

/// A trimmed, non-empty text line of a statement.
pub type RawLine = String;

/// Dense row-major cell text.
pub type Grid = Vec<Vec<String>>;

/// One spreadsheet/table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCell {
    pub row: usize,
    pub column: usize,
    pub text: String,
}

impl RawCell {
    pub fn new(row: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            column,
            text: text.into(),
        }
    }
}

/// Document input handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Statement text, one entry per line.
    Text(Vec<RawLine>),
    /// Tabular export; row 0 is the header row.
    Cells(Vec<RawCell>),
    /// OCR/table-detection output.
    Blocks(Vec<DetectedBlock>),
}

impl Source {
    /// Split text into trimmed lines, dropping empty ones.
    pub fn from_text(text: &str) -> Self {
        Source::Text(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Flatten a header + rows table into cells.
    pub fn from_table(table: &Table) -> Self {
        let mut cells = Vec::new();
        for (col, header) in table.headers.iter().enumerate() {
            cells.push(RawCell::new(0, col, header.clone()));
        }
        for (r, row) in table.rows.iter().enumerate() {
            for (col, text) in row.iter().enumerate() {
                cells.push(RawCell::new(r + 1, col, text.clone()));
            }
        }
        Source::Cells(cells)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Source::Text(_) => "text",
            Source::Cells(_) => "cells",
            Source::Blocks(_) => "blocks",
        }
    }
}

/// Materialize cells into a dense grid ordered by row then column.
///
/// Indices may start at 0 or 1; the grid starts at the smallest one seen.
/// Cells sharing a position are space-joined.
pub fn dense_grid<I>(cells: I) -> Grid
where
    I: IntoIterator<Item = (usize, usize, String)>,
{
    let mut positioned: BTreeMap<(usize, usize), String> = BTreeMap::new();
    for (row, col, text) in cells {
        match positioned.entry((row, col)) {
            Entry::Vacant(slot) => {
                slot.insert(text);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if !text.is_empty() {
                    if !existing.is_empty() {
                        existing.push(' ');
                    }
                    existing.push_str(&text);
                }
            }
        }
    }

    let Some(min_row) = positioned.keys().map(|(r, _)| *r).min() else {
        return Vec::new();
    };
    let min_col = positioned.keys().map(|(_, c)| *c).min().unwrap_or(0);
    let max_row = positioned.keys().map(|(r, _)| *r).max().unwrap_or(min_row);
    let max_col = positioned.keys().map(|(_, c)| *c).max().unwrap_or(min_col);

    let mut grid = vec![vec![String::new(); max_col - min_col + 1]; max_row - min_row + 1];
    for ((row, col), text) in positioned {
        grid[row - min_row][col - min_col] = text;
    }
    grid
}

/// A header row plus data rows, as exported by a bank's spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// First grid row becomes the (whitespace-stripped) header.
    pub fn from_grid(grid: Grid) -> Self {
        let mut rows = grid.into_iter();
        let headers = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        Self {
            headers,
            rows: rows.collect(),
        }
    }

    pub fn from_cells(cells: Vec<RawCell>) -> Self {
        Self::from_grid(dense_grid(cells.into_iter().map(|c| (c.row, c.column, c.text))))
    }

    /// Exact header lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// First candidate present, compared case-insensitively.
    pub fn column_any(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|candidate| {
            let wanted = candidate.to_lowercase();
            self.headers.iter().position(|h| h.to_lowercase() == wanted)
        })
    }

    /// Every name must be a header; otherwise the absent ones are reported
    /// in declaration order.
    pub fn require<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N]> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns(missing));
        }
        Ok(names.map(|name| self.column(name).unwrap_or_default()))
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row { cells })
    }
}

/// Borrowed view over one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Trimmed cell text; `""` for absent columns and spreadsheet `nan`s.
    pub fn cell(&self, column: Option<usize>) -> &'a str {
        let text = column
            .and_then(|idx| self.cells.get(idx))
            .map(|s| s.trim())
            .unwrap_or("");
        if text.eq_ignore_ascii_case("nan") { "" } else { text }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_trims_and_drops_empty_lines() {
        let source = Source::from_text("  FECHA \n\n 2024/01/02\r\n   \nABONO");
        assert_eq!(
            source,
            Source::Text(vec!["FECHA".into(), "2024/01/02".into(), "ABONO".into()])
        );
    }

    #[test]
    fn test_dense_grid_fills_gaps_one_based() {
        let grid = dense_grid(vec![
            (1, 1, "Fecha".to_string()),
            (1, 3, "Valor".to_string()),
            (2, 1, "2024-01-01".to_string()),
        ]);
        assert_eq!(
            grid,
            vec![
                vec!["Fecha".to_string(), String::new(), "Valor".to_string()],
                vec!["2024-01-01".to_string(), String::new(), String::new()],
            ]
        );
    }

    #[test]
    fn test_dense_grid_empty() {
        assert!(dense_grid(Vec::new()).is_empty());
    }

    #[test]
    fn test_require_reports_exactly_missing() {
        let table = Table::from_grid(vec![vec![" Fecha ".into(), "Valor".into()]]);
        assert_eq!(table.require(["Fecha", "Valor"]).unwrap(), [0, 1]);
        assert_eq!(
            table.require(["Fecha", "Débitos", "Valor", "Créditos"]),
            Err(ParseError::MissingColumns(vec!["Débitos".into(), "Créditos".into()]))
        );
    }

    #[test]
    fn test_cells_round_trip_through_table() {
        let table = Table {
            headers: vec!["Fecha".into(), "Valor".into()],
            rows: vec![vec!["01/02/2024".into(), "nan".into()]],
        };
        let Source::Cells(cells) = Source::from_table(&table) else {
            panic!("expected cells");
        };
        let rebuilt = Table::from_cells(cells);
        assert_eq!(rebuilt, table);
        let row = rebuilt.iter_rows().next().unwrap();
        assert_eq!(row.cell(rebuilt.column("Valor")), "");
        assert_eq!(row.cell(None), "");
        assert_eq!(row.cell(rebuilt.column_any(&["FECHA"])), "01/02/2024");
    }
}
