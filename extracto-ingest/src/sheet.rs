//! Spreadsheet exports (CSV or workbook) -> `Table`, applying header hints
//! before the engine sees the data.

use std::io::{Read, Seek};

use calamine::{Data, DataType, Range, Reader};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::Table;

/// How to locate the header row inside an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetHints {
    /// Sheet name or index (all digits); workbooks only.
    pub worksheet: Option<String>,
    /// Header row, counted after `skip_rows`.
    pub header_row: usize,
    pub skip_rows: usize,
    /// Drop columns whose header is blank or `Unnamed: N`.
    pub remove_unnamed_columns: bool,
}

impl Default for SheetHints {
    fn default() -> Self {
        Self {
            worksheet: None,
            header_row: 0,
            skip_rows: 0,
            remove_unnamed_columns: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("reading sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("reading workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("worksheet {requested:?} not found (available: {available:?})")]
    WorksheetNotFound {
        requested: String,
        available: Vec<String>,
    },
    #[error("header row {header_row} not found ({available} rows after skipping)")]
    HeaderRowOutOfRange { header_row: usize, available: usize },
}

fn is_unnamed(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed")
}

/// Read a CSV export into a header + rows table.
pub fn read_sheet<R: Read>(reader: R, hints: &SheetHints) -> Result<Table, SheetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if let Some(worksheet) = &hints.worksheet {
        debug!(worksheet = %worksheet, "worksheet hint ignored for csv input");
    }
    apply_hints(records, hints)
}

/// Read one worksheet of an `.xlsx`/`.xls`/`.ods` workbook. `worksheet` picks
/// the sheet by index (all digits) or by name; the first sheet otherwise.
pub fn read_workbook<RS>(reader: RS, hints: &SheetHints) -> Result<Table, SheetError>
where
    RS: Read + Seek + Clone,
{
    let mut workbook = calamine::open_workbook_auto_from_rs(reader)?;
    let name = pick_worksheet(&workbook.sheet_names(), hints.worksheet.as_deref())?;
    let range = workbook.worksheet_range(&name)?;
    debug!(worksheet = %name, "reading worksheet");
    table_from_range(&range, hints)
}

fn pick_worksheet(names: &[String], hint: Option<&str>) -> Result<String, SheetError> {
    let requested = hint.map(str::trim).filter(|h| !h.is_empty());
    let found = match requested {
        None => names.first(),
        Some(h) if h.chars().all(|c| c.is_ascii_digit()) => {
            h.parse::<usize>().ok().and_then(|idx| names.get(idx))
        }
        Some(h) => names.iter().find(|name| name.as_str() == h),
    };
    found.cloned().ok_or_else(|| SheetError::WorksheetNotFound {
        requested: requested.unwrap_or("0").to_string(),
        available: names.to_vec(),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| cell.to_string()),
    }
}

/// Worksheet cells -> table. Row hints count from the top of the sheet, so
/// blank rows above the used range are kept.
fn table_from_range(range: &Range<Data>, hints: &SheetHints) -> Result<Table, SheetError> {
    let leading = range.start().map_or(0, |(row, _)| row as usize);
    let records: Vec<Vec<String>> = std::iter::repeat_with(Vec::new)
        .take(leading)
        .chain(range.rows().map(|row| row.iter().map(cell_text).collect()))
        .collect();
    apply_hints(records, hints)
}

/// Skip rows, pick the header row, then drop unnamed columns and blank rows.
fn apply_hints(records: Vec<Vec<String>>, hints: &SheetHints) -> Result<Table, SheetError> {
    let mut records: Vec<Vec<String>> = records.into_iter().skip(hints.skip_rows).collect();
    if hints.header_row >= records.len() {
        return Err(SheetError::HeaderRowOutOfRange {
            header_row: hints.header_row,
            available: records.len(),
        });
    }
    let mut records = records.split_off(hints.header_row).into_iter();
    let headers: Vec<String> = records
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let keep: Vec<usize> = (0..headers.len())
        .filter(|&idx| !hints.remove_unnamed_columns || !is_unnamed(&headers[idx]))
        .collect();

    let rows: Vec<Vec<String>> = records
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| {
            keep.iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    debug!(columns = keep.len(), rows = rows.len(), "read sheet");

    Ok(Table {
        headers: keep.iter().map(|&idx| headers[idx].clone()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
BANCO DE OCCIDENTE,,,
Cuenta 123,,,
 Fecha ,Transacción,Unnamed: 2,Débitos
2024/01/02,ABONO,,0
,,,
2024/01/03,RETIRO,x,50
";

    #[test]
    fn test_skip_rows_and_unnamed_columns() {
        let hints = SheetHints {
            skip_rows: 2,
            ..SheetHints::default()
        };
        let table = read_sheet(EXPORT.as_bytes(), &hints).unwrap();
        assert_eq!(table.headers, vec!["Fecha", "Transacción", "Débitos"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2024/01/03", "RETIRO", "50"]);
    }

    #[test]
    fn test_header_row_relative_to_skipped() {
        let hints = SheetHints {
            skip_rows: 1,
            header_row: 1,
            remove_unnamed_columns: false,
            ..SheetHints::default()
        };
        let table = read_sheet(EXPORT.as_bytes(), &hints).unwrap();
        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows[0][2], "");
    }

    #[test]
    fn test_header_row_out_of_range() {
        let hints = SheetHints {
            header_row: 40,
            ..SheetHints::default()
        };
        let err = read_sheet(EXPORT.as_bytes(), &hints).unwrap_err();
        assert!(matches!(err, SheetError::HeaderRowOutOfRange { available: 6, .. }));
    }

    fn worksheet(top: u32, cells: &[&[Data]]) -> Range<Data> {
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((top, 0), (top + cells.len() as u32 - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((top + r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_worksheet_cells_follow_the_same_hints() {
        let range = worksheet(
            1,
            &[
                &[text("BANCO POPULAR"), Data::Empty, Data::Empty],
                &[text("Fecha"), text("Unnamed: 1"), text("Créditos")],
                &[text("2024/05/02"), Data::Empty, Data::Float(1500000.0)],
                &[Data::Empty, Data::Empty, Data::Empty],
                &[text("2024/05/03"), Data::Bool(true), Data::Int(12)],
            ],
        );
        // Row 0 is blank above the used range, row 1 is the bank name.
        let hints = SheetHints {
            skip_rows: 2,
            ..SheetHints::default()
        };
        let table = table_from_range(&range, &hints).unwrap();
        assert_eq!(table.headers, vec!["Fecha", "Créditos"]);
        assert_eq!(
            table.rows,
            vec![vec!["2024/05/02", "1500000"], vec!["2024/05/03", "12"]]
        );
    }

    #[test]
    fn test_worksheet_by_index_or_name() {
        let names: Vec<String> = ["Resumen", "Movimientos"].map(String::from).to_vec();
        assert_eq!(pick_worksheet(&names, None).unwrap(), "Resumen");
        assert_eq!(pick_worksheet(&names, Some("1")).unwrap(), "Movimientos");
        assert_eq!(pick_worksheet(&names, Some(" Movimientos ")).unwrap(), "Movimientos");
        assert!(matches!(
            pick_worksheet(&names, Some("Hoja3")),
            Err(SheetError::WorksheetNotFound { requested, .. }) if requested == "Hoja3"
        ));
        assert!(pick_worksheet(&names, Some("7")).is_err());
    }

    #[test]
    fn test_garbage_bytes_are_not_a_workbook() {
        let bytes = std::io::Cursor::new(b"not a zip".to_vec());
        let err = read_workbook(bytes, &SheetHints::default()).unwrap_err();
        assert!(matches!(err, SheetError::Workbook(_)));
    }
}
