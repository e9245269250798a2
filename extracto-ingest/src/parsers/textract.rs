//! Generic OCR-table grammar.
//!
//! Header cells are mapped onto field keys; a table whose first row is not a
//! header (a page break inside the movement list) keeps using the previous
//! header. Wrapped rows are stitched back together across tables.

use extracto_core::{Field, ParseError, RawFields, Result};
use tracing::debug;

use super::Extraction;
use crate::table::{merge_continuation_rows, normalize_header};
use crate::types::Grid;

const REQUIRED: [Field; 2] = [Field::Fecha, Field::Valor];

/// Normalized header keys when `row` looks like a header row (at least two
/// cells name a known field).
fn header_keys(row: &[String]) -> Option<Vec<String>> {
    let keys: Vec<String> = row.iter().map(|cell| normalize_header(cell)).collect();
    let known = keys.iter().filter(|key| Field::from_key(key).is_some()).count();
    (known >= 2).then_some(keys)
}

fn to_fields(keys: &[String], row: &[String]) -> RawFields {
    let mut fields = RawFields::new();
    for (key, cell) in keys.iter().zip(row) {
        if !key.is_empty() {
            fields.insert_key(key, cell.trim());
        }
    }
    fields
}

pub fn parse(tables: &[Grid]) -> Result<Extraction> {
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (index, grid) in tables.iter().enumerate() {
        let mut grid_rows = grid.iter();
        if let Some(keys) = grid.first().and_then(|first| header_keys(first)) {
            let missing: Vec<String> = REQUIRED
                .iter()
                .filter(|field| !keys.iter().any(|k| k == field.key()))
                .map(|field| field.key().to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ParseError::MissingColumns(missing));
            }
            header = Some(keys);
            grid_rows.next();
        }
        let Some(keys) = &header else {
            debug!(table = index, "table before any header row, skipped");
            continue;
        };
        rows.extend(
            grid_rows
                .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
                .map(|row| to_fields(keys, row)),
        );
    }

    if header.is_none() {
        return Err(ParseError::MissingColumns(
            REQUIRED.iter().map(|f| f.key().to_string()).collect(),
        ));
    }
    Ok(Extraction::rows(merge_continuation_rows(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_header_carries_over_tables() {
        let tables = vec![
            grid(&[
                &["Fecha", "Descripción", "Referencia 1", "Valor", "Saldo"],
                &["2024-01-01", "PAGO", "123", "-10,00", "90,00"],
                &["2024-01-02", "TRANSFERENCIA", "", "", ""],
            ]),
            grid(&[
                &["", "A TERCEROS", "", "", ""],
                &["", "", "", "-5,00", "85,00"],
                &["2024-01-03", "ABONO", "", "20,00", "105,00"],
            ]),
        ];
        let out = parse(&tables).unwrap();
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[1].get(Field::Descripcion), "TRANSFERENCIA A TERCEROS");
        assert_eq!(out.rows[1].get(Field::Valor), "-5,00");
        assert_eq!(out.rows[0].get(Field::Referencia1), "123");
        assert_eq!(out.rows[0].get_key("saldo"), "90,00");
    }

    #[test]
    fn test_header_without_amount_column() {
        let tables = vec![grid(&[&["Fecha", "Detalle"], &["2024-01-01", "X"]])];
        assert_eq!(
            parse(&tables).unwrap_err(),
            ParseError::MissingColumns(vec!["valor".into()])
        );
    }

    #[test]
    fn test_no_header_anywhere() {
        let tables = vec![grid(&[&["2024-01-01", "X", "1"]])];
        assert!(matches!(
            parse(&tables),
            Err(ParseError::MissingColumns(names)) if names.len() == 2
        ));
    }
}
