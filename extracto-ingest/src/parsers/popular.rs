//! Banco Popular spreadsheet export.

use extracto_core::{Field, ParseError, RawFields, Result};

use super::{Extraction, signed_from_columns};
use crate::types::Table;

const REQUIRED: [&str; 5] = ["Fecha", "No. Documento", "Débitos", "Créditos", "Desc. Oficina"];

/// Headings the description column has shipped under.
const DESCRIPTION_COLUMNS: &[&str] = &[
    "transcripcion",
    "Transcripción",
    "Transaccion",
    "Transacción",
    "Descripcion",
    "Descripción",
];

/// The export pads descriptions with zero-only tokens.
fn strip_zero_tokens(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| !token.chars().all(|c| c == '0'))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse(table: &Table) -> Result<Extraction> {
    let [fecha, documento, debitos, creditos, oficina] = table.require(REQUIRED)?;
    let descripcion = table
        .column_any(DESCRIPTION_COLUMNS)
        .ok_or_else(|| ParseError::MissingColumns(vec!["Transcripción".to_string()]))?;

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            RawFields::new()
                .with(Field::Fecha, row.cell(Some(fecha)))
                .with(Field::Descripcion, strip_zero_tokens(row.cell(Some(descripcion))))
                .with(Field::SucursalCanal, row.cell(Some(oficina)))
                .with(Field::Referencia1, row.cell(Some(documento)))
                .with(
                    Field::Valor,
                    signed_from_columns(row.cell(Some(creditos)), row.cell(Some(debitos))),
                )
        })
        .collect();
    Ok(Extraction::rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(description: &str) -> Vec<String> {
        ["Fecha", "No. Documento", description, "Débitos", "Créditos", "Desc. Oficina"]
            .map(String::from)
            .to_vec()
    }

    #[test]
    fn test_description_variants() {
        for heading in ["TRANSCRIPCION", "Transacción", "Descripción"] {
            let t = Table {
                headers: headers(heading),
                rows: vec![
                    ["2024/05/02", "991", "PAGO 000 NOMINA 00", "", "1.000.000,00", "CALLE 72"]
                        .map(String::from)
                        .to_vec(),
                ],
            };
            let out = parse(&t).unwrap();
            assert_eq!(out.rows[0].get(Field::Descripcion), "PAGO NOMINA", "{heading}");
            assert_eq!(out.rows[0].get(Field::Valor), "1000000.00");
            assert_eq!(out.rows[0].get(Field::SucursalCanal), "CALLE 72");
        }
    }

    #[test]
    fn test_missing_description_column() {
        let t = Table {
            headers: headers("Detalle"),
            rows: vec![],
        };
        assert_eq!(
            parse(&t).unwrap_err(),
            ParseError::MissingColumns(vec!["Transcripción".into()])
        );
    }

    #[test]
    fn test_zero_tokens_only() {
        assert_eq!(strip_zero_tokens("CUOTA 1050 0 00"), "CUOTA 1050");
    }
}
