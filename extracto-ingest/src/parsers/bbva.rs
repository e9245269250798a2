//! BBVA spreadsheet export.
//!
//! The date column has shipped under several names; the movement direction
//! comes from the concept keywords before the amount's sign.

use extracto_core::{Field, ParseError, RawFields, Result, try_parse_amount};

use super::{Extraction, directed};
use crate::types::Table;

const DATE_COLUMNS: [&str; 3] = ["FECHA DE OPERACIÓN", "FECHA VALOR", "FECHA"];
const REQUIRED: [&str; 3] = ["IMPORTE (COP)", "CONCEPTO", "OBSERVACIONES"];

fn signed_importe(concepto: &str, importe: &str) -> String {
    let concepto = concepto.to_lowercase();
    let Some(value) = try_parse_amount(importe) else {
        return importe.to_string();
    };
    let negative = value.is_sign_negative() && !value.is_zero();
    if concepto.contains("retiro") || concepto.contains("rete fuente") || negative {
        directed(importe, false)
    } else {
        directed(importe, true)
    }
}

pub fn parse(table: &Table) -> Result<Extraction> {
    let date_col = DATE_COLUMNS.iter().find_map(|name| table.column(name));
    let [importe, concepto, observaciones] = match (date_col, table.require(REQUIRED)) {
        (Some(_), Ok(cols)) => cols,
        (None, result) => {
            let mut missing = match result {
                Ok(_) => Vec::new(),
                Err(ParseError::MissingColumns(names)) => names,
                Err(other) => return Err(other),
            };
            missing.insert(0, "FECHA".to_string());
            return Err(ParseError::MissingColumns(missing));
        }
        (Some(_), Err(err)) => return Err(err),
    };

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            let concepto = row.cell(Some(concepto));
            RawFields::new()
                .with(Field::Fecha, row.cell(date_col))
                .with(Field::Descripcion, concepto)
                .with(Field::Referencia1, row.cell(Some(observaciones)))
                .with(Field::Valor, signed_importe(concepto, row.cell(Some(importe))))
        })
        .collect();
    Ok(Extraction::rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_keywords_win_over_sign() {
        let t = table(
            &["FECHA VALOR", "CONCEPTO", "OBSERVACIONES", "IMPORTE (COP)"],
            &[
                &["02/01/2024", "RETIRO CAJERO", "ATM 12", "200.000,00"],
                &["03/01/2024", "DEPOSITO", "OF 1", "-50.000,00"],
                &["04/01/2024", "AJUSTE", "", "15,5"],
            ],
        );
        let out = parse(&t).unwrap();
        assert_eq!(out.rows[0].get(Field::Valor), "-200000.00");
        assert_eq!(out.rows[0].get(Field::Referencia1), "ATM 12");
        assert_eq!(out.rows[1].get(Field::Valor), "-50000.00");
        assert_eq!(out.rows[2].get(Field::Valor), "15.50");
        assert_eq!(out.rows[2].get(Field::Fecha), "04/01/2024");
    }

    #[test]
    fn test_missing_date_column_reported() {
        let t = table(&["CONCEPTO", "IMPORTE (COP)"], &[]);
        assert_eq!(
            parse(&t).unwrap_err(),
            ParseError::MissingColumns(vec!["FECHA".into(), "OBSERVACIONES".into()])
        );
    }
}
