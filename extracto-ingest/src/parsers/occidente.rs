//! Banco de Occidente spreadsheet export.
//!
//! `Nro. Documento` is often blank; the document number then sits at the end
//! of the transaction text. Rows without any number carry the branch literal
//! the bank prints for its main office.

use extracto_core::{Field, RawFields, Result};

use super::{Extraction, signed_from_columns};
use crate::types::Table;

const REQUIRED: [&str; 5] = ["Fecha", "Débitos", "Créditos", "Nro. Documento", "Transacción"];

const MAIN_OFFICE: &str = "AVENIDA 3A. NORTE";

/// `(referencia, transaccion)` for one row.
fn reference_and_text(documento: &str, transaccion: &str) -> (String, String) {
    let (referencia, text) = match documento {
        "0" => (MAIN_OFFICE.to_string(), transaccion),
        "" => match transaccion.rsplit_once(' ') {
            Some((text, last)) if last.chars().any(|c| c.is_ascii_digit()) => {
                (last.to_string(), text.trim_end())
            }
            _ => (MAIN_OFFICE.to_string(), transaccion),
        },
        doc => (doc.to_string(), transaccion),
    };
    if referencia == text {
        (String::new(), text.to_string())
    } else {
        (referencia, text.to_string())
    }
}

pub fn parse(table: &Table) -> Result<Extraction> {
    let [fecha, debitos, creditos, documento, transaccion] = table.require(REQUIRED)?;

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            let (referencia, text) =
                reference_and_text(row.cell(Some(documento)), row.cell(Some(transaccion)));
            RawFields::new()
                .with(Field::Fecha, row.cell(Some(fecha)))
                .with(Field::Descripcion, text)
                .with(Field::Referencia1, referencia)
                .with(
                    Field::Valor,
                    signed_from_columns(row.cell(Some(creditos)), row.cell(Some(debitos))),
                )
        })
        .collect();
    Ok(Extraction::rows(rows))
}
