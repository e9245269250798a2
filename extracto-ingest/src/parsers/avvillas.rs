//! Banco AV Villas spreadsheet export. The office description doubles as
//! the reference.

use extracto_core::{Field, RawFields, Result};

use super::{Extraction, signed_from_columns};
use crate::types::Table;

const REQUIRED: [&str; 5] = ["Fecha", "Transacción", "Desc. Oficina", "Débitos", "Créditos"];

pub fn parse(table: &Table) -> Result<Extraction> {
    let [fecha, transaccion, oficina, debitos, creditos] = table.require(REQUIRED)?;

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            RawFields::new()
                .with(Field::Fecha, row.cell(Some(fecha)))
                .with(Field::Descripcion, row.cell(Some(transaccion)))
                .with(Field::Referencia1, row.cell(Some(oficina)))
                .with(
                    Field::Valor,
                    signed_from_columns(row.cell(Some(creditos)), row.cell(Some(debitos))),
                )
        })
        .collect();
    Ok(Extraction::rows(rows))
}
