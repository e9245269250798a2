//! Banco Agrario spreadsheet export.

use extracto_core::{Field, RawFields, Result};

use super::{Extraction, signed_from_columns};
use crate::types::Table;

const REQUIRED: [&str; 5] = ["Fecha", "Crédito", "Débito", "Transacción", "Oficina"];

pub fn parse(table: &Table) -> Result<Extraction> {
    let [fecha, credito, debito, transaccion, oficina] = table.require(REQUIRED)?;
    let referencia = ["Referencia", "Nro. Documento", "Documento"]
        .iter()
        .find_map(|name| table.column(name));

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            RawFields::new()
                .with(Field::Fecha, row.cell(Some(fecha)))
                .with(Field::Descripcion, row.cell(Some(transaccion)))
                .with(Field::SucursalCanal, row.cell(Some(oficina)))
                .with(Field::Referencia1, row.cell(referencia))
                .with(
                    Field::Valor,
                    signed_from_columns(row.cell(Some(credito)), row.cell(Some(debito))),
                )
        })
        .collect();
    Ok(Extraction::rows(rows))
}
