//! Alianza Fiduciaria spreadsheet export. A non-zero `GMF` (the 4x1000
//! financial-transactions tax) becomes a debit record of its own.

use extracto_core::{Field, RawFields, Result, format_amount, try_parse_amount};

use super::Extraction;
use crate::types::Table;

const REQUIRED: [&str; 3] = ["Fecha Transacción", "Concepto", "Valor"];

pub fn parse(table: &Table) -> Result<Extraction> {
    let [fecha, concepto, valor] = table.require(REQUIRED)?;
    let beneficiario = table.column("Beneficiario");
    let gmf = table.column("GMF");

    let mut rows = Vec::new();
    for row in table.iter_rows().filter(|row| !row.is_blank()) {
        let fecha = row.cell(Some(fecha));
        let beneficiario = row.cell(beneficiario);

        rows.push(
            RawFields::new()
                .with(Field::Fecha, fecha)
                .with(Field::Descripcion, row.cell(Some(concepto)))
                .with(Field::Referencia1, beneficiario)
                .with(Field::Valor, row.cell(Some(valor))),
        );

        if let Some(tax) = try_parse_amount(row.cell(gmf)).filter(|t| !t.is_zero()) {
            rows.push(
                RawFields::new()
                    .with(Field::Fecha, fecha)
                    .with(Field::Descripcion, "GMF")
                    .with(Field::Referencia1, beneficiario)
                    .with(Field::Valor, format_amount(-tax.abs())),
            );
        }
    }
    Ok(Extraction::rows(rows))
}
