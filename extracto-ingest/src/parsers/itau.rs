//! Itaú spreadsheet export; headers vary in case and accents.

use extracto_core::{Field, ParseError, RawFields, Result};

use super::{Extraction, signed_from_columns};
use crate::types::Table;

const FECHA: &[&str] = &["fecha"];
const DEBITOS: &[&str] = &["debito", "debitos", "débito", "débitos"];
const CREDITOS: &[&str] = &["credito", "creditos", "crédito", "créditos"];
const DESCRIPCION: &[&str] = &["descripcion", "descripción"];
const CIUDAD: &[&str] = &["ciudad"];
const REFERENCIA: &[&str] = &["no. documento", "codigo movimiento", "código movimiento"];

pub fn parse(table: &Table) -> Result<Extraction> {
    let fecha = table.column_any(FECHA);
    let debitos = table.column_any(DEBITOS);
    let creditos = table.column_any(CREDITOS);
    let descripcion = table.column_any(DESCRIPCION);
    let ciudad = table.column_any(CIUDAD);
    let referencia = table.column_any(REFERENCIA);

    let mut missing: Vec<String> = [
        ("Fecha", fecha),
        ("Débitos", debitos),
        ("Créditos", creditos),
        ("Descripción", descripcion),
        ("Ciudad", ciudad),
    ]
    .into_iter()
    .filter(|(_, col)| col.is_none())
    .map(|(name, _)| name.to_string())
    .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ParseError::MissingColumns(missing));
    }

    let rows = table
        .iter_rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            RawFields::new()
                .with(Field::Fecha, row.cell(fecha))
                .with(Field::Descripcion, row.cell(descripcion))
                .with(Field::SucursalCanal, row.cell(ciudad))
                .with(Field::Referencia1, row.cell(referencia))
                .with(
                    Field::Valor,
                    signed_from_columns(row.cell(creditos), row.cell(debitos)),
                )
        })
        .collect();
    Ok(Extraction::rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_matched_case_insensitively() {
        let t = Table {
            headers: [
                "FECHA",
                "Descripción",
                "CIUDAD",
                "Débitos",
                "Créditos",
                "Código Movimiento",
            ]
            .map(String::from)
            .to_vec(),
            rows: vec![["15/03/2024", "COMPRA POS", "BOGOTA", "89.900", "", "4410"]
                .map(String::from)
                .to_vec()],
        };
        let out = parse(&t).unwrap();
        let row = &out.rows[0];
        assert_eq!(row.get(Field::Valor), "-89900.00");
        assert_eq!(row.get(Field::SucursalCanal), "BOGOTA");
        assert_eq!(row.get(Field::Referencia1), "4410");
    }

    #[test]
    fn test_missing_columns_are_sorted() {
        let t = Table {
            headers: vec!["fecha".into(), "descripcion".into()],
            rows: vec![],
        };
        assert_eq!(
            parse(&t).unwrap_err(),
            ParseError::MissingColumns(vec!["Ciudad".into(), "Créditos".into(), "Débitos".into()])
        );
    }
}
