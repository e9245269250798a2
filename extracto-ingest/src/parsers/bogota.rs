//! Banco de Bogotá statement text.
//!
//! Each movement after the `Fecha ...` header reads:
//!   02/01/2024 4455 PAGO NOMINA      <- date, document, description head
//!   EMPLEADOS                        <- more description, until the amount
//!   1.250.000,00                     <- amount
//!   CR                               <- optional CR/DR
//!   1.250.000,00                     <- optional running figure (has a comma)
//!   900123456                        <- optional NIT
//!   0000778899                       <- optional reference
//!   OFICINA PRINCIPAL                <- office

use std::sync::LazyLock;

use extracto_core::{DocumentHeader, Field, RawFields, Result, clean_reference};
use regex::Regex;

use super::{Extraction, directed, header_amount, lines_after};
use crate::segment::{TransactionBlock, segment_keeping_bare_starts};

static DATE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}").expect("valid date regex"));

static AMOUNT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d.]*,\d{2}$").expect("valid amount regex"));

static DEBIT_CREDIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(CR|DR)$").expect("valid cr/dr regex"));

static TOTAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.]+,\d{2}").expect("valid total regex"));

fn is_all_digits(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}

fn parse_block(block: &TransactionBlock) -> RawFields {
    let mut tokens = block.start().split_whitespace();
    let fecha = tokens.next().unwrap_or_default();
    let documento = tokens.next().unwrap_or_default();
    let head = tokens.collect::<Vec<_>>().join(" ");

    let mut rest = block.body().iter().map(String::as_str).peekable();

    let mut description: Vec<&str> = Vec::new();
    if !head.is_empty() {
        description.push(&head);
    }
    while let Some(line) = rest.next_if(|l| !AMOUNT_LINE.is_match(l)) {
        description.push(line);
    }

    let amount = rest.next_if(|l| AMOUNT_LINE.is_match(l)).unwrap_or("0");
    let is_credit = rest
        .next_if(|l| DEBIT_CREDIT.is_match(l))
        .is_some_and(|dc| dc.eq_ignore_ascii_case("CR"));
    rest.next_if(|l| l.contains(','));
    let nit = rest.next_if(|l| is_all_digits(l)).unwrap_or_default();
    let reference = rest.next_if(|l| is_all_digits(l)).unwrap_or_default();
    let office = rest.next().unwrap_or_default();

    RawFields::new()
        .with(Field::Fecha, fecha)
        .with(Field::Documento, documento)
        .with(Field::Descripcion, description.join(" ").trim())
        .with(Field::SucursalCanal, office)
        .with(Field::Referencia1, clean_reference(nit))
        .with(Field::Referencia2, clean_reference(reference))
        .with(Field::Valor, directed(amount, is_credit))
}

/// Totals printed on the `Total abonos` line.
fn totals(lines: &[String]) -> DocumentHeader {
    let Some(line) = lines.iter().find(|l| is_footer(l)) else {
        return DocumentHeader::default();
    };
    let amounts: Vec<&str> = TOTAL_AMOUNT.find_iter(line).map(|m| m.as_str()).collect();
    let [abonos, retiros, neto, ..] = amounts[..] else {
        return DocumentHeader::default();
    };
    DocumentHeader::from_pairs([
        ("total_abonos", header_amount(abonos)),
        ("total_retiros_debitos", header_amount(retiros)),
        ("movimiento_neto", header_amount(neto)),
    ])
}

fn is_footer(line: &str) -> bool {
    line.to_lowercase().starts_with("total abonos")
}

pub fn parse(lines: &[String]) -> Result<Extraction> {
    let movements =
        lines_after(lines, |l| l.to_lowercase().starts_with("fecha")).unwrap_or(lines);
    let movements = movements
        .iter()
        .position(|l| is_footer(l))
        .map_or(movements, |footer| &movements[..footer]);
    let rows = segment_keeping_bare_starts(movements, |l| DATE_START.is_match(l))
        .iter()
        .map(parse_block)
        .collect();
    Ok(Extraction::rows(rows).with_header(totals(lines)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    const STATEMENT: &str = "
        BANCO DE BOGOTA 01/01/2024 - 31/01/2024
        Fecha Doc Transacción Valor
        05/01/2024 4455 PAGO NOMINA
        EMPLEADOS ENERO
        1.250.000,00
        DR
        3.000.000,00
        900123456
        0000778899
        OFICINA PRINCIPAL
        02/01/2024 12 ABONO TRANSFERENCIA
        500,00
        CR
        CHAPINERO
        03/01/2024 13 SIN VALOR
        Total abonos $ 500,00 $ 1.250.000,00 $ -1.249.500,00
    ";

    #[test]
    fn test_debit_with_references() {
        let out = parse(&lines(STATEMENT)).unwrap();
        assert_eq!(out.rows.len(), 3);
        let nomina = &out.rows[0];
        assert_eq!(nomina.get(Field::Fecha), "05/01/2024");
        assert_eq!(nomina.get(Field::Documento), "4455");
        assert_eq!(nomina.get(Field::Descripcion), "PAGO NOMINA EMPLEADOS ENERO");
        assert_eq!(nomina.get(Field::Valor), "-1250000.00");
        assert_eq!(nomina.get(Field::Referencia1), "900123456");
        assert_eq!(nomina.get(Field::Referencia2), "778899");
        assert_eq!(nomina.get(Field::SucursalCanal), "OFICINA PRINCIPAL");
    }

    #[test]
    fn test_credit_without_optional_lines() {
        let out = parse(&lines(STATEMENT)).unwrap();
        let abono = &out.rows[1];
        assert_eq!(abono.get(Field::Valor), "500.00");
        assert_eq!(abono.get(Field::Referencia1), "");
        assert_eq!(abono.get(Field::SucursalCanal), "CHAPINERO");
    }

    #[test]
    fn test_block_without_amount_defaults_to_zero() {
        let out = parse(&lines(STATEMENT)).unwrap();
        let sin_valor = &out.rows[2];
        assert_eq!(sin_valor.get(Field::Valor), "0.00");
        assert_eq!(sin_valor.get(Field::Descripcion), "SIN VALOR");
        assert_eq!(sin_valor.get(Field::SucursalCanal), "");
    }

    #[test]
    fn test_footer_never_becomes_the_office() {
        let out = parse(&lines(
            "
            Fecha Doc Transacción Valor
            02/01/2024 12 ABONO
            500,00
            CR
            Total abonos $ 500,00 $ 0,00 $ 500,00
            ",
        ))
        .unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get(Field::SucursalCanal), "");
        assert_eq!(out.rows[0].get(Field::Descripcion), "ABONO");
    }

    #[test]
    fn test_totals_header() {
        let out = parse(&lines(STATEMENT)).unwrap();
        let header = out.header.unwrap();
        assert_eq!(header.get("total_abonos"), Some("500.00"));
        assert_eq!(header.get("total_retiros_debitos"), Some("1250000.00"));
        assert_eq!(header.get("movimiento_neto"), Some("1249500.00"));
    }
}
