//! Bancolombia statement text.
//!
//! Layout after the `FECHA ...` column header:
//!   2024/01/02
//!   CNB REDESCONSIG 123456          <- description line (branch + operation)
//!   0009876543                      <- reference lines
//!   1,500,000.00                    <- value line (may share a line with text)

use std::sync::LazyLock;

use extracto_core::{DocumentHeader, Field, RawFields, Result, extract_references, fill_references};
use regex::Regex;
use tracing::debug;

use super::{Extraction, lines_after, signed_amount};
use crate::segment::{TransactionBlock, find_value_line, segment};

static DATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("valid date regex"));

static WHOLE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[\d,]+\.\d+$").expect("valid value regex"));

static TAIL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(-?[\d,]+\.\d+)$").expect("valid tail regex"));

static OPERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(TRANSFERENCIA|REDESCONSIGNACION|CONSIGNACION|IMPTO|VALOR|COMIS|INTERESES|ABONO|DEPÓSITO|DEPOSITO|RETIRO|PAGO|CONSIG|RECAUDO)",
    )
    .expect("valid operation regex")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*?\d+").expect("valid digits regex"));

static NEQUI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NEQUI").expect("valid nequi regex"));

static REDESCONSIG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^REDESCONSIG").expect("valid redesconsig regex"));

const HEADER_LABELS: [(&str, &str); 10] = [
    ("Empresa", "empresa"),
    ("Número de Cuenta", "numero_cuenta"),
    ("Fecha y Hora Actual", "fecha_hora_actual"),
    ("NIT", "nit"),
    ("Tipo de cuenta", "tipo_cuenta"),
    ("Fecha y Hora Consulta", "fecha_hora_consulta"),
    ("Impreso por", "impreso_por"),
    ("Saldo Efectivo Actual", "saldo_efectivo_actual"),
    ("Saldo en Canje Actual", "saldo_canje_actual"),
    ("Saldo Total Actual", "saldo_total_actual"),
];

fn header(lines: &[String]) -> DocumentHeader {
    let value_of = |label: &str| -> String {
        let prefix = format!("{label}:");
        let Some(idx) = lines.iter().position(|l| l.starts_with(&prefix)) else {
            return String::new();
        };
        let inline = lines[idx][prefix.len()..].trim();
        let value = if inline.is_empty() {
            lines.get(idx + 1).map(|l| l.trim()).unwrap_or("")
        } else {
            inline
        };
        value.to_string()
    };

    DocumentHeader::from_pairs(HEADER_LABELS.iter().map(|(label, key)| {
        let mut value = value_of(label);
        if key.starts_with("saldo_") {
            value.retain(|c| c != '$' && c != ',');
        }
        (*key, value)
    }))
}

/// Split a description line into `(sucursal_canal, descripcion)`.
fn split_operation(raw_desc: &str) -> (String, String) {
    if raw_desc.to_uppercase().starts_with("CNB") {
        let rest = raw_desc.get(3..).unwrap_or("").trim();
        let rest = REDESCONSIG.replace(rest, "CONSIG");
        let description = DIGITS.replace_all(&rest, "").trim().to_string();
        return ("CNB REDES".to_string(), description);
    }

    let rest = DIGITS.replace_all(raw_desc, "");
    let rest = rest.trim();
    match OPERATION.find(rest) {
        Some(op) => {
            let prefix = rest[..op.start()].trim();
            let suffix = rest[op.start()..].trim();
            let split_at = prefix.len().saturating_sub(3);
            match prefix.get(split_at..) {
                Some(tail) if tail.eq_ignore_ascii_case("IVA") => {
                    (prefix[..split_at].trim().to_string(), format!("IVA {suffix}"))
                }
                _ => (prefix.to_string(), suffix.to_string()),
            }
        }
        None => (String::new(), rest.to_string()),
    }
}

/// `(referencia1, referencia2)` for one block.
fn references(raw_desc: &str, ref_lines: &[String]) -> (String, String) {
    if let Some(nequi) = NEQUI.find(raw_desc).filter(|_| !ref_lines.is_empty()) {
        let sender = raw_desc[nequi.end()..].trim();
        let parts: Vec<&str> = std::iter::once(sender)
            .chain(ref_lines.iter().map(String::as_str))
            .filter(|p| !p.is_empty())
            .collect();
        return (parts.join(" "), String::new());
    }

    let mut refs = extract_references(ref_lines, 2);
    if refs.len() < 2 {
        fill_references(&mut refs, &[raw_desc], 2);
    }
    let mut refs = refs.into_iter();
    (refs.next().unwrap_or_default(), refs.next().unwrap_or_default())
}

fn parse_block(block: TransactionBlock) -> RawFields {
    let fecha = block.start().to_string();
    let mut body = block.into_body();

    let (valor, value_index) = match find_value_line(&mut body, &WHOLE_VALUE, &TAIL_VALUE) {
        Some(found) => (signed_amount(&found.raw), found.index),
        None => (String::new(), body.len()),
    };

    let raw_desc = body.first().cloned().unwrap_or_default();
    let ref_lines = body.get(1..value_index).unwrap_or(&[]);
    let (referencia1, referencia2) = references(&raw_desc, ref_lines);
    let (sucursal_canal, descripcion) = split_operation(&raw_desc);

    RawFields::new()
        .with(Field::Fecha, fecha)
        .with(Field::Descripcion, descripcion)
        .with(Field::SucursalCanal, sucursal_canal)
        .with(Field::Referencia1, referencia1)
        .with(Field::Referencia2, referencia2)
        .with(Field::Valor, valor)
}

pub fn parse(lines: &[String]) -> Result<Extraction> {
    let header = header(lines);
    let Some(movements) = lines_after(lines, |l| l.to_uppercase().starts_with("FECHA")) else {
        debug!("no FECHA header line, statement has no movements");
        return Ok(Extraction::default().with_header(header));
    };

    let rows = segment(movements, |l| DATE_LINE.is_match(l))
        .into_iter()
        .map(parse_block)
        .collect();
    Ok(Extraction::rows(rows).with_header(header))
}
