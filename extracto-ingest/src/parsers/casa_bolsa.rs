//! Casa de Bolsa portfolio statement text.
//!
//! Movements follow `Movimiento del Periodo`; each starts with
//! `Cuenta Ómnibus ... YYYY-MM-DD <Tipo> <detalle> $<valor> ...`.

use std::sync::LazyLock;

use extracto_core::{Field, RawFields, Result, try_parse_amount};
use regex::Regex;

use super::{Extraction, directed};
use crate::segment::{TransactionBlock, segment_keeping_bare_starts};

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^cuenta\s+[oó]mnibus.*\d{4}-\d{2}-\d{2}").expect("valid omnibus regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid iso date regex"));

static DOLLAR_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$-?[\d,.]+").expect("valid value regex"));

static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[\d-]*$").expect("valid id regex"));

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d,.-]+$").expect("valid number regex"));

/// Transaction types printed as two words.
const TWO_WORD_TYPES: [(&str, &str); 2] = [("rete", "fuente"), ("saldo", "inicial")];

#[derive(Debug, Clone, PartialEq)]
struct Movement {
    fecha: String,
    tipo: String,
    detalle: String,
    valor: String,
}

impl Movement {
    fn is_opening_balance(&self) -> bool {
        let tipo = self.tipo.to_lowercase();
        tipo.starts_with("saldo")
            && (tipo.contains("inicial") || self.detalle.to_lowercase().contains("inicial"))
    }

    /// Signed amount following the type's direction, falling back to the
    /// printed sign.
    fn signed_value(&self) -> String {
        let tipo = self.tipo.to_lowercase();
        if tipo.starts_with("deposito") || tipo.starts_with("depósito") {
            directed(&self.valor, true)
        } else if tipo.starts_with("retiro")
            || tipo.starts_with("rete fuente")
            || tipo.starts_with("retefuente")
            || tipo == "rete"
        {
            directed(&self.valor, false)
        } else {
            match try_parse_amount(&self.valor) {
                Some(value) => directed(&self.valor, value.is_sign_positive()),
                None => self.valor.clone(),
            }
        }
    }
}

/// Drop type words, ids and trailing figures around the detail text.
fn detail_tokens<'a>(mut tokens: Vec<&'a str>, tipo: &str) -> Vec<&'a str> {
    let type_tokens: Vec<&str> = tipo.split_whitespace().collect();
    for word in &type_tokens {
        if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case(word)) {
            tokens.remove(0);
        }
    }
    if let Some(first_type) = type_tokens.first() {
        while tokens.len() > 1
            && tokens[0].eq_ignore_ascii_case(first_type)
            && (tokens[1].eq_ignore_ascii_case(first_type) || NUMERIC_ID.is_match(tokens[1]))
        {
            tokens.remove(0);
        }
    }
    while tokens.first().is_some_and(|t| NUMERIC_ID.is_match(t)) {
        tokens.remove(0);
    }
    while tokens
        .last()
        .is_some_and(|t| TRAILING_NUMBER.is_match(t) || *t == "-")
    {
        tokens.pop();
    }
    tokens
}

fn parse_block(block: &TransactionBlock) -> Movement {
    let joined = block.joined();
    let (fecha, rest) = match ISO_DATE.find(&joined) {
        Some(date) => (date.as_str().to_string(), joined[date.end()..].trim()),
        None => (String::new(), joined.as_str()),
    };

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut tipo = tokens.first().copied().unwrap_or_default().to_string();
    if let [first, second, ..] = tokens[..] {
        let pair = (first.to_lowercase(), second.to_lowercase());
        if TWO_WORD_TYPES
            .iter()
            .any(|(a, b)| pair.0 == *a && pair.1 == *b)
        {
            tipo = format!("{first} {second}");
        }
    }

    let value = DOLLAR_VALUE.find(rest);
    let valor = value
        .map(|m| {
            m.as_str()
                .trim_start_matches('$')
                .trim_end_matches([',', '.'])
                .to_string()
        })
        .unwrap_or_else(|| "0".to_string());
    let before_value = value.map_or(rest, |m| &rest[..m.start()]);
    let detalle = detail_tokens(before_value.split_whitespace().collect(), &tipo).join(" ");

    Movement {
        fecha,
        tipo,
        detalle,
        valor,
    }
}

pub fn parse(lines: &[String]) -> Result<Extraction> {
    let movements = lines
        .iter()
        .position(|l| l.to_lowercase().contains("movimiento del periodo"))
        .map_or(lines, |idx| &lines[idx + 1..]);

    let rows = segment_keeping_bare_starts(movements, |l| BLOCK_START.is_match(l))
        .iter()
        .map(parse_block)
        .filter(|movement| !movement.is_opening_balance())
        .map(|movement| {
            RawFields::new()
                .with(Field::Fecha, movement.fecha.as_str())
                .with(Field::Descripcion, movement.detalle.as_str())
                .with(Field::Referencia1, movement.tipo.as_str())
                .with(Field::Valor, movement.signed_value())
        })
        .collect();
    Ok(Extraction::rows(rows))
}
