//! Per-bank grammars.
//!
//! Text grammars take the statement's trimmed lines, cell grammars take the
//! header + rows table of a spreadsheet export, and the OCR grammar takes the
//! grids rebuilt by the table extractor. Each returns raw field rows carrying
//! a signed `valor`; the canonicalizer decides the credit/debit column.

pub mod agrario;
pub mod alianza;
pub mod avvillas;
pub mod bancolombia;
pub mod bbva;
pub mod bogota;
pub mod casa_bolsa;
pub mod davivienda;
pub mod itau;
pub mod occidente;
pub mod popular;
pub mod textract;

use extracto_core::{DocumentHeader, RawFields, format_amount, parse_amount, try_parse_amount};

/// What a grammar found in one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub header: Option<DocumentHeader>,
    pub rows: Vec<RawFields>,
}

impl Extraction {
    pub fn rows(rows: Vec<RawFields>) -> Self {
        Self { header: None, rows }
    }

    pub fn with_header(mut self, header: DocumentHeader) -> Self {
        self.header = (!header.is_empty()).then_some(header);
        self
    }
}

/// Lines following the first one matching `is_marker`.
pub(crate) fn lines_after<'a>(
    lines: &'a [String],
    is_marker: impl Fn(&str) -> bool,
) -> Option<&'a [String]> {
    lines
        .iter()
        .position(|l| is_marker(l))
        .map(|idx| &lines[idx + 1..])
}

/// Give a printed magnitude the direction the statement assigns it.
/// Unparseable text is passed through so the canonicalizer can report it.
pub(crate) fn directed(raw: &str, credit: bool) -> String {
    match try_parse_amount(raw) {
        Some(value) if credit || value.is_zero() => format_amount(value.abs()),
        Some(value) => format_amount(-value.abs()),
        None => raw.trim().to_string(),
    }
}

/// A printed signed amount in canonical form; unparseable text passes through.
pub(crate) fn signed_amount(raw: &str) -> String {
    match try_parse_amount(raw) {
        Some(value) => format_amount(value),
        None => raw.trim().to_string(),
    }
}

/// Fold separate credit/debit columns into one signed value.
pub(crate) fn signed_from_columns(credit: &str, debit: &str) -> String {
    let (credit, debit) = (credit.trim(), debit.trim());
    match (try_parse_amount(credit), try_parse_amount(debit)) {
        (Some(c), _) if !c.is_zero() => format_amount(c.abs()),
        (_, Some(d)) if !d.is_zero() => format_amount(-d.abs()),
        (None, _) if !credit.is_empty() => credit.to_string(),
        (_, None) if !debit.is_empty() => debit.to_string(),
        _ => String::new(),
    }
}

/// Normalized amount for document headers (`"1.234,56"` -> `"1234.56"`).
pub(crate) fn header_amount(raw: &str) -> String {
    format_amount(parse_amount(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_from_columns() {
        assert_eq!(signed_from_columns("1.500,00", ""), "1500.00");
        assert_eq!(signed_from_columns("0", "20,5"), "-20.50");
        assert_eq!(signed_from_columns("", "-20,5"), "-20.50");
        assert_eq!(signed_from_columns("", ""), "");
        assert_eq!(signed_from_columns("0", "0"), "");
        assert_eq!(signed_from_columns("N/A", ""), "N/A");
    }

    #[test]
    fn test_directed() {
        assert_eq!(directed("1.234,56", true), "1234.56");
        assert_eq!(directed("1.234,56", false), "-1234.56");
        assert_eq!(directed("-9", true), "9.00");
        assert_eq!(directed("0", false), "0.00");
        assert_eq!(directed("??", false), "??");
    }

    #[test]
    fn test_signed_amount_keeps_sign() {
        assert_eq!(signed_amount("-1,500.50"), "-1500.50");
        assert_eq!(signed_amount("12,50"), "12.50");
        assert_eq!(signed_amount("x"), "x");
    }

    #[test]
    fn test_lines_after_marker() {
        let lines: Vec<String> = ["a", "FECHA", "b"].map(String::from).to_vec();
        assert_eq!(lines_after(&lines, |l| l == "FECHA"), Some(&lines[2..]));
        assert_eq!(lines_after(&lines, |l| l == "nope"), None);
    }
}
