//! Davivienda statement text: one movement per line between the `Fecha`
//! header and the `Total abonos` footer.
//!
//!   02/01/2024 881 Notas Credito 0123 CALI Normal 10:22 M01 TRASLADO FONDOS $ 1.000,00 $ 0,00 900123 0456 0789 T01
//!   `--------- prefix (shift word splits it) -------------------------------'   total     cheque nit ref1 ref2 terminal

use std::sync::LazyLock;

use extracto_core::{DocumentHeader, Field, RawFields, Result, clean_reference};
use regex::Regex;
use tracing::debug;

use super::{Extraction, directed, header_amount};

static SHIFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(Normal|Adicional)\s+").expect("valid shift regex"));

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([\d.,]+)").expect("valid total regex"));

const CREDIT_TRANSACTIONS: [&str; 2] = ["deposito especial", "notas credito"];

fn parse_row(line: &str) -> Option<RawFields> {
    let mut pieces = line.splitn(3, '$');
    let (prefix, total, rest) = (pieces.next()?, pieces.next()?, pieces.next()?);

    let tail: Vec<&str> = rest.split_whitespace().collect();
    let cheque = *tail.first()?;
    let (nit, ref1, ref2, terminal) = match tail[1..] {
        [nit, ref1, ref2, terminal, ..] => (nit, ref1, ref2, terminal),
        [ref1, ref2, terminal] => ("", ref1, ref2, terminal),
        [ref1, ref2] => ("", ref1, ref2, ""),
        [ref1] => ("", ref1, "", ""),
        _ => ("", "", "", ""),
    };

    let (part1, part2, shift) = match SHIFT.captures(prefix) {
        Some(caps) => {
            let whole = caps.get(0)?;
            (
                prefix[..whole.start()].trim(),
                prefix[whole.end()..].trim(),
                caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
            )
        }
        None => (prefix, "", ""),
    };

    let head: Vec<&str> = part1.split_whitespace().collect();
    if head.len() < 4 {
        return None;
    }
    let transaction = head[2..4].join(" ");
    let office = head[4..].join(" ");

    let detail: Vec<&str> = part2.split_whitespace().collect();
    let hour = detail.first().copied().unwrap_or_default();
    let motive = detail.get(1).copied().unwrap_or_default();
    let description = detail.get(2..).map(|d| d.join(" ")).unwrap_or_default();

    let is_credit = CREDIT_TRANSACTIONS.contains(&transaction.to_lowercase().as_str());

    let mut row = RawFields::new()
        .with(Field::Fecha, head[0])
        .with(Field::Descripcion, description)
        .with(Field::SucursalCanal, office)
        .with(Field::Referencia1, clean_reference(nit))
        .with(Field::Referencia2, clean_reference(ref1))
        .with(Field::Valor, directed(total, is_credit));
    for (key, value) in [
        ("doc", head[1]),
        ("tran", transaction.as_str()),
        ("jornada", shift),
        ("hora", hour),
        ("motivo", motive),
        ("valor_cheque", cheque),
        ("referencia_2", ref2),
        ("terminal", terminal),
    ] {
        row.insert_key(key, value);
    }
    Some(row)
}

/// Totals on the line right after `Total abonos`.
fn totals(lines: &[String], footer: usize) -> DocumentHeader {
    let Some(line) = lines.get(footer + 1) else {
        return DocumentHeader::default();
    };
    let amounts: Vec<&str> = DOLLAR_AMOUNT
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let [abonos, retiros, neto, ..] = amounts[..] else {
        return DocumentHeader::default();
    };
    DocumentHeader::from_pairs([
        ("total_abonos", header_amount(abonos)),
        ("total_retiros_debitos", header_amount(retiros)),
        ("movimiento_neto", header_amount(neto)),
    ])
}

pub fn parse(lines: &[String]) -> Result<Extraction> {
    let start = lines
        .iter()
        .position(|l| l.to_lowercase().starts_with("fecha"))
        .map_or(lines.len(), |idx| idx + 1);
    let footer = lines
        .iter()
        .position(|l| l.to_lowercase().starts_with("total abonos"))
        .unwrap_or(lines.len());

    let window = lines.get(start..footer).unwrap_or(&[]);
    let mut skipped = 0usize;
    let rows: Vec<RawFields> = window
        .iter()
        .filter(|l| l.contains('$'))
        .filter_map(|l| {
            let row = parse_row(l);
            skipped += usize::from(row.is_none());
            row
        })
        .collect();
    if skipped > 0 {
        debug!(skipped, "davivienda lines without a recognizable layout");
    }

    Ok(Extraction::rows(rows).with_header(totals(lines, footer)))
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
        DAVIVIENDA
        Fecha Doc Tran Ofi Jor Hora Mot Desc Valor
        02/01/2024 881 Notas Credito 0123 CALI Normal 10:22 M01 TRASLADO FONDOS $ 1.000,00 $ 0,00 900123 0456 0789 T01
        03/01/2024 882 Nota Debito 0456 Adicional 11:00 M02 COBRO CUOTA $ 250,50 $ 0,00 0789
        04/01/2024 rota $ 1,00 $ 0
        Total abonos
        $ 1.000,00 $ 250,50 $ 749,50
    ";

    #[test]
    fn test_credit_transaction_row() {
        let out = parse(&lines(STATEMENT)).unwrap();
        assert_eq!(out.rows.len(), 2);
        let row = &out.rows[0];
        assert_eq!(row.get(Field::Fecha), "02/01/2024");
        assert_eq!(row.get(Field::Valor), "1000.00");
        assert_eq!(row.get(Field::SucursalCanal), "0123 CALI");
        assert_eq!(row.get(Field::Descripcion), "TRASLADO FONDOS");
        assert_eq!(row.get(Field::Referencia1), "900123");
        assert_eq!(row.get(Field::Referencia2), "456");
        assert_eq!(row.get_key("terminal"), "T01");
        assert_eq!(row.get_key("jornada"), "Normal");
    }

    #[test]
    fn test_short_tail_is_debit_without_nit() {
        let out = parse(&lines(STATEMENT)).unwrap();
        let row = &out.rows[1];
        assert_eq!(row.get(Field::Valor), "-250.50");
        assert_eq!(row.get(Field::Referencia1), "");
        assert_eq!(row.get(Field::Referencia2), "789");
        assert_eq!(row.get(Field::Descripcion), "COBRO CUOTA");
        assert_eq!(row.get(Field::SucursalCanal), "0456");
    }

    #[test]
    fn test_totals_from_line_after_footer() {
        let out = parse(&lines(STATEMENT)).unwrap();
        let header = out.header.unwrap();
        assert_eq!(header.get("total_abonos"), Some("1000.00"));
        assert_eq!(header.get("movimiento_neto"), Some("749.50"));
    }
}
