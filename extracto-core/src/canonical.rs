//! Canonicalizer: raw grammar fields -> wire records, sorted by date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::amount::{format_amount, try_parse_amount};
use crate::date::parse_date;
use crate::error::FieldError;
use crate::fields::{Field, RawFields};
use crate::record::{CanonicalRecord, RowDiagnostic};
use crate::reference::compose_reference;

/// Per-bank rendering rules applied during canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankContext {
    /// What the unused amount column holds: `""` or `"0"`.
    pub zero_amount: &'static str,
    /// chrono format tried before the built-in date encodings.
    pub date_hint: Option<&'static str>,
}

impl Default for BankContext {
    fn default() -> Self {
        Self {
            zero_amount: "",
            date_hint: None,
        }
    }
}

/// One canonical record plus what is needed to order and audit it.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonicalized {
    pub record: CanonicalRecord,
    pub sort_key: Option<NaiveDate>,
    pub errors: Vec<FieldError>,
}

/// Map one grammar row to the canonical shape. Never fails; degraded fields
/// are reported in `errors`.
pub fn canonicalize(fields: &RawFields, ctx: &BankContext) -> Canonicalized {
    let mut errors = Vec::new();

    let raw_amount = fields.get(Field::Valor);
    let amount = match try_parse_amount(raw_amount) {
        Some(value) => value,
        None => {
            if !raw_amount.trim().is_empty() {
                errors.push(FieldError::Amount {
                    field: Field::Valor.key().to_string(),
                    raw: raw_amount.to_string(),
                });
            }
            Decimal::ZERO
        }
    };

    let zero = ctx.zero_amount.to_string();
    let (importe_credito, importe_debito) = if amount.is_zero() {
        (zero.clone(), zero)
    } else if amount.is_sign_positive() {
        (format_amount(amount), zero)
    } else {
        (zero, format_amount(amount.abs()))
    };

    let raw_date = fields.get(Field::Fecha);
    let date = parse_date(raw_date, ctx.date_hint);
    let fecha = if date.is_parsed() {
        date.canonical
    } else {
        if !raw_date.trim().is_empty() {
            errors.push(FieldError::Date {
                field: Field::Fecha.key().to_string(),
                raw: raw_date.to_string(),
            });
        }
        String::new()
    };

    let mut referencia = compose_reference(
        fields.get(Field::Referencia1),
        fields.get(Field::Referencia2),
    );
    if referencia.is_empty() {
        referencia = fields.get(Field::Documento).trim().to_string();
    }

    Canonicalized {
        record: CanonicalRecord {
            fecha,
            importe_credito,
            importe_debito,
            referencia,
            info_detallada: fields.get(Field::Descripcion).to_string(),
            info_detallada2: fields.get(Field::SucursalCanal).to_string(),
        },
        sort_key: date.sortable,
        errors,
    }
}

/// Stable ascending sort by date; undated records go last in input order.
pub fn sort_by_date(items: &mut [Canonicalized]) {
    items.sort_by_key(|item| (item.sort_key.is_none(), item.sort_key));
}

/// Canonicalize a whole document's rows and order them. Diagnostic `row`
/// indices point into the returned records.
pub fn canonicalize_all(
    rows: &[RawFields],
    ctx: &BankContext,
) -> (Vec<CanonicalRecord>, Vec<RowDiagnostic>) {
    let mut items: Vec<Canonicalized> =
        rows.iter().map(|fields| canonicalize(fields, ctx)).collect();
    sort_by_date(&mut items);

    let mut diagnostics = Vec::new();
    let records = items
        .into_iter()
        .enumerate()
        .map(|(row, item)| {
            if !item.errors.is_empty() {
                warn!(row, errors = item.errors.len(), "degraded row");
                diagnostics.push(RowDiagnostic {
                    row,
                    errors: item.errors,
                });
            }
            item.record
        })
        .collect();
    (records, diagnostics)
}
