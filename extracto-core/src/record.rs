//! Output types: the canonical record wire shape and document metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// The unified transaction shape every grammar converges to.
///
/// Field names and order are a wire contract with downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// `DD/MM/YYYY`, empty when the date could not be parsed
    #[serde(rename = "Fecha")]
    pub fecha: String,
    pub importe_credito: String,
    pub importe_debito: String,
    pub referencia: String,
    #[serde(rename = "Info_detallada")]
    pub info_detallada: String,
    #[serde(rename = "Info_detallada2")]
    pub info_detallada2: String,
}

impl CanonicalRecord {
    pub fn is_credit(&self) -> bool {
        is_populated(&self.importe_credito)
    }

    pub fn is_debit(&self) -> bool {
        is_populated(&self.importe_debito)
    }
}

/// `""` and `"0"` both mean "not this side".
fn is_populated(amount: &str) -> bool {
    !amount.is_empty() && amount != "0"
}

/// Key/value metadata found ahead of the transaction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHeader {
    fields: BTreeMap<String, String>,
}

impl DocumentHeader {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Degraded fields of one source row; the record itself is still emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// Index of the affected record in the sorted output.
    pub row: usize,
    pub errors: Vec<FieldError>,
}

impl Serialize for RowDiagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        let mut state = serializer.serialize_struct("RowDiagnostic", 2)?;
        state.serialize_field("row", &self.row)?;
        state.serialize_field("errors", &messages)?;
        state.end()
    }
}
