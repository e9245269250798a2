//! Raw field dictionaries produced by grammars.
//!
//! Grammars speak a shared key vocabulary ([`Field`]). Keys coming from
//! foreign layouts (OCR table headers) are validated once through
//! [`RawFields::insert_key`]: known names land on their `Field`, everything
//! else is kept aside in `extra` instead of silently turning into a typo.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The canonical raw-field keys every grammar fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Fecha,
    Descripcion,
    SucursalCanal,
    Referencia1,
    Referencia2,
    Documento,
    /// Signed amount: positive is a credit, negative a debit.
    Valor,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Fecha,
        Field::Descripcion,
        Field::SucursalCanal,
        Field::Referencia1,
        Field::Referencia2,
        Field::Documento,
        Field::Valor,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Fecha => "fecha",
            Field::Descripcion => "descripcion",
            Field::SucursalCanal => "sucursal_canal",
            Field::Referencia1 => "referencia1",
            Field::Referencia2 => "referencia2",
            Field::Documento => "documento",
            Field::Valor => "valor",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Fields that close a wrapped OCR row when they show up on it.
    pub fn is_amount_like(&self) -> bool {
        matches!(self, Field::Valor | Field::Documento)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One grammar's view of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawFields {
    values: BTreeMap<Field, String>,
    extra: BTreeMap<String, String>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    /// Value of `field`, `""` when absent.
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Insert by string key; unknown keys go to `extra`.
    pub fn insert_key(&mut self, key: &str, value: impl Into<String>) {
        match Field::from_key(key) {
            Some(field) => self.set(field, value),
            None => {
                self.extra.insert(key.to_string(), value.into());
            }
        }
    }

    /// Look up a key in either the canonical or the pass-through map.
    pub fn get_key(&self, key: &str) -> &str {
        match Field::from_key(key) {
            Some(field) => self.get(field),
            None => self.extra.get(key).map(String::as_str).unwrap_or(""),
        }
    }

    /// Space-join `text` onto whatever `key` already holds.
    pub fn append_key(&mut self, key: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let joined = match self.get_key(key) {
            "" => text.to_string(),
            existing => format!("{existing} {text}"),
        };
        self.insert_key(key, joined);
    }

    pub fn is_blank(&self, field: Field) -> bool {
        self.get(field).trim().is_empty()
    }

    /// All `(key, value)` pairs, canonical keys first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(f, v)| (f.key(), v.as_str()))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }
}
