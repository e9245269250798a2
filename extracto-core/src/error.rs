//! Error taxonomy shared by the normalizers, grammars and the engine facade.

use thiserror::Error;

/// A single field that could not be parsed.
///
/// Never fatal: the field degrades to an empty/zero value and the error is
/// attached to the row as a diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("unparseable amount {raw:?} in `{field}`")]
    Amount { field: String, raw: String },
    #[error("unparseable date {raw:?} in `{field}`")]
    Date { field: String, raw: String },
}

/// Document-level failures returned by `parse`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported bank: {0}")]
    UnsupportedBank(String),

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no tables detected in document")]
    NoTablesDetected,

    #[error("bank `{bank}` expects {expected} input")]
    SourceMismatch { bank: String, expected: &'static str },

    /// Only ever surfaced through row diagnostics.
    #[error(transparent)]
    MalformedField(#[from] FieldError),
}

impl ParseError {
    /// Stable machine-readable code for the surrounding system.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnsupportedBank(_) => "unsupported_bank",
            ParseError::MissingColumns(_) => "missing_columns",
            ParseError::NoTablesDetected => "no_tables_detected",
            ParseError::SourceMismatch { .. } => "source_mismatch",
            ParseError::MalformedField(_) => "malformed_field",
        }
    }

    /// Whether the whole document has to be abandoned.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::MalformedField(_))
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
