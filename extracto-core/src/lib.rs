//! extracto-core: normalizers, raw/canonical record types and the canonicalizer
//! shared by every statement grammar.

pub mod amount;
pub mod canonical;
pub mod date;
pub mod error;
pub mod fields;
pub mod record;
pub mod reference;

pub use amount::{format_amount, parse_amount, try_parse_amount};
pub use canonical::{BankContext, Canonicalized, canonicalize, canonicalize_all, sort_by_date};
pub use date::{NormalizedDate, parse_date};
pub use error::{FieldError, ParseError, Result};
pub use fields::{Field, RawFields};
pub use record::{CanonicalRecord, DocumentHeader, RowDiagnostic};
pub use reference::{clean_reference, compose_reference, extract_references, fill_references};
