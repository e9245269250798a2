//! extracto-ingest: statement sources, segmentation, table extraction, the
//! per-bank grammars and the `parse` facade.

pub mod bank;
pub mod parsers;
pub mod segment;
pub mod sheet;
pub mod table;
pub mod types;

pub use bank::{Bank, Grammar};
pub use parsers::Extraction;
pub use segment::{TransactionBlock, segment};
pub use sheet::{SheetError, SheetHints, read_sheet, read_workbook};
pub use table::{DetectedBlock, extract_tables, merge_continuation_rows, normalize_header};
pub use types::{RawCell, Source, Table};

use extracto_core::{
    CanonicalRecord, DocumentHeader, ParseError, Result, RowDiagnostic, canonicalize_all,
};
use serde::Serialize;
use tracing::debug;

/// Result of parsing one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDocument {
    pub bank: Bank,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<DocumentHeader>,
    pub records: Vec<CanonicalRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Parse one document with the grammar registered under `bank_key`.
pub fn parse(bank_key: &str, source: Source) -> Result<ParsedDocument> {
    let bank: Bank = bank_key.parse()?;
    parse_with(bank, source)
}

pub fn parse_with(bank: Bank, source: Source) -> Result<ParsedDocument> {
    let source_kind = source.kind();
    let extraction = match (bank.grammar(), source) {
        (Grammar::Text(grammar), Source::Text(lines)) => grammar(&lines)?,
        (Grammar::Text(grammar), Source::Blocks(blocks)) => {
            grammar(&table::lines_from_blocks(&blocks))?
        }
        (Grammar::Cells(grammar), Source::Cells(cells)) => grammar(&Table::from_cells(cells))?,
        (Grammar::Blocks(grammar), Source::Blocks(blocks)) => {
            let tables = extract_tables(&blocks);
            if tables.is_empty() {
                return Err(ParseError::NoTablesDetected);
            }
            grammar(&tables)?
        }
        (grammar, _) => {
            return Err(ParseError::SourceMismatch {
                bank: bank.key().to_string(),
                expected: grammar.kind(),
            });
        }
    };

    let (records, diagnostics) = canonicalize_all(&extraction.rows, &bank.context());
    debug!(
        bank = bank.key(),
        source = source_kind,
        records = records.len(),
        degraded = diagnostics.len(),
        "parsed document"
    );

    Ok(ParsedDocument {
        bank,
        header: extraction.header,
        records,
        diagnostics,
    })
}
