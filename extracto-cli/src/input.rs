//! Reading statement files from disk into a `Source`.

use anyhow::{Context, Result};
use extracto_ingest::{DetectedBlock, SheetHints, Source, read_sheet, read_workbook};
use serde::Deserialize;
use std::fs;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Extracted PDF text, one line per line.
    Text,
    /// CSV spreadsheet export.
    Sheet,
    /// Excel or OpenDocument workbook.
    Workbook,
    /// OCR service JSON (`{"Blocks": [...]}` or a bare array).
    Blocks,
}

impl InputFormat {
    pub fn detect(path: &Path, force_blocks: bool) -> Self {
        if force_blocks {
            return InputFormat::Blocks;
        }
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => InputFormat::Sheet,
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => InputFormat::Workbook,
            Some("json") => InputFormat::Blocks,
            _ => InputFormat::Text,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlocksFile {
    Response {
        #[serde(rename = "Blocks")]
        blocks: Vec<DetectedBlock>,
    },
    Bare(Vec<DetectedBlock>),
}

impl BlocksFile {
    fn into_blocks(self) -> Vec<DetectedBlock> {
        match self {
            BlocksFile::Response { blocks } | BlocksFile::Bare(blocks) => blocks,
        }
    }
}

pub fn load_source(path: &Path, format: InputFormat, hints: &SheetHints) -> Result<Source> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let source = match format {
        // Older exports are Latin-1; lossy decoding keeps the layout intact.
        InputFormat::Text => Source::from_text(&String::from_utf8_lossy(&bytes)),
        InputFormat::Sheet => {
            let table = read_sheet(bytes.as_slice(), hints)
                .with_context(|| format!("parse sheet {}", path.display()))?;
            Source::from_table(&table)
        }
        InputFormat::Workbook => {
            let table = read_workbook(Cursor::new(bytes), hints)
                .with_context(|| format!("parse workbook {}", path.display()))?;
            Source::from_table(&table)
        }
        InputFormat::Blocks => {
            let file: BlocksFile = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse blocks {}", path.display()))?;
            Source::Blocks(file.into_blocks())
        }
    };
    Ok(source)
}
