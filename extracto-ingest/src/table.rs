//! Table extractor for OCR/table-detection output, plus continuation-row merge.
//!
//! Input is the flat block list a Textract-style service returns: TABLE blocks
//! point at CELL blocks, which point at WORD / SELECTION_ELEMENT blocks.

use std::collections::HashMap;
use std::mem;

use extracto_core::{Field, RawFields};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Grid, dense_grid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    Table,
    Cell,
    SelectionElement,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relationship {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

/// One detected block. Unknown JSON keys (geometry, confidence...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedBlock {
    pub id: String,
    pub block_type: BlockType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub row_index: Option<usize>,
    #[serde(default)]
    pub column_index: Option<usize>,
    #[serde(default)]
    pub relationships: Option<Vec<Relationship>>,
    #[serde(default)]
    pub selection_status: Option<String>,
}

impl DetectedBlock {
    /// Ids of CHILD relationships, in order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .flatten()
            .filter(|rel| rel.kind == "CHILD")
            .flat_map(|rel| rel.ids.iter().map(String::as_str))
    }

    fn is_selected(&self) -> bool {
        self.selection_status.as_deref() == Some("SELECTED")
    }
}

/// Text of the LINE blocks, in document order.
pub fn lines_from_blocks(blocks: &[DetectedBlock]) -> Vec<String> {
    blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Line)
        .filter_map(|b| b.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn cell_text(cell: &DetectedBlock, by_id: &HashMap<&str, &DetectedBlock>) -> String {
    let parts: Vec<&str> = cell
        .child_ids()
        .filter_map(|id| by_id.get(id))
        .filter_map(|child| match child.block_type {
            BlockType::Word => child.text.as_deref(),
            BlockType::SelectionElement if child.is_selected() => Some("X"),
            _ => None,
        })
        .collect();
    parts.join(" ")
}

/// Rebuild every TABLE block as a dense grid, in document order.
pub fn extract_tables(blocks: &[DetectedBlock]) -> Vec<Grid> {
    let by_id: HashMap<&str, &DetectedBlock> =
        blocks.iter().map(|b| (b.id.as_str(), b)).collect();

    let tables: Vec<Grid> = blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Table)
        .map(|table| {
            let cells = table
                .child_ids()
                .filter_map(|id| by_id.get(id).copied())
                .filter(|b| b.block_type == BlockType::Cell)
                .map(|cell| {
                    (
                        cell.row_index.unwrap_or(0),
                        cell.column_index.unwrap_or(0),
                        cell_text(cell, &by_id),
                    )
                });
            dense_grid(cells)
        })
        .collect();

    debug!(blocks = blocks.len(), tables = tables.len(), "extracted tables");
    tables
}

fn fold_accents(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

/// Lower-case, accent-free, alphanumerics only: `"Sucursal / Canal"` -> `"sucursalcanal"`.
pub fn header_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(fold_accents)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Map a raw column header to its canonical field key; unknown headers pass
/// through lower-cased.
pub fn normalize_header(raw: &str) -> String {
    let field = match header_key(raw).as_str() {
        "fecha" | "fechamovimiento" | "fechatransaccion" | "fechaoperacion"
        | "fechadeoperacion" | "fechavalor" => Some(Field::Fecha),
        "descripcion" | "concepto" | "transaccion" | "transcripcion" | "detalle"
        | "descripcionmovimiento" => Some(Field::Descripcion),
        "sucursalcanal" | "sucursal" | "canal" | "oficina" | "descoficina" => {
            Some(Field::SucursalCanal)
        }
        "referencia1" | "referencia" | "ref1" => Some(Field::Referencia1),
        "referencia2" | "ref2" => Some(Field::Referencia2),
        "documento" | "nrodocumento" | "nodocumento" | "numerodocumento" | "doc" => {
            Some(Field::Documento)
        }
        "valor" | "importe" | "monto" | "valortotal" => Some(Field::Valor),
        _ => None,
    };
    match field {
        Some(field) => field.key().to_string(),
        None => raw.trim().to_lowercase(),
    }
}

#[derive(Debug, Default)]
enum MergeState {
    #[default]
    Idle,
    Open(RawFields),
}

/// Stitches wrapped OCR rows back onto the record they belong to.
///
/// A row with a date opens a record. A row without one continues the open
/// record: an amount-like value on it is attached and closes the record,
/// otherwise its text is appended field by field.
#[derive(Debug, Default)]
pub struct RowMerger {
    state: MergeState,
    merged: Vec<RawFields>,
    orphans: usize,
}

impl RowMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: RawFields) {
        if !row.is_blank(Field::Fecha) {
            self.close();
            self.state = MergeState::Open(row);
            return;
        }

        let MergeState::Open(open) = &mut self.state else {
            if row.iter().any(|(_, v)| !v.trim().is_empty()) {
                self.orphans += 1;
            }
            return;
        };

        let carries_amount = Field::ALL
            .iter()
            .any(|f| f.is_amount_like() && !row.is_blank(*f));

        for (key, value) in row.iter().filter(|(_, v)| !v.trim().is_empty()) {
            let amount_like = Field::from_key(key).is_some_and(|f| f.is_amount_like());
            if amount_like {
                open.insert_key(key, value.trim());
            } else {
                open.append_key(key, value);
            }
        }

        if carries_amount {
            self.close();
        }
    }

    fn close(&mut self) {
        if let MergeState::Open(record) = mem::take(&mut self.state) {
            self.merged.push(record);
        }
    }

    pub fn finish(mut self) -> Vec<RawFields> {
        self.close();
        if self.orphans > 0 {
            debug!(orphans = self.orphans, "continuation rows without an open record");
        }
        self.merged
    }
}

/// Merge continuation rows into the records they wrap from.
pub fn merge_continuation_rows(rows: Vec<RawFields>) -> Vec<RawFields> {
    rows.into_iter()
        .fold(RowMerger::new(), |mut merger, row| {
            merger.push(row);
            merger
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawFields {
        let mut raw = RawFields::new();
        for (k, v) in pairs {
            raw.insert_key(k, *v);
        }
        raw
    }

    #[test]
    fn test_amount_continuation_closes_record() {
        let merged = merge_continuation_rows(vec![
            row(&[("fecha", "2024-01-01"), ("valor", ""), ("desc", "ABC")]),
            row(&[("fecha", ""), ("valor", "100.00")]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get_key("desc"), "ABC");
        assert_eq!(merged[0].get(Field::Valor), "100.00");
    }

    #[test]
    fn test_text_continuation_is_appended() {
        let merged = merge_continuation_rows(vec![
            row(&[("fecha", "2024-01-01"), ("descripcion", "PAGO PSE"), ("valor", "")]),
            row(&[("fecha", ""), ("descripcion", "EMPRESA XYZ"), ("valor", "")]),
            row(&[("fecha", ""), ("descripcion", "SAS"), ("valor", "-10,00")]),
            row(&[("fecha", ""), ("descripcion", "LOST")]),
            row(&[("fecha", "2024-01-02"), ("descripcion", "ABONO"), ("valor", "5")]),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get(Field::Descripcion), "PAGO PSE EMPRESA XYZ SAS");
        assert_eq!(merged[0].get(Field::Valor), "-10,00");
        assert_eq!(merged[1].get(Field::Descripcion), "ABONO");
    }

    #[test]
    fn test_dated_row_closes_previous_without_amount() {
        let merged = merge_continuation_rows(vec![
            row(&[("fecha", "2024-01-01"), ("descripcion", "A")]),
            row(&[("fecha", "2024-01-02"), ("descripcion", "B")]),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get(Field::Descripcion), "A");
    }

    #[test]
    fn test_leading_continuations_are_orphans() {
        let merged = merge_continuation_rows(vec![
            row(&[("fecha", ""), ("descripcion", "SALDO ANTERIOR")]),
            row(&[("fecha", "2024-01-02"), ("descripcion", "B")]),
        ]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_normalize_header_aliases() {
        assert_eq!(normalize_header("Fecha"), "fecha");
        assert_eq!(normalize_header("  DESCRIPCIÓN "), "descripcion");
        assert_eq!(normalize_header("Sucursal / Canal"), "sucursal_canal");
        assert_eq!(normalize_header("Referencia 1"), "referencia1");
        assert_eq!(normalize_header("Referencia 2"), "referencia2");
        assert_eq!(normalize_header("Documento"), "documento");
        assert_eq!(normalize_header("VALOR"), "valor");
        assert_eq!(normalize_header("Saldo Disponible"), "saldo disponible");
    }

    fn block(json: serde_json::Value) -> DetectedBlock {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_extract_tables_builds_grid() {
        let blocks = vec![
            block(serde_json::json!({"Id": "t1", "BlockType": "TABLE",
                "Relationships": [{"Type": "CHILD", "Ids": ["c1", "c2", "c3", "c4"]}]})),
            block(serde_json::json!({"Id": "c1", "BlockType": "CELL", "RowIndex": 1, "ColumnIndex": 1,
                "Relationships": [{"Type": "CHILD", "Ids": ["w1"]}]})),
            block(serde_json::json!({"Id": "c2", "BlockType": "CELL", "RowIndex": 1, "ColumnIndex": 2,
                "Relationships": [{"Type": "CHILD", "Ids": ["w2", "w3"]}]})),
            block(serde_json::json!({"Id": "c3", "BlockType": "CELL", "RowIndex": 2, "ColumnIndex": 1,
                "Relationships": [{"Type": "CHILD", "Ids": ["s1"]}]})),
            block(serde_json::json!({"Id": "c4", "BlockType": "CELL", "RowIndex": 2, "ColumnIndex": 2})),
            block(serde_json::json!({"Id": "w1", "BlockType": "WORD", "Text": "Fecha", "Confidence": 99.1})),
            block(serde_json::json!({"Id": "w2", "BlockType": "WORD", "Text": "Valor"})),
            block(serde_json::json!({"Id": "w3", "BlockType": "WORD", "Text": "Total"})),
            block(serde_json::json!({"Id": "s1", "BlockType": "SELECTION_ELEMENT", "SelectionStatus": "SELECTED"})),
            block(serde_json::json!({"Id": "k1", "BlockType": "KEY_VALUE_SET"})),
        ];
        let tables = extract_tables(&blocks);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![
                vec!["Fecha".to_string(), "Valor Total".to_string()],
                vec!["X".to_string(), String::new()],
            ]
        );
        assert_eq!(blocks[9].block_type, BlockType::Other);
    }

    #[test]
    fn test_lines_from_blocks_keeps_order() {
        let blocks = vec![
            block(serde_json::json!({"Id": "l1", "BlockType": "LINE", "Text": " FECHA "})),
            block(serde_json::json!({"Id": "w1", "BlockType": "WORD", "Text": "FECHA"})),
            block(serde_json::json!({"Id": "l2", "BlockType": "LINE", "Text": "2024/01/02"})),
        ];
        assert_eq!(lines_from_blocks(&blocks), vec!["FECHA", "2024/01/02"]);
    }
}
