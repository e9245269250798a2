//! Bank registry: one variant per supported statement layout.

use std::fmt;
use std::str::FromStr;

use extracto_core::{BankContext, ParseError, Result};
use serde::Serialize;

use crate::parsers::{self, Extraction};
use crate::types::{Grid, RawLine, Table};

/// Grammar entry point, tagged by the input it consumes.
#[derive(Clone, Copy)]
pub enum Grammar {
    Text(fn(&[RawLine]) -> Result<Extraction>),
    Cells(fn(&Table) -> Result<Extraction>),
    Blocks(fn(&[Grid]) -> Result<Extraction>),
}

impl Grammar {
    pub fn kind(&self) -> &'static str {
        match self {
            Grammar::Text(_) => "text",
            Grammar::Cells(_) => "cells",
            Grammar::Blocks(_) => "blocks",
        }
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grammar::{}", self.kind())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bank {
    Bancolombia,
    Bogota,
    Davivienda,
    CasaBolsa,
    Occidente,
    Popular,
    Agrario,
    Alianza,
    Bbva,
    #[serde(rename = "avvillas")]
    AvVillas,
    Itau,
    Textract,
}

impl Bank {
    pub const ALL: [Bank; 12] = [
        Bank::Bancolombia,
        Bank::Bogota,
        Bank::Davivienda,
        Bank::CasaBolsa,
        Bank::Occidente,
        Bank::Popular,
        Bank::Agrario,
        Bank::Alianza,
        Bank::Bbva,
        Bank::AvVillas,
        Bank::Itau,
        Bank::Textract,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Bank::Bancolombia => "bancolombia",
            Bank::Bogota => "bogota",
            Bank::Davivienda => "davivienda",
            Bank::CasaBolsa => "casa_bolsa",
            Bank::Occidente => "occidente",
            Bank::Popular => "popular",
            Bank::Agrario => "agrario",
            Bank::Alianza => "alianza",
            Bank::Bbva => "bbva",
            Bank::AvVillas => "avvillas",
            Bank::Itau => "itau",
            Bank::Textract => "textract",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Bank::Bancolombia => "Bancolombia",
            Bank::Bogota => "Banco de Bogotá",
            Bank::Davivienda => "Davivienda",
            Bank::CasaBolsa => "Casa de Bolsa",
            Bank::Occidente => "Banco de Occidente",
            Bank::Popular => "Banco Popular",
            Bank::Agrario => "Banco Agrario",
            Bank::Alianza => "Alianza Fiduciaria",
            Bank::Bbva => "BBVA",
            Bank::AvVillas => "Banco AV Villas",
            Bank::Itau => "Itaú",
            Bank::Textract => "OCR table (Textract)",
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Bank::Bancolombia => Grammar::Text(parsers::bancolombia::parse),
            Bank::Bogota => Grammar::Text(parsers::bogota::parse),
            Bank::Davivienda => Grammar::Text(parsers::davivienda::parse),
            Bank::CasaBolsa => Grammar::Text(parsers::casa_bolsa::parse),
            Bank::Occidente => Grammar::Cells(parsers::occidente::parse),
            Bank::Popular => Grammar::Cells(parsers::popular::parse),
            Bank::Agrario => Grammar::Cells(parsers::agrario::parse),
            Bank::Alianza => Grammar::Cells(parsers::alianza::parse),
            Bank::Bbva => Grammar::Cells(parsers::bbva::parse),
            Bank::AvVillas => Grammar::Cells(parsers::avvillas::parse),
            Bank::Itau => Grammar::Cells(parsers::itau::parse),
            Bank::Textract => Grammar::Blocks(parsers::textract::parse),
        }
    }

    /// Rendering rules the canonicalizer applies for this bank.
    pub fn context(&self) -> BankContext {
        let zero_amount = match self {
            Bank::Bogota | Bank::Davivienda | Bank::Bbva => "0",
            _ => "",
        };
        let date_hint = match self {
            Bank::Bancolombia | Bank::Occidente | Bank::Popular => Some("%Y/%m/%d"),
            Bank::Bogota | Bank::Davivienda | Bank::Agrario | Bank::Bbva => Some("%d/%m/%Y"),
            _ => None,
        };
        BankContext {
            zero_amount,
            date_hint,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Bank {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                'á' => 'a',
                'ú' => 'u',
                other => other,
            })
            .collect();
        let bank = match key.as_str() {
            "bancolombia" => Bank::Bancolombia,
            "bogota" | "banco_de_bogota" => Bank::Bogota,
            "davivienda" => Bank::Davivienda,
            "casa_bolsa" | "casa_de_bolsa" | "casabolsa" => Bank::CasaBolsa,
            "occidente" | "banco_de_occidente" => Bank::Occidente,
            "popular" | "banco_popular" => Bank::Popular,
            "agrario" | "banco_agrario" => Bank::Agrario,
            "alianza" => Bank::Alianza,
            "bbva" => Bank::Bbva,
            "avvillas" | "av_villas" => Bank::AvVillas,
            "itau" => Bank::Itau,
            "textract" | "ocr" => Bank::Textract,
            _ => return Err(ParseError::UnsupportedBank(raw.to_string())),
        };
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_parse_back() {
        for bank in Bank::ALL {
            assert_eq!(bank.key().parse::<Bank>().unwrap(), bank);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("Banco de Bogotá".parse::<Bank>().unwrap(), Bank::Bogota);
        assert_eq!("AV-Villas".parse::<Bank>().unwrap(), Bank::AvVillas);
        assert_eq!(" ITAÚ ".parse::<Bank>().unwrap(), Bank::Itau);
    }

    #[test]
    fn test_unknown_bank() {
        assert_eq!(
            "nubank".parse::<Bank>(),
            Err(ParseError::UnsupportedBank("nubank".into()))
        );
    }

    #[test]
    fn test_serializes_as_key() {
        for bank in Bank::ALL {
            assert_eq!(
                serde_json::to_value(bank).unwrap(),
                serde_json::Value::String(bank.key().to_string())
            );
        }
    }

    #[test]
    fn test_zero_placeholder_banks() {
        assert_eq!(Bank::Bogota.context().zero_amount, "0");
        assert_eq!(Bank::Itau.context().zero_amount, "");
        assert_eq!(Bank::Textract.grammar().kind(), "blocks");
    }
}
