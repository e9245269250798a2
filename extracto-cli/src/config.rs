use anyhow::{Context, Result};
use extracto_ingest::SheetHints;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_extracto_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub output: OutputSection,
    /// Defaults for spreadsheet exports; CLI flags override these.
    pub sheet: SheetHints,
    pub batch: BatchSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub pretty: bool,
    pub include_diagnostics: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub workers: usize,
    /// Bound on queued documents not yet picked up by a worker.
    pub queue_capacity: usize,
    /// Retries for transient I/O failures; structural errors are never retried.
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output: OutputSection::default(),
            sheet: SheetHints::default(),
            batch: BatchSection::default(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            pretty: false,
            include_diagnostics: true,
        }
    }
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 16,
            max_retries: 2,
            backoff_ms: 200,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_extracto_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_survives_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(toml::from_str::<Config>(&s).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            log_level = "debug"

            [sheet]
            skip_rows = 2

            [batch]
            workers = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.sheet.skip_rows, 2);
        assert!(cfg.sheet.remove_unnamed_columns);
        assert_eq!(cfg.batch.workers, 8);
        assert_eq!(cfg.batch.max_retries, 2);
        assert!(cfg.output.include_diagnostics);
    }
}
