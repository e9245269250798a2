use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$EXTRACTO_HOME`, falling back to `~/.extracto`.
pub fn extracto_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("EXTRACTO_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".extracto"))
}

pub fn ensure_extracto_home() -> Result<PathBuf> {
    let dir = extracto_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
