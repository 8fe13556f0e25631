//! Caller-side policy knobs. These are deliberately *not* part of the
//! engine: the classifier never enforces a size ceiling, the caller
//! does, before the engine is invoked at all.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Largest file the CLI will hand to the engine, in KiB.
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self { max_file_size_kb: default_max_file_size_kb() }
    }
}

impl CliConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb * 1024
    }
}

// 100 MiB.
fn default_max_file_size_kb() -> u64 {
    100 * 1024
}

/// Load config from `path`, or defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_to_100_mib() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg.max_file_size_kb, 102400);
        assert_eq!(cfg.max_file_size_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn reads_ceiling_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "max_file_size_kb = 512").unwrap();
        let cfg = load(Some(tmp.path())).unwrap();
        assert_eq!(cfg.max_file_size_kb, 512);
    }

    #[test]
    fn empty_file_uses_field_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let cfg = load(Some(tmp.path())).unwrap();
        assert_eq!(cfg.max_file_size_kb, 102400);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/recast.toml"))).is_err());
    }
}
