//! Settings file (`relist.toml`).
//!
//! Precedence: command-line flag > environment variable > file > default.
//! Flags and env vars are wired through clap; this module only handles
//! the file and default layers.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exit_codes::EXIT_RUN_CONFIG;
use crate::CliError;

pub const DEFAULT_CONFIG_PATH: &str = "relist.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the marketplace bridge.
    pub bridge_url: String,
    /// Profile whose listings are scanned.
    pub profile: String,
    /// Ledger CSV path.
    pub ledger: PathBuf,
    /// Percent applied when a row has no per-item override.
    pub default_percent: f64,
    /// Delay before each mutation, in milliseconds.
    pub pacing_ms: u64,
    /// Retry bound for transient mutation failures.
    pub max_retries: u32,
    /// First retry wait, in milliseconds; doubles per retry.
    pub backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bridge_url: "http://127.0.0.1:7878".to_string(),
            profile: String::new(),
            ledger: PathBuf::from("ledger.csv"),
            default_percent: 10.0,
            pacing_ms: 2000,
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

/// Load settings. An explicit `--config` path must exist; the implicit
/// `relist.toml` in the working directory is optional.
pub fn load(path: Option<&Path>) -> Result<Settings, CliError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    if !path.exists() {
        if required {
            return Err(CliError {
                code: EXIT_RUN_CONFIG,
                message: format!("config file not found: {}", path.display()),
                hint: None,
            });
        }
        return Ok(Settings::default());
    }

    let text = std::fs::read_to_string(&path).map_err(|e| CliError {
        code: EXIT_RUN_CONFIG,
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;

    toml::from_str(&text).map_err(|e| CliError {
        code: EXIT_RUN_CONFIG,
        message: format!("invalid config {}: {}", path.display(), e),
        hint: Some("see relist.toml.example for the accepted keys".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_implicit_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let old = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let settings = load(None).unwrap();
        std::env::set_current_dir(old).unwrap();
        assert_eq!(settings.default_percent, 10.0);
        assert_eq!(settings.ledger, PathBuf::from("ledger.csv"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_RUN_CONFIG);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relist.toml");
        std::fs::write(&path, "profile = \"12345\"\ndefault_percent = -15.0\n").unwrap();
        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.profile, "12345");
        assert_eq!(settings.default_percent, -15.0);
        assert_eq!(settings.pacing_ms, 2000);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relist.toml");
        std::fs::write(&path, "porfile = \"typo\"\n").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert_eq!(err.code, EXIT_RUN_CONFIG);
        assert!(err.hint.is_some());
    }
}
