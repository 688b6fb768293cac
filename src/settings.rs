use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::models::ParseMode;
use crate::verifier::DEFAULT_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub mode: ParseMode,
    /// Shell command used as the hybrid-mode verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier_command: Option<String>,
    #[serde(default = "default_verifier_timeout_ms")]
    pub verifier_timeout_ms: u64,
}

fn default_verifier_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            mode: ParseMode::default(),
            verifier_command: None,
            verifier_timeout_ms: default_verifier_timeout_ms(),
        }
    }
}

impl Settings {
    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("smsledger.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("smsledger")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("smsledger")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            mode: ParseMode::Hybrid,
            verifier_command: Some("./verify.sh".to_string()),
            verifier_timeout_ms: 250,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.verifier_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.mode, ParseMode::Strict);
        assert_eq!(s.verifier_command, None);
        assert_eq!(s.verifier_timeout_ms, 5000);
        assert!(s.data_dir.ends_with("smsledger"));
        assert!(s.db_path().ends_with("smsledger.db"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "mode": "hybrid"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.mode, ParseMode::Hybrid);
        assert_eq!(s.verifier_timeout_ms, 5000);
        assert_eq!(s.verifier_command, None);
    }

    #[test]
    fn test_unset_verifier_is_not_written() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(!json.contains("verifier_command"));
    }

    #[test]
    fn test_shellexpand_home() {
        if let Some(home) = dirs::home_dir() {
            let expanded = shellexpand_path("~/ledger");
            assert_eq!(expanded, format!("{}/ledger", home.to_string_lossy()));
        }
    }
}
