//! Persisted configuration
//!
//! Credentials and the preferred subtitle language live in a JSON file in the
//! platform's standard config directory. Missing values are prompted for once
//! on startup and written back, so subsequent runs are non-interactive.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or storing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory location
    #[error("Failed to determine config directory location")]
    ConfigDirectoryNotFound,

    /// Failed to create or access the config directory
    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// Failed to read the config file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write the config file
    #[error("Failed to write config file {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to delete the config file
    #[error("Failed to delete config file {path}: {source}")]
    RemoveFailed { path: PathBuf, source: io::Error },

    /// Config file contains invalid JSON
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Interactive prompt failed
    #[error("Failed to read input: {0}")]
    PromptFailed(#[from] dialoguer::Error),

    /// Language code is not on the supported list
    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),
}

/// Stored credentials and preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API key for the subtitle catalog
    #[serde(default)]
    pub sdl_api_key: String,
    /// API key for the secondary metadata provider
    #[serde(default)]
    pub omdb_api_key: String,
    /// Preferred subtitle language code (e.g. "EN")
    #[serde(default)]
    pub preferred_lang: String,
}

/// Supported language codes, embedded at compile time.
static LANGUAGES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../data/languages.json"))
        .expect("embedded language table is valid JSON")
});

fn config_file_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("dev", "subfetch", "subfetch")
        .ok_or(ConfigError::ConfigDirectoryNotFound)?;

    let config_dir = proj_dirs.config_dir();
    fs::create_dir_all(config_dir).map_err(|e| ConfigError::DirectoryCreationFailed {
        path: config_dir.to_path_buf(),
        source: e,
    })?;

    Ok(config_dir.join("config.json"))
}

impl Config {
    /// Loads the stored configuration, prompting once for any missing value.
    ///
    /// Newly entered values are written back to the config file so the next
    /// run starts without prompting.
    pub fn load_or_prompt() -> Result<Self, ConfigError> {
        let path = config_file_path()?;

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
                path: path.clone(),
                source: e,
            })?;
            serde_json::from_str(&contents)?
        } else {
            Config::default()
        };

        let mut updated = false;

        if config.sdl_api_key.is_empty() {
            config.sdl_api_key = prompt("SDL API key not assigned, please input your API key")?;
            updated = true;
        }
        if config.omdb_api_key.is_empty() {
            config.omdb_api_key = prompt("OMDB API key not assigned, please input your API key")?;
            updated = true;
        }
        if config.preferred_lang.is_empty() {
            config.preferred_lang =
                prompt("Preferred language not assigned, please input a language code")?
                    .to_uppercase();
            updated = true;
        }

        if updated {
            config.store(&path)?;
        }

        Ok(config)
    }

    fn store(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn prompt(message: &str) -> Result<String, ConfigError> {
    let value: String = dialoguer::Input::new()
        .with_prompt(message)
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Validates a language override against the embedded language table.
///
/// Returns the uppercased code on success so the catalog always receives a
/// canonical value.
pub fn validate_language(code: &str) -> Result<String, ConfigError> {
    let canonical = code.to_uppercase();
    if LANGUAGES.contains_key(&canonical) {
        Ok(canonical)
    } else {
        Err(ConfigError::UnknownLanguage(code.to_string()))
    }
}

/// Pretty-prints the stored configuration to stdout.
pub fn list() -> Result<(), ConfigError> {
    let path = config_file_path()?;
    let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
        path: path.clone(),
        source: e,
    })?;

    let parsed: serde_json::Value = serde_json::from_str(&contents)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

/// Deletes the stored configuration file.
pub fn remove() -> Result<(), ConfigError> {
    let path = config_file_path()?;
    fs::remove_file(&path).map_err(|e| ConfigError::RemoveFailed { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_validation_is_case_insensitive() {
        assert_eq!(validate_language("en").unwrap(), "EN");
        assert_eq!(validate_language("FR").unwrap(), "FR");
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(matches!(
            validate_language("klingon"),
            Err(ConfigError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let config: Config = serde_json::from_str(r#"{"sdl_api_key": "abc"}"#).unwrap();
        assert_eq!(config.sdl_api_key, "abc");
        assert!(config.omdb_api_key.is_empty());
        assert!(config.preferred_lang.is_empty());
    }
}
