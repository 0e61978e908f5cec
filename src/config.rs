use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::ApiSettings;

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "OH_TOKEN";
/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "OH_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
  /// API root, requests are sent to `base_url + path`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_url: Option<String>,
  /// Bearer token
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
  /// Skip the read-through cache
  #[serde(default)]
  pub no_cache: bool,
  /// File this config was loaded from, used when saving
  #[serde(skip)]
  path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./oh.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/oh/config.yaml
  ///
  /// With no file found an empty config is returned, so `oh token` can
  /// create one.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("oh.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    Self::default_path().filter(|p| p.exists())
  }

  fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("oh").join("config.yaml"))
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let mut config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
    config.path = Some(path.to_path_buf());

    Ok(config)
  }

  /// Write the config back to where it was loaded from, or to the default
  /// location when it was not loaded from a file.
  pub fn save(&self) -> Result<PathBuf> {
    let path = match &self.path {
      Some(p) => p.clone(),
      None => Self::default_path().ok_or_else(|| eyre!("Could not determine config directory"))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create config directory {}: {}", parent.display(), e))?;
    }

    let contents =
      serde_yaml::to_string(self).map_err(|e| eyre!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, contents)
      .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;

    Ok(path)
  }

  /// Connection settings with environment overrides applied.
  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      base_url: prefer_env(std::env::var(BASE_URL_ENV).ok(), &self.base_url),
      token: prefer_env(std::env::var(TOKEN_ENV).ok(), &self.token),
    }
  }
}

/// A non-empty environment value wins over the file value.
fn prefer_env(env: Option<String>, file: &Option<String>) -> Option<String> {
  env.filter(|v| !v.is_empty()).or_else(|| file.clone())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
      &path,
      "base_url: https://api.example.com/v1/\ntoken: abc\nno_cache: true\n",
    )
    .unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.base_url.as_deref(), Some("https://api.example.com/v1/"));
    assert_eq!(config.token.as_deref(), Some("abc"));
    assert!(config.no_cache);
  }

  #[test]
  fn test_missing_fields_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "token: abc\n").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert!(config.base_url.is_none());
    assert!(!config.no_cache);
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(dir.path().join("nope.yaml").as_path())).is_err());
  }

  #[test]
  fn test_save_writes_back_to_loaded_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "base_url: https://api.example.com/\n").unwrap();

    let mut config = Config::load(Some(path.as_path())).unwrap();
    config.token = Some("new-token".to_string());
    assert_eq!(config.save().unwrap(), path);

    let reloaded = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(reloaded.token.as_deref(), Some("new-token"));
    assert_eq!(reloaded.base_url.as_deref(), Some("https://api.example.com/"));
  }

  #[test]
  fn test_prefer_env() {
    let file = Some("file".to_string());
    assert_eq!(prefer_env(Some("env".to_string()), &file).as_deref(), Some("env"));
    assert_eq!(prefer_env(Some(String::new()), &file).as_deref(), Some("file"));
    assert_eq!(prefer_env(None, &None), None);
  }
}
