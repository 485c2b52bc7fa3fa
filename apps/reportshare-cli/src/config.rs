//! CLI configuration.
//!
//! Stored as JSON at `~/.config/reportshare/config.json` (`%APPDATA%` on
//! Windows). Every field is optional in the file; missing ones take defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reportshare_publish::Compression;
use serde::{Deserialize, Serialize};

/// Publish settings, merged from the config file and command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Store endpoint that accepts report uploads.
    pub upload_url: String,

    /// Viewer base URL; the content id is appended as a path segment.
    pub viewer_url: String,

    /// Bearer token for the store, if it requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    pub compression: Compression,

    /// Codec level; `None` uses the codec default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,

    /// Upload chunk size in bytes.
    pub chunk_size: usize,

    /// Whole-upload timeout in seconds (0 = none).
    pub timeout_secs: u64,

    /// Open the result in the browser after publishing.
    pub open_result: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            upload_url: "http://127.0.0.1:8080/reports".into(),
            viewer_url: "http://127.0.0.1:8080/viewer".into(),
            api_token: None,
            compression: Compression::default(),
            compression_level: None,
            chunk_size: reportshare_transfer::DEFAULT_CHUNK_SIZE,
            timeout_secs: 300,
            open_result: true,
        }
    }
}

impl PublishConfig {
    /// Loads the config from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads the config from `path`, falling back to defaults when the file
    /// is missing or unparsable.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        set_permissions_0600(path);
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// The file may hold an API token.
fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("reportshare").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp"))
    }
}
