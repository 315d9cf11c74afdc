use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use nbias_core::scratch::TmpfsMode;
use nbias_core::{DeleteSourceMode, KdfProfile};

use crate::constants::ENV_CONFIG;

/// Optional user configuration. Every field has a built-in default, so a
/// missing file and an empty file behave the same.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NbiasConfig {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub policy: PolicySection,
    #[serde(default)]
    pub scratch: ScratchSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub editor: Option<String>,
    pub kdf_profile: Option<KdfProfile>,
    pub tmpfs: Option<TmpfsMode>,
    pub vault_extension: Option<String>,
    pub delete_source: Option<DeleteSourceMode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PolicySection {
    pub allow_extensions: Option<Vec<String>>,
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScratchSection {
    /// Memory-backed directory to try before the auto-detected ones.
    pub dir: Option<PathBuf>,
}

/// `$NBIAS_CONFIG`, else the XDG location.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(ENV_CONFIG) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// Load the config, falling back to defaults when no file exists.
pub fn load_config() -> anyhow::Result<NbiasConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(NbiasConfig::default());
    }
    read_config(&path)
}

pub fn read_config(path: &Path) -> anyhow::Result<NbiasConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("nbias"));
        }
    }
    Ok(home_dir()?.join(".config").join("nbias"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve the config path"))?;
    Ok(PathBuf::from(home))
}
