//! Application configuration for PacketPress.
//!
//! User config lives at `~/.packetpress/packetpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PacketPressError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "packetpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".packetpress";

// ---------------------------------------------------------------------------
// Config structs (matching packetpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Registered manifests.
    #[serde(default)]
    pub manifests: Vec<ManifestRegistryEntry>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory for assembled packets.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Root directory for per-run working directories.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// File extensions accepted as packet content (lowercase, no dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Keep the per-run working directory after a run (for debugging).
    #[serde(default)]
    pub keep_work_dir: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
            extensions: default_extensions(),
            keep_work_dir: false,
        }
    }
}

fn default_output_dir() -> String {
    "~/packetpress-output".into()
}
fn default_work_dir() -> String {
    std::env::temp_dir()
        .join("packetpress")
        .to_string_lossy()
        .into_owned()
}
fn default_extensions() -> Vec<String> {
    vec!["pdf".into()]
}

/// `[[manifests]]` entry — a registered manifest in the config's registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRegistryEntry {
    /// Human-readable name.
    pub name: String,
    /// Path to the manifest JSON file on disk.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Run options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for one run — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Output directory for the assembled packet.
    pub output_dir: PathBuf,
    /// Root directory under which per-run work dirs are created.
    pub work_dir: PathBuf,
    /// Accepted content extensions (lowercase, no dot).
    pub extensions: Vec<String>,
    /// Keep the per-run work dir after the run completes.
    pub keep_work_dir: bool,
}

impl From<&AppConfig> for RunOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.defaults.output_dir),
            work_dir: PathBuf::from(&config.defaults.work_dir),
            extensions: config.defaults.extensions.clone(),
            keep_work_dir: config.defaults.keep_work_dir,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.packetpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PacketPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.packetpress/packetpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PacketPressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PacketPressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PacketPressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PacketPressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PacketPressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
