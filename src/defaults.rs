//! Default values for crs-text configuration.
//!
//! This module provides centralized default values used by the settings
//! layer and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Environment variable overriding the repository location.
pub const DATABASE_ENV_VAR: &str = "CRS_TEXT_DATABASE";

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV_VAR: &str = "CRS_TEXT_CONFIG";

/// File name of the metadata repository.
pub const DATABASE_FILENAME: &str = "proj.json";

pub const DEFAULT_WKT_CONVENTION: &str = "WKT2_2018";

pub const DEFAULT_PROJ_CONVENTION: &str = "PROJ_5";

/// Returns the default metadata repository path.
///
/// Resolution order:
/// - the `CRS_TEXT_DATABASE` environment variable
/// - the platform data directory (`~/.local/share/crs-text/proj.json` on
///   Linux, `~/Library/Application Support/crs-text/proj.json` on macOS)
///   when the file exists there
/// - `proj.json` in the current directory
pub fn default_database_path() -> PathBuf {
    if let Some(path) = std::env::var_os(DATABASE_ENV_VAR).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join("crs-text").join(DATABASE_FILENAME))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME))
}

/// Returns the default settings file path.
///
/// `CRS_TEXT_CONFIG` when set, else `crs-text/config.yaml` under the
/// platform configuration directory, else `.crs-text.yaml` in the current
/// directory.
pub fn default_settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_ENV_VAR).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("crs-text").join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from(".crs-text.yaml"))
}
