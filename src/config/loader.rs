// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::{DistmakeError, Result};
use crate::fs::FileSystem;

/// Load a settings file and return the raw, unvalidated [`RawSettings`].
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path).map_err(|e| {
        DistmakeError::InvalidConfig(format!("cannot read settings {:?}: {e:#}", path))
    })?;

    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a settings file from path and validate it.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(fs, path)?;
    Settings::try_from(raw)
}

/// Resolve the settings for a run.
///
/// - An explicit path must exist and be valid.
/// - Without one, [`default_settings_path`] is used if present.
/// - Otherwise the built-in defaults apply.
pub fn resolve_settings(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_and_validate(fs, path);
    }

    let fallback = default_settings_path();
    if fs.exists(&fallback) {
        debug!(path = ?fallback, "loading settings from default location");
        load_and_validate(fs, &fallback)
    } else {
        debug!("no settings file; using built-in defaults");
        Ok(Settings::default())
    }
}

/// `Distmake.toml` in the current working directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("Distmake.toml")
}
