//! Option storage for the embedding application.
//!
//! `DmaSession` never reads or writes files; it takes a `DmaConfiguration`
//! by value. These helpers let a caller keep the user-settable options
//! between runs.

use std::fs;
use std::path::Path;

use crate::models::config::DmaConfiguration;
use crate::models::error::DmaError;

/// Persist the user-settable options as pretty-printed JSON.
pub fn write_configuration(config: &DmaConfiguration, path: &Path) -> Result<(), DmaError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| DmaError::Settings(format!("failed to serialize settings: {}", e)))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DmaError::Settings(format!("failed to create directory: {}", e)))?;
    }
    fs::write(path, json)
        .map_err(|e| DmaError::Settings(format!("failed to write settings: {}", e)))?;
    Ok(())
}

/// Read options written by `write_configuration`. Missing fields take
/// their defaults.
pub fn read_configuration(path: &Path) -> Result<DmaConfiguration, DmaError> {
    let json = fs::read_to_string(path)
        .map_err(|e| DmaError::Settings(format!("failed to read settings: {}", e)))?;
    let config: DmaConfiguration = serde_json::from_str(&json)
        .map_err(|e| DmaError::Settings(format!("failed to parse settings: {}", e)))?;
    Ok(config)
}

/// Like `read_configuration`, but a missing or unreadable file yields the
/// defaults.
pub fn read_configuration_or_default(path: &Path) -> DmaConfiguration {
    if !path.exists() {
        return DmaConfiguration::default();
    }
    read_configuration(path).unwrap_or_else(|e| {
        log::warn!("{}; using default audio settings", e);
        DmaConfiguration::default()
    })
}
