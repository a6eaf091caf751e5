use std::fs;
use std::path::{Path, PathBuf};

use crate::models::config::RecorderSettings;
use crate::models::error::CaptureError;

/// JSON file holding the user's `RecorderSettings`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load settings; a missing file yields `defaults`.
    pub fn load_or(&self, defaults: RecorderSettings) -> Result<RecorderSettings, CaptureError> {
        if !self.path.exists() {
            log::debug!("No settings file at {:?}, using defaults", self.path);
            return Ok(defaults);
        }
        let json = fs::read_to_string(&self.path)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to parse {}: {}", self.path.display(), e)))
    }

    /// Validate and persist settings, creating parent directories as needed.
    pub fn save(&self, settings: &RecorderSettings) -> Result<(), CaptureError> {
        settings.validate().map_err(CaptureError::ConfigurationFailed)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CaptureError::storage("failed to create settings directory", e))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| CaptureError::storage("failed to serialize settings", e))?;
        fs::write(&self.path, json).map_err(|e| CaptureError::storage("failed to write settings", e))?;
        log::info!("Settings saved to {:?}", self.path);
        Ok(())
    }
}
