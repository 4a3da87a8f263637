//! User configuration file handling
//!
//! Manages settings from ~/.config/stroketype/settings.json

use crate::font_source::{LengthUnit, OutlineEngine, ParametricFontModel};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A physical parametrization saved between sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedParameters {
    pub stroke_width: f64,
    pub stroke_width_unit: LengthUnit,
    pub cap_height: f64,
    pub cap_height_unit: LengthUnit,
}

impl SavedParameters {
    /// Physical parameters of `model`, whichever mode it is in.
    ///
    /// `None` in typographic mode, where no physical cap height exists.
    pub fn from_model<E: OutlineEngine>(model: &ParametricFontModel<E>) -> Option<Self> {
        Some(Self {
            stroke_width: model.stroke_width(),
            stroke_width_unit: model.stroke_width_unit(),
            cap_height: model.cap_height()?,
            cap_height_unit: model.cap_height_unit(),
        })
    }

    pub fn apply_to<E: OutlineEngine>(&self, model: &mut ParametricFontModel<E>) -> bool {
        model.set_physical_parameters(
            self.stroke_width,
            self.stroke_width_unit,
            self.cap_height,
            self.cap_height_unit,
        )
    }
}

/// User configuration from ~/.config/stroketype/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Directory containing the external font toolchain
    pub toolchain_path: Option<PathBuf>,
    /// Where build working directories are created
    pub work_dir: Option<PathBuf>,
    /// Typeface directory opened when --source is not given
    pub source_dir: Option<PathBuf>,
    /// Last saved physical parameters
    pub parameters: Option<SavedParameters>,
}

impl ConfigFile {
    /// Get the path to the stroketype config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("stroketype")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Get the path to the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Initialize the user configuration directory
    ///
    /// This creates the config directory, its logs/ directory and a
    /// settings.json with the default toolchain location.
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = Self::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            let example = ConfigFile {
                toolchain_path: crate::compiler::Toolchain::default_location(),
                ..ConfigFile::default()
            };
            example.save()?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::tests::FixedEngine;
    use crate::font_source::InterpretationMode;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = ConfigFile {
            toolchain_path: Some(PathBuf::from("/opt/fdk")),
            work_dir: None,
            source_dir: Some(PathBuf::from("/type/token")),
            parameters: Some(SavedParameters {
                stroke_width: 0.25,
                stroke_width_unit: LengthUnit::Millimeter,
                cap_height: 9.0,
                cap_height_unit: LengthUnit::Point,
            }),
        };
        config.save_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"cap_height_unit\": \"point\""));
        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn unreadable_settings_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(ConfigFile::load_from(&path), None);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let config: ConfigFile = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn saved_parameters_restore_a_model() {
        let mut source = ParametricFontModel::new(FixedEngine::default());
        source.set_stroke_width(0.25);
        source.set_cap_height(3.0);
        let saved = SavedParameters::from_model(&source).unwrap();

        let mut restored = ParametricFontModel::new(FixedEngine::default());
        assert!(saved.apply_to(&mut restored));
        assert_eq!(restored.stroke_width(), 0.25);
        assert_eq!(restored.cap_height(), Some(3.0));

        restored.set_mode(InterpretationMode::Typographic);
        assert_eq!(SavedParameters::from_model(&restored), None);
    }
}
