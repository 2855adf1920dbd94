// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback settings, stored as RON next to the scenes they drive.

use crate::error::{Result, SceneError};
use purupuru_graph::Flavor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Default cap on non-interactive nodes crossed by one playback advance
pub const DEFAULT_MAX_AUTO_STEPS: usize = 256;

/// Settings of a playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Settings format version
    pub version: u32,
    /// Flavor of the player character
    #[serde(default)]
    pub main_character_flavor: Flavor,
    /// Fixed seed for dice rolls; random when absent
    #[serde(default)]
    pub dice_seed: Option<u64>,
    /// Most non-interactive nodes one advance may cross
    #[serde(default = "default_max_auto_steps")]
    pub max_auto_steps: usize,
    /// Pretty-print the distribution export
    #[serde(default)]
    pub pretty_export: bool,
}

fn default_max_auto_steps() -> usize {
    DEFAULT_MAX_AUTO_STEPS
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            main_character_flavor: Flavor::default(),
            dice_seed: None,
            max_auto_steps: DEFAULT_MAX_AUTO_STEPS,
            pretty_export: false,
        }
    }
}

impl PlaybackSettings {
    /// Parse settings from RON, refusing files from a newer format
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = ron::from_str(content).map_err(SceneError::Settings)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SceneError::UnsupportedSettings {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        Ok(settings)
    }

    /// Encode as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Self::parse(&std::fs::read_to_string(path)?)?;
        tracing::debug!("Loaded playback settings from {}", path.display());
        Ok(settings)
    }

    /// Write a settings file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::debug!("Saved playback settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlaybackSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.max_auto_steps, DEFAULT_MAX_AUTO_STEPS);
        assert!(settings.dice_seed.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playback.ron");
        let settings = PlaybackSettings {
            main_character_flavor: Flavor::SweetSour,
            dice_seed: Some(42),
            ..PlaybackSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(PlaybackSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = PlaybackSettings::parse("(version: 1)").unwrap();
        assert_eq!(loaded.max_auto_steps, DEFAULT_MAX_AUTO_STEPS);
        assert_eq!(loaded.main_character_flavor, Flavor::Bitter);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playback.ron");
        std::fs::write(&path, "(version: 99)").unwrap();
        assert!(matches!(
            PlaybackSettings::load(&path),
            Err(SceneError::UnsupportedSettings { found: 99, supported: SETTINGS_FORMAT_VERSION })
        ));
    }

    #[test]
    fn test_load_errors_are_scene_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playback.ron");
        std::fs::write(&path, "(version: \"one\")").unwrap();
        let err = PlaybackSettings::load(&path).unwrap_err();
        assert!(matches!(err, SceneError::Settings(_)));
        assert!(err.to_string().starts_with("failed to parse settings"));

        assert!(matches!(
            PlaybackSettings::load(&dir.path().join("missing.ron")),
            Err(SceneError::Io(_))
        ));
    }
}
