use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for beat-montage
///
/// Passed into the assembler at construction; there is no ambient global
/// state, so parallel jobs can each carry their own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Beat analysis settings
    pub audio: AudioConfig,

    /// Montage assembly settings
    pub montage: MontageConfig,

    /// Per-filter settings keyed by filter name
    pub filters: HashMap<String, FilterSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            montage: MontageConfig::default(),
            filters: default_filters(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.montage.validate()?;
        Ok(())
    }

    /// Look up the settings for a named filter
    pub fn filter_settings(&self, name: &str) -> Option<&FilterSettings> {
        self.filters.get(name)
    }
}

/// Beat analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate for analysis (Hz)
    pub sample_rate: u32,

    /// Onset envelope window length in seconds
    pub onset_window: f64,

    /// Upper BPM bound used as the minimum peak distance constraint
    pub max_bpm: f64,

    /// Minimum envelope peak prominence (0.0-1.0)
    pub min_prominence: f64,

    /// BPM used for the synthetic fallback grid
    pub default_bpm: f64,

    /// Assumed track duration when audio decode fails entirely (seconds)
    pub fallback_duration: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            onset_window: 0.05,
            max_bpm: 180.0,
            min_prominence: 0.1,
            default_bpm: 120.0,
            fallback_duration: 69.0,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.sample_rate".to_string(),
                value: self.sample_rate.to_string(),
            }
            .into());
        }

        if self.onset_window <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.onset_window".to_string(),
                value: self.onset_window.to_string(),
            }
            .into());
        }

        if self.max_bpm <= 0.0 || self.default_bpm <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.bpm".to_string(),
                value: format!("max={} default={}", self.max_bpm, self.default_bpm),
            }
            .into());
        }

        Ok(())
    }
}

/// Montage assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MontageConfig {
    /// Full cross-fade window around a beat (seconds); the blend applies
    /// within half this window on either side of the beat
    pub transition_duration: f64,

    /// Minimum number of body clips
    pub min_clips: usize,

    /// Maximum number of body clips
    pub max_clips: usize,

    /// Keep the previous-frame buffer alive across clip boundaries so beat
    /// blends can cross-fade over cut points
    pub carry_blend_across_clips: bool,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            transition_duration: 0.5,
            min_clips: 3,
            max_clips: 6,
            carry_blend_across_clips: true,
        }
    }
}

impl MontageConfig {
    fn validate(&self) -> Result<()> {
        if self.transition_duration <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "montage.transition_duration".to_string(),
                value: self.transition_duration.to_string(),
            }
            .into());
        }

        if self.min_clips == 0 || self.max_clips < self.min_clips {
            return Err(ConfigError::InvalidValue {
                key: "montage.clip_bounds".to_string(),
                value: format!("{}-{}", self.min_clips, self.max_clips),
            }
            .into());
        }

        Ok(())
    }
}

/// Settings for a single named filter
///
/// Parameters are free-form numeric values; each filter documents its own
/// keys and defaults. A disabled filter is an identity transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    pub enabled: bool,

    #[serde(default)]
    pub params: HashMap<String, f64>,
}

impl FilterSettings {
    pub fn enabled_with(params: &[(&str, f64)]) -> Self {
        Self {
            enabled: true,
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    /// Get a named parameter, falling back to the supplied default
    pub fn param_or(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

fn default_filters() -> HashMap<String, FilterSettings> {
    let mut filters = HashMap::new();
    filters.insert("warm".to_string(), FilterSettings::enabled_with(&[("intensity", 0.4)]));
    filters.insert("cool".to_string(), FilterSettings::enabled_with(&[("intensity", 0.4)]));
    filters.insert(
        "cinematic".to_string(),
        FilterSettings::enabled_with(&[("contrast", 1.2), ("saturation", 0.85)]),
    );
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_filters_present() {
        let config = Config::default();
        for name in ["warm", "cool", "cinematic"] {
            let settings = config.filter_settings(name).unwrap();
            assert!(settings.enabled);
        }
        assert_eq!(config.filter_settings("warm").unwrap().param_or("intensity", 0.0), 0.4);
        assert_eq!(config.filter_settings("cinematic").unwrap().param_or("contrast", 0.0), 1.2);
    }

    #[test]
    fn test_param_default_applies_when_absent() {
        let settings = FilterSettings::enabled_with(&[]);
        assert_eq!(settings.param_or("saturation", 0.85), 0.85);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original = Config::default();
        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.montage.transition_duration, loaded.montage.transition_duration);
        assert_eq!(
            original.filter_settings("warm").unwrap().param_or("intensity", 0.0),
            loaded.filter_settings("warm").unwrap().param_or("intensity", 0.0)
        );
    }

    #[test]
    fn test_invalid_transition_duration() {
        let mut config = Config::default();
        config.montage.transition_duration = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_clip_bounds() {
        let mut config = Config::default();
        config.montage.min_clips = 6;
        config.montage.max_clips = 3;
        assert!(config.validate().is_err());
    }
}
