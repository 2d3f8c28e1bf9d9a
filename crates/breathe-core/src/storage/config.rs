//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default cycle target and infinite mode
//! - Box breathing side length
//! - Custom pattern phase lengths
//! - Cue sounds and volume
//! - Progress ticker period
//!
//! Configuration is stored at `~/.config/breathe/config.toml`. The engine never
//! reads it; hosts turn it into a [`SessionConfig`] at start.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::timer::{
    Exercise, PhasePattern, SessionConfig, TickSettings, BOX_SIDE_RANGE, CUSTOM_PHASE_RANGE,
};

const CYCLE_TARGET_RANGE: (u64, u64) = (1, 999);
const VOLUME_RANGE: (u64, u64) = (0, 100);
const PROGRESS_TICK_RANGE: (u64, u64) = (1, 1000);
const SOUNDS_PREFIX: &str = "cues.sounds.";

/// Session defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_cycle_target")]
    pub cycle_target: u32,
    #[serde(default)]
    pub infinite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxBreathingConfig {
    #[serde(default = "default_side_secs")]
    pub side_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPatternConfig {
    #[serde(default = "default_custom_phase")]
    pub inhale_secs: u64,
    #[serde(default = "default_custom_phase")]
    pub hold_secs: u64,
    #[serde(default = "default_custom_phase")]
    pub exhale_secs: u64,
}

/// Cue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell on every cue.
    #[serde(default)]
    pub bell: bool,
    #[serde(default = "default_volume")]
    pub volume: u32,
    /// Cue name ("Inhale", "Hold", "Exhale") to sound file.
    #[serde(default)]
    pub sounds: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathe/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub box_breathing: BoxBreathingConfig,
    #[serde(default)]
    pub custom: CustomPatternConfig,
    #[serde(default)]
    pub cues: CuesConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

// Default functions
fn default_cycle_target() -> u32 {
    4
}
fn default_side_secs() -> u64 {
    4
}
fn default_custom_phase() -> u64 {
    4
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    80
}
fn default_progress_tick_ms() -> u64 {
    16
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            cycle_target: default_cycle_target(),
            infinite: false,
        }
    }
}

impl Default for BoxBreathingConfig {
    fn default() -> Self {
        Self {
            side_secs: default_side_secs(),
        }
    }
}

impl Default for CustomPatternConfig {
    fn default() -> Self {
        Self {
            inhale_secs: default_custom_phase(),
            hold_secs: default_custom_phase(),
            exhale_secs: default_custom_phase(),
        }
    }
}

impl Default for CuesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: false,
            volume: default_volume(),
            sounds: BTreeMap::new(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: default_progress_tick_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;

                // Sound mappings are open-ended; everything else must exist.
                if key.starts_with(SOUNDS_PREFIX) {
                    obj.insert(part.to_string(), serde_json::Value::String(value.into()));
                    return Ok(());
                }
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing and returning the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory.
    ///
    /// The value must parse as the key's current type and the resulting
    /// config must pass [`Config::validate`]; otherwise nothing changes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Check every numeric setting against its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let check = ValidationError::check_range;
        check(
            "session.cycle_target",
            self.session.cycle_target as u64,
            CYCLE_TARGET_RANGE.0,
            CYCLE_TARGET_RANGE.1,
        )?;
        check(
            "box_breathing.side_secs",
            self.box_breathing.side_secs,
            BOX_SIDE_RANGE.0,
            BOX_SIDE_RANGE.1,
        )?;
        let (min, max) = CUSTOM_PHASE_RANGE;
        check("custom.inhale_secs", self.custom.inhale_secs, min, max)?;
        check("custom.hold_secs", self.custom.hold_secs, min, max)?;
        check("custom.exhale_secs", self.custom.exhale_secs, min, max)?;
        check("cues.volume", self.cues.volume as u64, VOLUME_RANGE.0, VOLUME_RANGE.1)?;
        check(
            "engine.progress_tick_ms",
            self.engine.progress_tick_ms,
            PROGRESS_TICK_RANGE.0,
            PROGRESS_TICK_RANGE.1,
        )?;
        Ok(())
    }

    pub fn pattern_for(&self, exercise: Exercise) -> Result<PhasePattern, ValidationError> {
        match exercise {
            Exercise::Box => PhasePattern::box_breathing(self.box_breathing.side_secs),
            Exercise::FourSevenEight => Ok(PhasePattern::four_seven_eight()),
            Exercise::Custom => PhasePattern::custom(
                self.custom.inhale_secs,
                self.custom.hold_secs,
                self.custom.exhale_secs,
            ),
        }
    }

    /// Build the session configuration for `exercise` from these settings.
    pub fn session_config(&self, exercise: Exercise) -> Result<SessionConfig, ValidationError> {
        let config = SessionConfig {
            pattern: self.pattern_for(exercise)?,
            cycle_target: self.session.cycle_target,
            is_infinite: self.session.infinite,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn tick_settings(&self) -> TickSettings {
        TickSettings::with_progress_ms(self.engine.progress_tick_ms)
    }

    /// Cue volume as 0.0 ..= 1.0.
    pub fn cue_volume(&self) -> f32 {
        self.cues.volume.min(100) as f32 / 100.0
    }

    pub fn sound_map(&self) -> HashMap<String, PathBuf> {
        self.cues
            .sounds
            .iter()
            .map(|(cue, path)| (cue.clone(), PathBuf::from(path)))
            .collect()
    }
}
