//! TOML-based application configuration.
//!
//! Stores engine tunables:
//! - Balloon population cap, pacing and pop timing
//! - Particle per-call cap and removal buffer
//! - Audio on/off
//! - Optional custom rule table and RNG seed
//!
//! Configuration is stored at `~/.config/typefx/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::effects::{BalloonSettings, EffectsEngine, EngineSettings, ParticleSettings};
use crate::error::{ConfigError, RuleError};
use crate::rules::RuleTable;

/// Balloon lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalloonConfig {
    #[serde(default = "default_balloon_max")]
    pub max: u32,
    #[serde(default = "default_200")]
    pub spawn_delay_ms: u64,
    #[serde(default = "default_200")]
    pub pop_base_delay_ms: u64,
    #[serde(default = "default_pop_random_variation")]
    pub pop_random_variation_ms: u64,
    #[serde(default = "default_500")]
    pub pop_duration_ms: u64,
}

/// Particle lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    #[serde(default = "default_max_per_call")]
    pub max_per_call: u32,
    #[serde(default = "default_500")]
    pub removal_buffer_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Rule table source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Custom rule table file. The built-in table is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/typefx/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed RNG seed for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub balloons: BalloonConfig,
    #[serde(default)]
    pub particles: ParticleConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

// Default functions
fn default_balloon_max() -> u32 {
    100
}
fn default_max_per_call() -> u32 {
    150
}
fn default_pop_random_variation() -> u64 {
    10_000
}
fn default_200() -> u64 {
    200
}
fn default_500() -> u64 {
    500
}
fn default_true() -> bool {
    true
}

impl Default for BalloonConfig {
    fn default() -> Self {
        Self {
            max: default_balloon_max(),
            spawn_delay_ms: 200,
            pop_base_delay_ms: 200,
            pop_random_variation_ms: default_pop_random_variation(),
            pop_duration_ms: 500,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_per_call: default_max_per_call(),
            removal_buffer_ms: 500,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
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

    /// Path to the config file in the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
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

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Pretty TOML rendering of the whole config.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
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

    /// Update a value in memory by dot-separated key. Unset optional fields
    /// (`seed`, `rules.path`) are not addressable here; use [`Config::set_optional`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type
    /// or fails validation. The config is unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if let Some(result) = self.set_optional(key, value) {
            return result;
        }

        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Handle the optional top-level keys. Returns `None` for other keys.
    /// An empty value clears the field.
    pub fn set_optional(&mut self, key: &str, value: &str) -> Option<Result<(), ConfigError>> {
        match key {
            "seed" => Some(if value.is_empty() {
                self.seed = None;
                Ok(())
            } else {
                value
                    .parse::<u64>()
                    .map(|seed| self.seed = Some(seed))
                    .map_err(|e| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: e.to_string(),
                    })
            }),
            "rules.path" => {
                self.rules.path = (!value.is_empty()).then(|| PathBuf::from(value));
                Some(Ok(()))
            }
            _ => None,
        }
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.balloons.max == 0 {
            return Err(ConfigError::InvalidValue {
                key: "balloons.max".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.particles.max_per_call == 0 {
            return Err(ConfigError::InvalidValue {
                key: "particles.max_per_call".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn balloon_settings(&self) -> BalloonSettings {
        let b = &self.balloons;
        BalloonSettings {
            max: b.max,
            spawn_delay: Duration::from_millis(b.spawn_delay_ms),
            pop_base_delay: Duration::from_millis(b.pop_base_delay_ms),
            pop_random_variation: Duration::from_millis(b.pop_random_variation_ms),
            pop_duration: Duration::from_millis(b.pop_duration_ms),
        }
    }

    pub fn particle_settings(&self) -> ParticleSettings {
        ParticleSettings {
            max_per_call: self.particles.max_per_call,
            removal_buffer: Duration::from_millis(self.particles.removal_buffer_ms),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            balloons: self.balloon_settings(),
            particles: self.particle_settings(),
            audio_enabled: self.audio.enabled,
        }
    }

    /// The configured rule table, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the custom table cannot be read or is invalid.
    pub fn rule_table(&self) -> Result<RuleTable, RuleError> {
        match &self.rules.path {
            Some(path) => RuleTable::load(path),
            None => RuleTable::builtin(),
        }
    }

    /// Build an engine from this config, honoring `seed` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule table cannot be loaded.
    pub fn build_engine(&self) -> Result<EffectsEngine, RuleError> {
        let rules = self.rule_table()?;
        let settings = self.engine_settings();
        Ok(match self.seed {
            Some(seed) => EffectsEngine::seeded(rules, settings, seed),
            None => EffectsEngine::new(rules, settings),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
