//! TOML-based application configuration.
//!
//! Tuning knobs for the streak walk, the race field, and the forecast
//! gates. Configuration is stored at `~/.config/habitrace/config.toml`;
//! missing files fall back to defaults and are written out on first load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::race::forecast;
use crate::streak;

/// Streak computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Hard bound on the backward day walk.
    #[serde(default = "default_max_walk_days")]
    pub max_walk_days: u32,
}

/// Race leaderboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Maximum displayed leaderboard slots.
    #[serde(default = "default_field_size")]
    pub field_size: usize,
}

/// Forecast gating settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Minimum entries required overall and inside the window.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Trailing window the trend is fitted over, in days.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    /// Longest projection considered meaningful, in days.
    #[serde(default = "default_max_horizon_days")]
    pub max_horizon_days: i64,
}

fn default_max_walk_days() -> u32 {
    streak::MAX_WALK_DAYS
}

fn default_field_size() -> usize {
    crate::race::FIELD_SIZE
}

fn default_min_samples() -> usize {
    forecast::MIN_SAMPLES
}

fn default_window_days() -> i64 {
    forecast::WINDOW_DAYS
}

fn default_max_horizon_days() -> i64 {
    forecast::MAX_HORIZON_DAYS
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            max_walk_days: default_max_walk_days(),
        }
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            field_size: default_field_size(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            window_days: default_window_days(),
            max_horizon_days: default_max_horizon_days(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub race: RaceConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl Config {
    /// Path to the config file inside the data directory.
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults when no file exists yet.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed or the
    /// default file cannot be written.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::path()?)
    }

    /// Load from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to a specific file path.
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }
}

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
) -> Result<(), Box<dyn std::error::Error>> {
    let mut parts = key.split('.').peekable();
    if parts.peek().is_none() {
        return Err("config key is empty".into());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        let is_leaf = parts.peek().is_none();
        if is_leaf {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| format!("unknown config key: {key}"))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                    } else {
                        return Err(format!("cannot parse '{value}' as number").into());
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value)?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        current = current
            .get_mut(part)
            .ok_or_else(|| format!("unknown config key: {key}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.race.field_size, 10);
        assert_eq!(back.forecast.min_samples, 7);
        assert_eq!(back.streak.max_walk_days, 1000);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[race]\nfield_size = 5\n").unwrap();
        assert_eq!(cfg.race.field_size, 5);
        assert_eq!(cfg.forecast.window_days, 30);
    }

    #[test]
    fn get_by_dot_path() {
        let cfg = Config::default();
        assert_eq!(cfg.get("race.field_size").unwrap(), "10");
        assert_eq!(cfg.get("forecast.max_horizon_days").unwrap(), "180");
        assert!(cfg.get("race.unknown").is_none());
    }

    #[test]
    fn save_and_load_from_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.race.field_size = 12;
        cfg.save_to(&path).unwrap();

        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.race.field_size, 12);
    }
}
