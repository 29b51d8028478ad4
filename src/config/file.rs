//! Configuration file management for evrec.
//!
//! Configuration lives in a TOML file in the user's config directory. The
//! recording format itself (16 kHz mono) is part of the dataset contract and
//! deliberately not configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device: "default" for the system default, a numeric index, or
    /// a device name as shown in the interactive picker.
    #[serde(default = "default_device")]
    pub device: String,
}

/// Filesystem layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of `*.txt` reading passages.
    #[serde(default = "default_samples_dir")]
    pub samples_dir: PathBuf,
    /// Dataset root; artifacts land in `{dataset_dir}/audio/`.
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from("samples")
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("dataset")
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvrecConfig {
    pub audio: AudioConfig,
    pub paths: PathsConfig,
}

impl Default for EvrecConfig {
    fn default() -> Self {
        EvrecConfig {
            audio: AudioConfig {
                device: default_device(),
            },
            paths: PathsConfig {
                samples_dir: default_samples_dir(),
                dataset_dir: default_dataset_dir(),
            },
        }
    }
}

impl EvrecConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read or the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;
        let content = fs::read_to_string(&config_path)?;
        let config: EvrecConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration back to the config file.
    ///
    /// # Errors
    /// - If the config directory cannot be created or the file written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, toml::to_string_pretty(self)?)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Path of the config file: ~/.config/evrec/evrec.toml.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("evrec").join("evrec.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EvrecConfig::default();
        let toml_text = toml::to_string_pretty(&config).unwrap();
        let parsed: EvrecConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.paths.samples_dir, PathBuf::from("samples"));
        assert_eq!(parsed.paths.dataset_dir, PathBuf::from("dataset"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: EvrecConfig = toml::from_str("[audio]\n[paths]\n").unwrap();
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.paths.dataset_dir, PathBuf::from("dataset"));
    }
}
