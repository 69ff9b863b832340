//! Layered configuration for note quantization and melody encoding.
//!
//! Every value has a compiled default, so an empty environment yields a
//! usable config. Files only need to mention what they change.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/seqlearn/config.toml` (system)
//! 2. `~/.config/seqlearn/config.toml` (user)
//! 3. `./seqlearn.toml` (local override, or an explicit path)
//! 4. Environment variables (`SEQLEARN_*`)
//!
//! # Example Config
//!
//! ```toml
//! [quantize]
//! steps_per_beat = 4
//!
//! [codec]
//! min_note = 48
//! max_note = 84
//! transpose_to_key = 0
//!
//! [telemetry]
//! log_level = "debug"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};
pub use settings::{CodecSettings, QuantizeSettings, TelemetrySettings};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeqConfig {
    #[serde(default)]
    pub quantize: QuantizeSettings,

    #[serde(default)]
    pub codec: CodecSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl SeqConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let files = loader::discover_config_files_with_override(config_path);

        let mut config = loader::load_files(&files)?;
        sources.files = files;

        loader::apply_env_overrides(&mut config, &mut sources);
        config.validate()?;

        Ok((config, sources))
    }

    /// Reject values the quantizer or codec cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantize.steps_per_beat == 0 {
            return Err(ConfigError::Invalid(
                "quantize.steps_per_beat must be positive".to_string(),
            ));
        }
        if self.codec.min_note >= self.codec.max_note {
            return Err(ConfigError::Invalid(format!(
                "codec.min_note ({}) must be below codec.max_note ({})",
                self.codec.min_note, self.codec.max_note
            )));
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# seqlearn configuration\n\n");

        output.push_str("[quantize]\n");
        output.push_str(&format!(
            "steps_per_beat = {}\n",
            self.quantize.steps_per_beat
        ));

        output.push_str("\n[codec]\n");
        output.push_str(&format!("min_note = {}\n", self.codec.min_note));
        output.push_str(&format!("max_note = {}\n", self.codec.max_note));
        output.push_str(&format!(
            "transpose_to_key = {}\n",
            self.codec.transpose_to_key
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SeqConfig::default();
        assert_eq!(config.quantize.steps_per_beat, 4);
        assert_eq!(config.codec.min_note, 48);
        assert_eq!(config.codec.max_note, 84);
        assert_eq!(config.codec.transpose_to_key, 0);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let mut config = SeqConfig::default();
        config.codec.min_note = 36;
        config.telemetry.log_level = "debug".to_string();

        let rendered = config.to_toml();
        assert!(rendered.contains("[quantize]"));
        assert!(rendered.contains("[codec]"));

        let parsed: SeqConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_zero_steps() {
        let mut config = SeqConfig::default();
        config.quantize.steps_per_beat = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let mut config = SeqConfig::default();
        config.codec.max_note = config.codec.min_note;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seqlearn.toml");
        std::fs::write(&path, "[quantize]\nsteps_per_beat = 3\n").unwrap();

        let (config, sources) = SeqConfig::load_with_sources_from(Some(&path)).unwrap();
        assert!(sources.files.contains(&path));
        // Env could override in CI, so only assert when it does not.
        if !sources
            .env_overrides
            .iter()
            .any(|v| v == "SEQLEARN_STEPS_PER_BEAT")
        {
            assert_eq!(config.quantize.steps_per_beat, 3);
        }
    }
}
