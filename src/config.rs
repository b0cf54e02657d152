// Configuration - One document aggregating every tunable default
// Missing keys fall back to each section's Default

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::midi::{ConverterConfig, MidiConverter, MidiExportOptions};
use crate::pattern::{Validator, ValidatorConfig};
use crate::playback::{Scheduler, SchedulerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuotrackConfig {
    pub validator: ValidatorConfig,
    pub converter: ConverterConfig,
    pub scheduler: SchedulerConfig,
    pub export: MidiExportOptions,
}

impl DuotrackConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.validator.clone())
    }

    pub fn converter(&self) -> MidiConverter {
        MidiConverter::new(self.converter.clone())
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.scheduler.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::DrumVoice;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(DuotrackConfig::from_json_str("{}").unwrap(), DuotrackConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = DuotrackConfig::from_json_str(
            r#"{"scheduler": {"max_tempo": 200}, "validator": {"min_bpm": 30}}"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.max_tempo, 200.0);
        assert_eq!(config.scheduler.min_tempo, 40.0);
        assert_eq!(config.validator.min_bpm, 30.0);
        assert_eq!(config.validator.max_bpm, 300.0);
        assert_eq!(config.scheduler().config().clamp_tempo(250.0).bpm, 200.0);
    }

    #[test]
    fn test_custom_drum_map() {
        let config = DuotrackConfig::from_json_str(
            r#"{"converter": {"drum_map": {"entries": [{"pitch": 60, "voice": "clap"}]}}}"#,
        )
        .unwrap();
        assert_eq!(config.converter().config().drum_map.classify(36), DrumVoice::Clap);
        assert_eq!(config.converter.default_bpm, 120.0);
    }

    #[test]
    fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"export": {"ppq": 960}}"#).unwrap();

        let config = DuotrackConfig::load(file.path()).unwrap();
        assert_eq!(config.export.ppq, 960);
        assert!(config.export.include_tempo);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(DuotrackConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            DuotrackConfig::load("/nonexistent/duotrack-config.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
