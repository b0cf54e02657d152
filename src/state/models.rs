// Data models for Duotrack persistence
// Field names are camelCase on disk; missing keys fall back to defaults on load
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pattern::PatternKind;
use crate::playback::synth::DEFAULT_MASTER_VOLUME;

/// Version string written into exports
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPattern {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// Raw pattern as saved (validated on the way in)
    pub pattern: Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Projects are stored unvalidated
    #[serde(default)]
    pub beat_pattern: Value,
    #[serde(default)]
    pub melody_pattern: Value,
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_tempo() -> f64 {
    120.0
}

/// Partial update for a stored pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternPatch {
    pub name: Option<String>,
    pub pattern: Option<Value>,
}

/// Partial update for a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub beat_pattern: Option<Value>,
    pub melody_pattern: Option<Value>,
    pub tempo: Option<f64>,
}

/// Player settings persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub tempo: f64,
    pub master_volume: f32,
    pub auto_scroll: bool,
    pub beat_muted: bool,
    pub beat_soloed: bool,
    pub melody_muted: bool,
    pub melody_soloed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            tempo: default_tempo(),
            master_volume: DEFAULT_MASTER_VOLUME,
            auto_scroll: true,
            beat_muted: false,
            beat_soloed: false,
            melody_muted: false,
            melody_soloed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternCollections {
    pub beats: Vec<StoredPattern>,
    pub melodies: Vec<StoredPattern>,
}

impl PatternCollections {
    pub fn of_kind(&self, kind: PatternKind) -> &Vec<StoredPattern> {
        match kind {
            PatternKind::Beat => &self.beats,
            PatternKind::Melody => &self.melodies,
        }
    }

    pub fn of_kind_mut(&mut self, kind: PatternKind) -> &mut Vec<StoredPattern> {
        match kind {
            PatternKind::Beat => &mut self.beats,
            PatternKind::Melody => &mut self.melodies,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredPattern> {
        self.beats.iter().chain(self.melodies.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StoredPattern> {
        self.beats.iter_mut().chain(self.melodies.iter_mut())
    }
}

/// The whole persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub patterns: PatternCollections,
    pub projects: Vec<Project>,
    pub preferences: Preferences,
}

/// Backup bundle produced by `export_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub data: StoreData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_preferences_take_defaults() {
        let prefs: Preferences = serde_json::from_value(json!({"tempo": 140, "masterVolume": 0.8})).unwrap();
        assert_eq!(prefs.tempo, 140.0);
        assert_eq!(prefs.master_volume, 0.8);
        assert!(prefs.auto_scroll);
        assert!(!prefs.beat_muted);
    }

    #[test]
    fn test_stored_pattern_wire_names() {
        let stored: StoredPattern = serde_json::from_value(json!({
            "id": "test-id",
            "name": "imported-beat",
            "pattern": [{"beat": "kick", "dur": 1}],
            "type": "beat"
        }))
        .unwrap();
        assert_eq!(stored.kind, PatternKind::Beat);

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["type"], "beat");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_empty_document_shape() {
        let value = serde_json::to_value(StoreData::default()).unwrap();
        assert_eq!(value["patterns"], json!({"beats": [], "melodies": []}));
        assert_eq!(value["projects"], json!([]));
        assert_eq!(value["preferences"]["masterVolume"], json!(0.7f32));
    }
}
