// Storage - Persistence of patterns, projects and preferences
// JsonStore keeps one JSON document in memory and rewrites it on every mutation
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    ExportBundle, PatternPatch, Preferences, Project, ProjectPatch, StoreData, StoredPattern,
    EXPORT_VERSION,
};
use crate::pattern::{PatternKind, Validator};

/// File name of the document under the app data directory
pub const STORE_FILE_NAME: &str = "duotrack.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
    #[error("Invalid {kind} pattern: {}", .issues.join("; "))]
    InvalidPattern { kind: PatternKind, issues: Vec<String> },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Get the app data directory for Duotrack
pub fn get_app_data_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    let duotrack_dir = data_dir.join("com.duotrack.app");
    fs::create_dir_all(&duotrack_dir)?;
    Ok(duotrack_dir)
}

/// Persistence capability used by the player
///
/// Ids are strings; fresh ones are uuid v4. Mutations on unknown ids return
/// `Ok(false)`.
pub trait Storage {
    /// Validate then store a pattern, returning its new id
    fn save_pattern(&mut self, kind: PatternKind, name: &str, pattern: Value) -> StorageResult<String>;
    fn get_patterns(&self, kind: PatternKind) -> Vec<StoredPattern>;
    fn get_pattern(&self, id: &str) -> Option<StoredPattern>;
    fn update_pattern(&mut self, id: &str, patch: PatternPatch) -> StorageResult<bool>;
    fn delete_pattern(&mut self, id: &str) -> StorageResult<bool>;

    fn save_project(
        &mut self,
        name: &str,
        beat_pattern: Value,
        melody_pattern: Value,
        tempo: f64,
    ) -> StorageResult<String>;
    fn get_projects(&self) -> Vec<Project>;
    fn get_project(&self, id: &str) -> Option<Project>;
    fn update_project(&mut self, id: &str, patch: ProjectPatch) -> StorageResult<bool>;
    fn delete_project(&mut self, id: &str) -> StorageResult<bool>;

    fn save_preferences(&mut self, preferences: &Preferences) -> StorageResult<()>;
    fn get_preferences(&self) -> Preferences;

    fn export_data(&self) -> ExportBundle;

    /// Apply a `{version, data}` bundle; returns false when it carries no data
    fn import_data(&mut self, bundle: &Value) -> StorageResult<bool>;
}

/// Storage backed by a single JSON document
#[derive(Debug, Clone, Default)]
pub struct JsonStore {
    path: Option<PathBuf>,
    data: StoreData,
    validator: Validator,
}

impl JsonStore {
    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the document at `path`
    ///
    /// A missing file starts empty. A malformed file is logged and replaced
    /// on the next write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let data = if path.exists() {
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<StoreData>(&text) {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("Ignoring malformed store {}: {}", path.display(), e);
                    StoreData::default()
                }
            }
        } else {
            StoreData::default()
        };

        log::info!(
            "Opened store {} ({} beats, {} melodies, {} projects)",
            path.display(),
            data.patterns.beats.len(),
            data.patterns.melodies.len(),
            data.projects.len()
        );

        Ok(JsonStore {
            path: Some(path),
            data,
            validator: Validator::default(),
        })
    }

    /// Open `duotrack.json` in the platform app data directory
    pub fn open_default() -> StorageResult<Self> {
        Self::open(get_app_data_dir()?.join(STORE_FILE_NAME))
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Write `next` to disk, then make it the in-memory document
    ///
    /// A failed write leaves the current document untouched.
    fn commit(&mut self, next: StoreData) -> StorageResult<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&next)?)?;
        }
        self.data = next;
        Ok(())
    }

    fn check_pattern(&self, kind: PatternKind, pattern: &Value) -> StorageResult<()> {
        let report = self.validator.validate(pattern, kind);
        if report.is_valid {
            Ok(())
        } else {
            Err(StorageError::InvalidPattern {
                kind,
                issues: report.messages(),
            })
        }
    }
}

impl Storage for JsonStore {
    fn save_pattern(&mut self, kind: PatternKind, name: &str, pattern: Value) -> StorageResult<String> {
        self.check_pattern(kind, &pattern)?;

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let mut next = self.data.clone();
        next.patterns.of_kind_mut(kind).push(StoredPattern {
            id: id.clone(),
            name: name.to_string(),
            kind,
            pattern,
            created_at: now,
            updated_at: now,
        });
        self.commit(next)?;

        log::info!("Saved {} pattern '{}' ({})", kind, name, id);
        Ok(id)
    }

    fn get_patterns(&self, kind: PatternKind) -> Vec<StoredPattern> {
        self.data.patterns.of_kind(kind).clone()
    }

    fn get_pattern(&self, id: &str) -> Option<StoredPattern> {
        self.data.patterns.iter().find(|p| p.id == id).cloned()
    }

    fn update_pattern(&mut self, id: &str, patch: PatternPatch) -> StorageResult<bool> {
        let Some(kind) = self.data.patterns.iter().find(|p| p.id == id).map(|p| p.kind) else {
            return Ok(false);
        };
        if let Some(pattern) = &patch.pattern {
            self.check_pattern(kind, pattern)?;
        }

        let mut next = self.data.clone();
        if let Some(stored) = next.patterns.iter_mut().find(|p| p.id == id) {
            if let Some(name) = patch.name {
                stored.name = name;
            }
            if let Some(pattern) = patch.pattern {
                stored.pattern = pattern;
            }
            stored.updated_at = Utc::now();
        }
        self.commit(next)?;

        log::info!("Updated pattern {}", id);
        Ok(true)
    }

    fn delete_pattern(&mut self, id: &str) -> StorageResult<bool> {
        let mut next = self.data.clone();
        next.patterns.beats.retain(|p| p.id != id);
        next.patterns.melodies.retain(|p| p.id != id);
        let removed = next.patterns.iter().count() != self.data.patterns.iter().count();

        if removed {
            self.commit(next)?;
            log::info!("Deleted pattern {}", id);
        }
        Ok(removed)
    }

    fn save_project(
        &mut self,
        name: &str,
        beat_pattern: Value,
        melody_pattern: Value,
        tempo: f64,
    ) -> StorageResult<String> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let mut next = self.data.clone();
        next.projects.push(Project {
            id: id.clone(),
            name: name.to_string(),
            beat_pattern,
            melody_pattern,
            tempo,
            created_at: now,
            updated_at: now,
        });
        self.commit(next)?;

        log::info!("Saved project '{}' ({})", name, id);
        Ok(id)
    }

    fn get_projects(&self) -> Vec<Project> {
        self.data.projects.clone()
    }

    fn get_project(&self, id: &str) -> Option<Project> {
        self.data.projects.iter().find(|p| p.id == id).cloned()
    }

    fn update_project(&mut self, id: &str, patch: ProjectPatch) -> StorageResult<bool> {
        let mut next = self.data.clone();
        let Some(project) = next.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };

        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(beat_pattern) = patch.beat_pattern {
            project.beat_pattern = beat_pattern;
        }
        if let Some(melody_pattern) = patch.melody_pattern {
            project.melody_pattern = melody_pattern;
        }
        if let Some(tempo) = patch.tempo {
            project.tempo = tempo;
        }
        project.updated_at = Utc::now();
        self.commit(next)?;

        log::info!("Updated project {}", id);
        Ok(true)
    }

    fn delete_project(&mut self, id: &str) -> StorageResult<bool> {
        let mut next = self.data.clone();
        next.projects.retain(|p| p.id != id);
        let removed = next.projects.len() != self.data.projects.len();

        if removed {
            self.commit(next)?;
            log::info!("Deleted project {}", id);
        }
        Ok(removed)
    }

    fn save_preferences(&mut self, preferences: &Preferences) -> StorageResult<()> {
        let mut next = self.data.clone();
        next.preferences = preferences.clone();
        self.commit(next)
    }

    fn get_preferences(&self) -> Preferences {
        self.data.preferences.clone()
    }

    fn export_data(&self) -> ExportBundle {
        ExportBundle {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            data: self.data.clone(),
        }
    }

    fn import_data(&mut self, bundle: &Value) -> StorageResult<bool> {
        let Some(data) = bundle.get("data").and_then(Value::as_object) else {
            log::warn!("Import bundle has no data section");
            return Ok(false);
        };

        // Decode every present section before touching the current document
        let patterns = data.get("patterns").and_then(Value::as_object);
        let beats = patterns
            .and_then(|p| p.get("beats"))
            .map(|v| serde_json::from_value::<Vec<StoredPattern>>(v.clone()))
            .transpose()?;
        let melodies = patterns
            .and_then(|p| p.get("melodies"))
            .map(|v| serde_json::from_value::<Vec<StoredPattern>>(v.clone()))
            .transpose()?;
        let projects = data
            .get("projects")
            .map(|v| serde_json::from_value::<Vec<Project>>(v.clone()))
            .transpose()?;
        let preferences = data
            .get("preferences")
            .map(|v| serde_json::from_value::<Preferences>(v.clone()))
            .transpose()?;

        let mut next = self.data.clone();
        if let Some(beats) = beats {
            next.patterns.beats = beats;
        }
        if let Some(melodies) = melodies {
            next.patterns.melodies = melodies;
        }
        if let Some(projects) = projects {
            next.projects = projects;
        }
        if let Some(preferences) = preferences {
            next.preferences = preferences;
        }
        self.commit(next)?;

        log::info!(
            "Imported data version {}",
            bundle.get("version").and_then(Value::as_str).unwrap_or("unknown")
        );
        Ok(true)
    }
}
