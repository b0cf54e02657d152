// State management module
// Handles persistence of patterns, projects and preferences

pub mod models;
pub mod storage;

pub use models::{
    ExportBundle, PatternCollections, PatternPatch, Preferences, Project, ProjectPatch,
    StoreData, StoredPattern, EXPORT_VERSION,
};
pub use storage::{
    get_app_data_dir, JsonStore, Storage, StorageError, StorageResult, STORE_FILE_NAME,
};
