//! Shared constants for store keys and bounds.

/// Store key for the patient roster blob.
pub const ROSTER_KEY: &str = "post/roster";

/// Store key for the checklist state map.
pub const CHECKLIST_STATE_KEY: &str = "post/checklist-state";

/// Store key for the checklist audit log.
pub const CHECKLIST_LOG_KEY: &str = "post/checklist-log";

/// Maximum number of checklist log entries retained (newest first).
pub const CHECKLIST_LOG_CAPACITY: usize = 50;

/// Default data directory when none is configured.
pub const DEFAULT_DATA_DIR: &str = "/pma_data";

/// File extension used by the file-backed store.
pub const STORE_FILE_EXTENSION: &str = "json";
