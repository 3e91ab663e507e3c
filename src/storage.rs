//! Durable persistence of the application state.
//!
//! Only the journal, the selected sign and the last horoscope are stored;
//! loading and error flags belong to a single run.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::journal_store::JournalStore;
use crate::zodiac::ZodiacSign;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub selected_zodiac: ZodiacSign,
    pub current_horoscope: String,
    pub journal_entries: JournalStore,
}

pub trait StateStorage {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError>;

    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError>;

    /// Moves a document that failed to load out of the way so the next save
    /// cannot clobber it. Returns where it went, if anywhere.
    fn set_aside_unreadable(&self) -> Result<Option<String>, PersistenceError>;
}

/// Pretty JSON document, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn backup_path(&self) -> PathBuf {
        let stamp = Utc::now().timestamp();
        let mut candidate = self.sibling_path(&format!(".corrupt-{stamp}"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.sibling_path(&format!(".corrupt-{stamp}-{n}"));
            n += 1;
        }
        candidate
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        let serialized = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no saved journal found, starting fresh");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let state: PersistedState =
            serde_json::from_str(&serialized).map_err(PersistenceError::Corrupt)?;
        debug!(entries = state.journal_entries.len(), "journal state loaded");
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        let serialized =
            serde_json::to_string_pretty(state).map_err(PersistenceError::Serialize)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "journal state written");
        Ok(())
    }

    fn set_aside_unreadable(&self) -> Result<Option<String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;
        warn!(backup = %backup.display(), "moved unreadable journal aside");
        Ok(Some(backup.display().to_string()))
    }
}

/// In-process storage. Clones share the same slot, so a caller can keep a
/// handle and inspect what the state container wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    backup: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Seeds the slot with raw text, e.g. to simulate a corrupt document.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let storage = MemoryStorage::default();
        if let Ok(mut slot) = storage.slot.lock() {
            *slot = Some(raw.into());
        }
        storage
    }

    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    /// Whatever [`StateStorage::set_aside_unreadable`] moved out of the slot.
    pub fn backup(&self) -> Option<String> {
        self.backup.lock().ok().and_then(|backup| backup.clone())
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>, PersistenceError> {
        match self.raw() {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(PersistenceError::Corrupt),
            None => Ok(None),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(std::io::Error::other("simulated write failure").into());
        }
        let serialized = serde_json::to_string(state).map_err(PersistenceError::Serialize)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| std::io::Error::other("storage lock poisoned"))?;
        *slot = Some(serialized);
        Ok(())
    }

    fn set_aside_unreadable(&self) -> Result<Option<String>, PersistenceError> {
        let lock_err = || std::io::Error::other("storage lock poisoned");
        let mut slot = self.slot.lock().map_err(|_| lock_err())?;
        let Some(raw) = slot.take() else {
            return Ok(None);
        };
        *self.backup.lock().map_err(|_| lock_err())? = Some(raw);
        Ok(Some("memory backup".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample_state() -> PersistedState {
        let mut state = PersistedState {
            selected_zodiac: ZodiacSign::Leo,
            current_horoscope: "Confidence shines".to_string(),
            ..PersistedState::default()
        };
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 2, 1, 21, 15, 0).unwrap();
        state.journal_entries.upsert("2024-02-01", "morning", created);
        state.journal_entries.upsert("2024-02-01", "evening", updated);
        state.journal_entries.upsert("2024-02-02", "next day", updated);
        state
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("state.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_round_trip_reproduces_store_exactly() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("state.json"));
        let state = sample_state();

        storage.save(&state).unwrap();
        let restored = storage.load().unwrap().unwrap();

        assert_eq!(restored, state);
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let storage = JsonFileStorage::new(path);
        assert!(matches!(storage.load(), Err(PersistenceError::Corrupt(_))));
    }

    #[test]
    fn unreadable_file_is_moved_aside_intact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let original = r#"{"journalEntries":{"2024-02-01":{"updatedAt":"oops"}}}"#;
        fs::write(&path, original).unwrap();
        let storage = JsonFileStorage::new(&path);

        assert!(storage.load().is_err());
        let backup = storage.set_aside_unreadable().unwrap().unwrap();

        assert!(!path.exists());
        assert!(backup.contains("state.json.corrupt-"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    }

    #[test]
    fn set_aside_without_file_does_nothing() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("state.json"));
        assert!(storage.set_aside_unreadable().unwrap().is_none());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let storage = MemoryStorage::with_raw(r#"{"currentHoroscope":"old text"}"#);
        let state = storage.load().unwrap().unwrap();
        assert_eq!(state.selected_zodiac, ZodiacSign::Aries);
        assert_eq!(state.current_horoscope, "old text");
        assert!(state.journal_entries.is_empty());
    }

    #[test]
    fn memory_storage_can_fail_writes() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(matches!(
            storage.save(&sample_state()),
            Err(PersistenceError::Io(_))
        ));
        assert!(storage.raw().is_none());
    }
}
