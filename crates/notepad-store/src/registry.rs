//! Notepad registry: the authoritative, ordered list of notepads.
//!
//! Persisted as `<data_dir>/notepads.json` in the envelope
//! `{"notepads": [{"id": ..., "name": ...}, ...]}`. Every mutation is a full
//! read-modify-write of that file, serialized in-process by an async mutex and
//! committed with an atomic rename, so readers never observe a partial write.
//!
//! The registry repairs itself on load: a missing or structurally invalid file
//! is replaced by a single default entry, malformed and duplicate entries are
//! dropped, and a missing default entry is restored.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::fs::{atomic_write, validate_id};
use crate::notes::NoteStore;

/// Id of the notepad that always exists and can never be deleted.
pub const DEFAULT_NOTEPAD_ID: &str = "default";

/// Display name given to the default notepad when it is (re)created.
pub const DEFAULT_NOTEPAD_NAME: &str = "Default Notepad";

const REGISTRY_FILE: &str = "notepads.json";

/// A named, independently stored text document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notepad {
    /// Stable identifier, also the stem of the content file name
    pub id: String,
    /// Display name
    pub name: String,
}

impl Notepad {
    fn default_entry() -> Self {
        Self {
            id: DEFAULT_NOTEPAD_ID.to_string(),
            name: DEFAULT_NOTEPAD_NAME.to_string(),
        }
    }
}

/// The registry envelope. Order of `notepads` is creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub notepads: Vec<Notepad>,
}

impl Registry {
    /// A registry holding only the default notepad.
    pub fn with_default() -> Self {
        Self {
            notepads: vec![Notepad::default_entry()],
        }
    }

    pub fn get(&self, id: &str) -> Option<&Notepad> {
        self.notepads.iter().find(|n| n.id == id)
    }

    /// Parse raw file contents, repairing whatever can be repaired.
    ///
    /// Returns the usable registry and whether it differs from what was on disk.
    fn parse(raw: &str) -> (Self, bool) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return (Self::with_default(), true),
        };

        let Some(entries) = value.get("notepads").and_then(Value::as_array) else {
            return (Self::with_default(), true);
        };

        let mut repaired = false;
        let mut notepads: Vec<Notepad> = Vec::with_capacity(entries.len());
        for entry in entries {
            match Notepad::deserialize(entry) {
                Ok(notepad)
                    if validate_id(&notepad.id).is_ok()
                        && !notepads.iter().any(|n| n.id == notepad.id) =>
                {
                    notepads.push(notepad)
                }
                _ => repaired = true,
            }
        }

        if !notepads.iter().any(|n| n.id == DEFAULT_NOTEPAD_ID) {
            notepads.insert(0, Notepad::default_entry());
            repaired = true;
        }

        (Self { notepads }, repaired)
    }

    /// Next free timestamp-derived id.
    ///
    /// Never lower than the newest numeric id already present, so creates
    /// within the same millisecond (or after a clock step back) stay unique.
    /// When the newest id is `i64::MAX` the search restarts from the clock
    /// and then from zero, so it always ends within `notepads.len() + 1` steps.
    fn next_id(&self, now_millis: i64) -> String {
        let used: HashSet<i64> = self
            .notepads
            .iter()
            .filter_map(|n| n.id.parse::<i64>().ok())
            .collect();

        let start = match used.iter().max() {
            Some(&newest) if newest >= now_millis => newest.checked_add(1).unwrap_or(now_millis),
            _ => now_millis,
        };

        let candidate = (start..=i64::MAX)
            .chain(0..start)
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(start);
        candidate.to_string()
    }

    fn default_name(&self) -> String {
        format!("Notepad {}", self.notepads.len() + 1)
    }
}

/// File-backed notepad registry.
///
/// Owns a [`NoteStore`] so that creating and deleting notepads also
/// provisions and removes their content.
pub struct NotepadRegistry {
    data_dir: PathBuf,
    notes: NoteStore,
    /// Serializes every read-modify-write of the registry file
    lock: Mutex<()>,
}

impl NotepadRegistry {
    pub fn new(data_dir: PathBuf, notes: NoteStore) -> Self {
        Self {
            data_dir,
            notes,
            lock: Mutex::new(()),
        }
    }

    fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE)
    }

    /// Create the data directory and a valid registry if needed.
    pub async fn init(&self) -> Result<Registry> {
        let _guard = self.lock.lock().await;
        fs::create_dir_all(&self.data_dir).await?;
        let registry = self.load().await?;
        info!(
            "Registry ready at {:?} with {} notepad(s)",
            self.registry_path(),
            registry.notepads.len()
        );
        Ok(registry)
    }

    /// Current registry contents.
    pub async fn list(&self) -> Result<Registry> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Notepad>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(id).cloned())
    }

    /// Append a new notepad and provision its empty content.
    ///
    /// A blank or missing name falls back to `Notepad N`, N being the new count.
    /// The registry entry is the commit point: failing to provision the content
    /// file is logged, and a missing file reads as empty anyway.
    pub async fn create(&self, name: Option<String>) -> Result<Notepad> {
        let _guard = self.lock.lock().await;
        let mut registry = self.load().await?;

        let id = registry.next_id(chrono::Utc::now().timestamp_millis());
        let name = match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => registry.default_name(),
        };
        let notepad = Notepad { id, name };

        registry.notepads.push(notepad.clone());
        self.save(&registry).await?;
        if let Err(e) = self.notes.write(&notepad.id, "").await {
            warn!("Created notepad {} but failed to provision its content: {}", notepad.id, e);
        }

        info!("Created notepad {} ({:?})", notepad.id, notepad.name);
        Ok(notepad)
    }

    /// Change the display name of an existing notepad.
    pub async fn rename(&self, id: &str, name: String) -> Result<Notepad> {
        let _guard = self.lock.lock().await;
        let mut registry = self.load().await?;

        let notepad = registry
            .notepads
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        notepad.name = name;
        let updated = notepad.clone();

        self.save(&registry).await?;
        info!("Renamed notepad {} to {:?}", updated.id, updated.name);
        Ok(updated)
    }

    /// Remove a notepad, then its content.
    ///
    /// The registry write is committed first. Failing to remove the content
    /// afterwards is logged and otherwise ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id == DEFAULT_NOTEPAD_ID {
            return Err(StoreError::DefaultProtected);
        }

        let _guard = self.lock.lock().await;
        let mut registry = self.load().await?;

        let before = registry.notepads.len();
        registry.notepads.retain(|n| n.id != id);
        if registry.notepads.len() == before {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.save(&registry).await?;

        if let Err(e) = self.notes.remove(id).await {
            warn!("Deleted notepad {} but failed to remove its content: {}", id, e);
        }

        info!("Deleted notepad {}", id);
        Ok(())
    }

    // --- Persistence (callers hold `lock`) ---

    async fn load(&self) -> Result<Registry> {
        let path = self.registry_path();
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let registry = match raw {
            Some(raw) => {
                let (registry, repaired) = Registry::parse(&raw);
                if !repaired {
                    return Ok(registry);
                }
                warn!("Registry at {:?} was invalid, repairing", path);
                registry
            }
            None => {
                info!("No registry at {:?}, creating default", path);
                Registry::with_default()
            }
        };

        self.save(&registry).await?;
        self.notes.touch(DEFAULT_NOTEPAD_ID).await?;
        Ok(registry)
    }

    async fn save(&self, registry: &Registry) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        let content = serde_json::to_string_pretty(registry)?;
        atomic_write(&self.registry_path(), &content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_registry() -> (TempDir, NotepadRegistry, NoteStore) {
        let temp_dir = TempDir::new().unwrap();
        let notes = NoteStore::new(temp_dir.path().to_path_buf());
        let registry = NotepadRegistry::new(temp_dir.path().to_path_buf(), notes.clone());
        (temp_dir, registry, notes)
    }

    fn ids(registry: &Registry) -> Vec<&str> {
        registry.notepads.iter().map(|n| n.id.as_str()).collect()
    }

    // ==================== Registry::parse ====================

    #[test]
    fn test_parse_valid_registry_is_untouched() {
        let raw = r#"{"notepads":[{"id":"default","name":"Default Notepad"},{"id":"17","name":"Work"}]}"#;
        let (registry, repaired) = Registry::parse(raw);

        assert!(!repaired);
        assert_eq!(ids(&registry), vec!["default", "17"]);
        assert_eq!(registry.get("17").unwrap().name, "Work");
    }

    #[test]
    fn test_parse_structurally_invalid_yields_default_only() {
        for raw in [
            "",
            "not json",
            "[]",
            "null",
            r#"{"notepads": "oops"}"#,
            r#"{"notepads": {"id": "default"}}"#,
            r#"{"pads": []}"#,
        ] {
            let (registry, repaired) = Registry::parse(raw);
            assert!(repaired, "expected {:?} to need repair", raw);
            assert_eq!(registry, Registry::with_default());
        }
    }

    #[test]
    fn test_parse_drops_bad_and_duplicate_entries() {
        let raw = r#"{"notepads":[
            {"id":"default","name":"Default Notepad"},
            {"id":"1","name":"One"},
            {"id":"1","name":"Duplicate"},
            {"id":"../x","name":"Traversal"},
            {"name":"No id"},
            42
        ]}"#;
        let (registry, repaired) = Registry::parse(raw);

        assert!(repaired);
        assert_eq!(ids(&registry), vec!["default", "1"]);
        assert_eq!(registry.get("1").unwrap().name, "One");
    }

    #[test]
    fn test_parse_restores_missing_default_first() {
        let raw = r#"{"notepads":[{"id":"5","name":"Five"}]}"#;
        let (registry, repaired) = Registry::parse(raw);

        assert!(repaired);
        assert_eq!(ids(&registry), vec!["default", "5"]);
    }

    #[test]
    fn test_next_id_uses_clock_when_ahead() {
        let registry = Registry::with_default();
        assert_eq!(registry.next_id(1_000), "1000");
    }

    #[test]
    fn test_next_id_never_goes_backwards() {
        let mut registry = Registry::with_default();
        registry.notepads.push(Notepad {
            id: "5000".into(),
            name: "Future".into(),
        });

        assert_eq!(registry.next_id(1_000), "5001");
        assert_eq!(registry.next_id(5_000), "5001");
        assert_eq!(registry.next_id(9_000), "9000");
    }

    #[test]
    fn test_next_id_terminates_at_max_id() {
        let mut registry = Registry::with_default();
        registry.notepads.push(Notepad {
            id: i64::MAX.to_string(),
            name: "Max".into(),
        });

        assert_eq!(registry.next_id(1_000), "1000");
        assert_eq!(registry.next_id(i64::MAX), "0");
    }

    #[test]
    fn test_next_id_skips_taken_ids_after_overflow() {
        let mut registry = Registry::with_default();
        for id in [i64::MAX.to_string(), "1000".into(), "1001".into()] {
            registry.notepads.push(Notepad {
                id,
                name: "Taken".into(),
            });
        }

        assert_eq!(registry.next_id(1_000), "1002");
    }

    // ==================== NotepadRegistry ====================

    #[tokio::test]
    async fn test_list_initializes_default() {
        let (temp, registry, notes) = create_test_registry();

        let listed = registry.list().await.unwrap();

        assert_eq!(listed, Registry::with_default());
        assert!(temp.path().join("notepads.json").exists());
        assert!(temp.path().join("default.txt").exists());
        assert_eq!(notes.read(DEFAULT_NOTEPAD_ID).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_list_repairs_corrupt_file_and_keeps_default_content() {
        let (temp, registry, notes) = create_test_registry();
        notes.write(DEFAULT_NOTEPAD_ID, "keep me").await.unwrap();
        std::fs::write(temp.path().join("notepads.json"), r#"{"notepads": 7}"#).unwrap();

        let listed = registry.list().await.unwrap();

        assert_eq!(ids(&listed), vec!["default"]);
        assert_eq!(notes.read(DEFAULT_NOTEPAD_ID).await.unwrap(), "keep me");

        // Repair was persisted
        let on_disk = std::fs::read_to_string(temp.path().join("notepads.json")).unwrap();
        let (parsed, repaired) = Registry::parse(&on_disk);
        assert!(!repaired);
        assert_eq!(parsed, Registry::with_default());
    }

    #[tokio::test]
    async fn test_create_twice_gives_distinct_ids_and_names() {
        let (_temp, registry, _notes) = create_test_registry();

        let first = registry.create(None).await.unwrap();
        let second = registry.create(None).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "Notepad 2");
        assert_eq!(second.name, "Notepad 3");

        let listed = registry.list().await.unwrap();
        assert_eq!(ids(&listed), vec!["default", first.id.as_str(), second.id.as_str()]);
    }

    #[tokio::test]
    async fn test_create_provisions_empty_content() {
        let (temp, registry, notes) = create_test_registry();

        let notepad = registry.create(Some("Groceries".into())).await.unwrap();

        assert_eq!(notepad.name, "Groceries");
        assert!(temp.path().join(format!("{}.txt", notepad.id)).exists());
        assert_eq!(notes.read(&notepad.id).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_create_blank_name_falls_back_to_default_name() {
        let (_temp, registry, _notes) = create_test_registry();
        let notepad = registry.create(Some("   ".into())).await.unwrap();
        assert_eq!(notepad.name, "Notepad 2");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_kept() {
        let (_temp, registry, _notes) = create_test_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.create(None).await.unwrap() })
            })
            .collect();

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap().id);
        }
        created.sort();
        created.dedup();
        assert_eq!(created.len(), 10);

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.notepads.len(), 11);
    }

    #[tokio::test]
    async fn test_rename() {
        let (_temp, registry, _notes) = create_test_registry();
        let notepad = registry.create(None).await.unwrap();

        let renamed = registry.rename(&notepad.id, "Ideas".into()).await.unwrap();

        assert_eq!(renamed.id, notepad.id);
        assert_eq!(renamed.name, "Ideas");
        assert_eq!(registry.get(&notepad.id).await.unwrap().unwrap().name, "Ideas");
    }

    #[tokio::test]
    async fn test_rename_default_is_allowed() {
        let (_temp, registry, _notes) = create_test_registry();
        let renamed = registry.rename(DEFAULT_NOTEPAD_ID, "Inbox".into()).await.unwrap();
        assert_eq!(renamed.name, "Inbox");
    }

    #[tokio::test]
    async fn test_rename_missing_is_not_found() {
        let (_temp, registry, _notes) = create_test_registry();
        let result = registry.rename("404", "Nope".into()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_default_is_always_rejected() {
        let (temp, registry, _notes) = create_test_registry();

        assert!(matches!(
            registry.delete(DEFAULT_NOTEPAD_ID).await,
            Err(StoreError::DefaultProtected)
        ));

        std::fs::write(temp.path().join("notepads.json"), "garbage").unwrap();
        assert!(matches!(
            registry.delete(DEFAULT_NOTEPAD_ID).await,
            Err(StoreError::DefaultProtected)
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_temp, registry, _notes) = create_test_registry();
        let result = registry.delete("12345").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_content() {
        let (temp, registry, notes) = create_test_registry();
        let notepad = registry.create(None).await.unwrap();
        notes.write(&notepad.id, "temporary").await.unwrap();

        registry.delete(&notepad.id).await.unwrap();

        let listed = registry.list().await.unwrap();
        assert!(listed.get(&notepad.id).is_none());
        assert!(!temp.path().join(format!("{}.txt", notepad.id)).exists());
        assert_eq!(notes.read(&notepad.id).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_content_already_gone() {
        let (temp, registry, _notes) = create_test_registry();
        let notepad = registry.create(None).await.unwrap();
        std::fs::remove_file(temp.path().join(format!("{}.txt", notepad.id))).unwrap();

        registry.delete(&notepad.id).await.unwrap();
        assert!(registry.get(&notepad.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_with_max_id_on_disk_completes() {
        let (temp, registry, _notes) = create_test_registry();
        let raw = format!(
            r#"{{"notepads": [{{"id": "default", "name": "Default Notepad"}}, {{"id": "{}", "name": "Max"}}]}}"#,
            i64::MAX
        );
        std::fs::write(temp.path().join("notepads.json"), raw).unwrap();

        let created = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            registry.create(None),
        )
        .await
        .expect("create should not hang")
        .unwrap();

        assert_ne!(created.id, i64::MAX.to_string());
        let listed = registry.list().await.unwrap();
        assert_eq!(listed.notepads.len(), 3);
        assert!(listed.get(&created.id).is_some());
    }

    #[tokio::test]
    async fn test_create_succeeds_when_content_cannot_be_provisioned() {
        let (temp, registry, notes) = create_test_registry();
        // The next id is pinned one past this far-future entry.
        std::fs::write(
            temp.path().join("notepads.json"),
            r#"{"notepads": [{"id": "default", "name": "Default Notepad"}, {"id": "9000000000000000", "name": "Future"}]}"#,
        )
        .unwrap();
        let blocked = temp.path().join("9000000000000001.txt");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("occupied"), "x").unwrap();

        let created = registry.create(None).await.unwrap();

        assert_eq!(created.id, "9000000000000001");
        assert!(registry.get(&created.id).await.unwrap().is_some());
        assert!(blocked.is_dir());
        assert!(notes.read(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_commits_when_content_cannot_be_removed() {
        let (temp, registry, _notes) = create_test_registry();
        let notepad = registry.create(None).await.unwrap();
        let content = temp.path().join(format!("{}.txt", notepad.id));
        std::fs::remove_file(&content).unwrap();
        std::fs::create_dir(&content).unwrap();
        std::fs::write(content.join("occupied"), "x").unwrap();

        registry.delete(&notepad.id).await.unwrap();

        let listed = registry.list().await.unwrap();
        assert!(listed.get(&notepad.id).is_none());
        assert_eq!(ids(&listed), vec![DEFAULT_NOTEPAD_ID]);
        assert!(content.is_dir());
    }

    #[tokio::test]
    async fn test_state_survives_new_instance() {
        let (temp, registry, notes) = create_test_registry();
        let notepad = registry.create(Some("Persistent".into())).await.unwrap();
        drop(registry);

        let reopened = NotepadRegistry::new(temp.path().to_path_buf(), notes);
        let listed = reopened.init().await.unwrap();
        assert_eq!(listed.get(&notepad.id).unwrap().name, "Persistent");
    }
}
