//! Ordered task list persisted as one JSON blob in key-value settings storage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Task;

/// Settings entry holding the serialized task list.
pub const TASKS_KEY: &str = "SavedTasks";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string-valued settings, addressed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings file: a flat JSON object of named string entries.
///
/// Every `set` rewrites the whole file through a sibling temp file.
#[derive(Debug, Clone)]
pub struct JsonFileKv {
    path: PathBuf,
}

impl JsonFileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let s = fs::read_to_string(&self.path)?;
        if s.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&s)?)
    }
}

impl KeyValueStore for JsonFileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        // A corrupt settings file is replaced rather than blocking every write.
        let mut all = self.read_all().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "discarding unreadable settings file");
            BTreeMap::new()
        });
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&all)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Authoritative, insertion-ordered task collection.
#[derive(Debug)]
pub struct TaskStore<K: KeyValueStore> {
    kv: K,
    tasks: Vec<Task>,
}

impl<K: KeyValueStore> TaskStore<K> {
    /// Load once at startup. Missing or unreadable data means an empty list.
    pub fn load(kv: K) -> Self {
        let tasks = match kv.get(TASKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(error = %e, "saved tasks did not deserialize; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read saved tasks; starting empty");
                Vec::new()
            }
        };
        debug!(count = tasks.len(), "loaded tasks");
        Self { kv, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks whose short hex id starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Task> {
        let prefix = prefix.trim().to_lowercase().replace('-', "");
        if prefix.is_empty() {
            return Vec::new();
        }
        self.tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&prefix))
            .collect()
    }

    pub fn add(&mut self, task: Task) -> Result<(), StoreError> {
        self.tasks.push(task);
        self.persist()
    }

    /// Replace the task with the same id. Returns `false` without touching
    /// storage when the id is gone (e.g. deleted while a suggestion was in flight).
    pub fn update(&mut self, task: Task) -> Result<bool, StoreError> {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            debug!(task_id = %task.id, "update for unknown task ignored");
            return Ok(false);
        };
        *slot = task;
        self.persist()?;
        Ok(true)
    }

    pub fn toggle_completed(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let Some(mut task) = self.get(id).cloned() else {
            return Ok(false);
        };
        task.completed = !task.completed;
        self.update(task)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        self.tasks.remove(idx);
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.tasks)?;
        self.kv.set(TASKS_KEY, json)
    }

    pub fn into_inner(self) -> K {
        self.kv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn stored(kv: &MemoryKv) -> Vec<Task> {
        serde_json::from_str(&kv.get(TASKS_KEY).unwrap().unwrap()).unwrap()
    }

    fn seeded() -> TaskStore<MemoryKv> {
        let mut store = TaskStore::load(MemoryKv::new());
        store.add(Task::new("first", Priority::Low, date(1))).unwrap();
        store.add(Task::new("second", Priority::High, date(2))).unwrap();
        store.add(Task::new("third", Priority::Medium, date(3))).unwrap();
        store
    }

    #[test]
    fn empty_when_nothing_saved() {
        let store = TaskStore::load(MemoryKv::new());
        assert!(store.is_empty());
    }

    #[test]
    fn empty_when_saved_data_is_garbage() {
        let mut kv = MemoryKv::new();
        kv.set(TASKS_KEY, "{not json".to_string()).unwrap();
        let store = TaskStore::load(kv);
        assert!(store.is_empty());
    }

    #[test]
    fn round_trip_preserves_everything() {
        let mut store = seeded();
        let mut t = store.tasks()[1].clone();
        t.suggestion = Some("Morning (9-11 AM)".to_string());
        t.scheduled_time = date(2).and_hms_opt(9, 0, 0);
        t.completed = true;
        assert!(store.update(t).unwrap());

        let before = store.tasks().to_vec();
        let reloaded = TaskStore::load(store.into_inner());
        assert_eq!(reloaded.tasks(), before.as_slice());
    }

    #[test]
    fn insertion_order_is_kept() {
        let store = seeded();
        let titles: Vec<_> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[test]
    fn delete_removes_exactly_one_and_persists() {
        let mut store = seeded();
        let victim = store.tasks()[1].id;
        let expected: Vec<Task> = store
            .tasks()
            .iter()
            .filter(|t| t.id != victim)
            .cloned()
            .collect();

        assert!(store.delete(victim).unwrap());
        assert_eq!(store.tasks(), expected.as_slice());

        let kv = store.into_inner();
        assert_eq!(stored(&kv), expected);
    }

    #[test]
    fn update_of_missing_id_is_a_noop() {
        let mut store = seeded();
        let ghost = Task::new("ghost", Priority::High, date(9));
        let before = store.tasks().to_vec();

        assert!(!store.update(ghost.clone()).unwrap());
        assert!(!store.delete(ghost.id).unwrap());
        assert!(!store.toggle_completed(ghost.id).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn update_after_delete_does_not_resurrect() {
        let mut store = seeded();
        let mut t = store.tasks()[0].clone();
        store.delete(t.id).unwrap();

        t.suggestion = Some("late reply".to_string());
        assert!(!store.update(t.clone()).unwrap());
        assert!(store.get(t.id).is_none());
        assert_eq!(stored(&store.into_inner()).len(), 2);
    }

    #[test]
    fn toggle_flips_completion() {
        let mut store = seeded();
        let id = store.tasks()[2].id;
        assert!(store.toggle_completed(id).unwrap());
        assert!(store.get(id).unwrap().completed);
        assert!(store.toggle_completed(id).unwrap());
        assert!(!store.get(id).unwrap().completed);
    }

    #[test]
    fn find_by_prefix() {
        let store = seeded();
        let t = &store.tasks()[0];
        let hits = store.find_by_prefix(&t.short_id());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, t.id);
        assert!(store.find_by_prefix("").is_empty());
    }

    #[test]
    fn json_file_kv_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = TaskStore::load(JsonFileKv::new(&path));
        store.add(Task::new("on disk", Priority::Medium, date(4))).unwrap();
        let saved = store.tasks().to_vec();

        let reloaded = TaskStore::load(JsonFileKv::new(&path));
        assert_eq!(reloaded.tasks(), saved.as_slice());
    }

    #[test]
    fn json_file_kv_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut kv = JsonFileKv::new(&path);
        kv.set("Theme", "dark".to_string()).unwrap();

        let mut store = TaskStore::load(kv);
        store.add(Task::new("x", Priority::Low, date(5))).unwrap();

        let kv = store.into_inner();
        assert_eq!(kv.get("Theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn json_file_kv_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "]]]").unwrap();

        let store = TaskStore::load(JsonFileKv::new(&path));
        assert!(store.is_empty());
    }
}
