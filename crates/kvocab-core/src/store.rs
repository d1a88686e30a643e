use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kvocab_types::{Entry, Rank, RankedTerm};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::PipelineError;

/// In-memory rank -> entry mapping
pub type Store = BTreeMap<Rank, Entry>;

/// Durable home of the store: one JSON file rewritten wholesale
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full store; a missing file is `NotFound`
    pub async fn load(&self) -> Result<Store, PipelineError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(PipelineError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let store: Store = serde_json::from_slice(&data).map_err(|source| PipelineError::Json {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), entries = store.len(), "Loaded store");
        Ok(store)
    }

    /// First-run variant of `load`: a missing file is an empty store
    pub async fn load_or_default(&self) -> Result<Store, PipelineError> {
        match self.load().await {
            Err(PipelineError::NotFound(path)) => {
                tracing::info!(path = %path.display(), "No store yet, starting empty");
                Ok(Store::new())
            }
            other => other,
        }
    }

    /// Write to a sibling temp file, then rename over the store
    pub async fn persist(&self, store: &Store) -> Result<(), PipelineError> {
        let io_err = |source| PipelineError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let data = serde_json::to_vec_pretty(store).map_err(|source| PipelineError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).await.map_err(io_err)?;
        file.write_all(&data).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), entries = store.len(), "Persisted store");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Insert placeholder entries for ranks missing from the store.
///
/// Existing entries are never touched. Returns the number inserted.
pub fn ensure_all_keys_present(store: &mut Store, keys: &[RankedTerm]) -> usize {
    let mut inserted = 0;

    for key in keys {
        match store.get(&key.rank) {
            Some(existing) if existing.term != key.term => {
                tracing::warn!(
                    rank = key.rank,
                    stored = %existing.term,
                    listed = %key.term,
                    "Term mismatch for rank, keeping stored entry"
                );
            }
            Some(_) => {}
            None => {
                store.insert(key.rank, Entry::placeholder(key.rank, key.term.clone()));
                inserted += 1;
            }
        }
    }

    inserted
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn keys() -> Vec<RankedTerm> {
        vec![
            RankedTerm { rank: 1, term: "것".to_string() },
            RankedTerm { rank: 2, term: "하다".to_string() },
            RankedTerm { rank: 3, term: "있다".to_string() },
        ]
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let records = RecordStore::new(dir.path().join("absent.json"));

        assert!(matches!(records.load().await, Err(PipelineError::NotFound(_))));
        assert!(records.load_or_default().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persist_then_load_round_trips_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let records = RecordStore::new(dir.path().join("nested/definitions.json"));

        let mut store = Store::new();
        ensure_all_keys_present(&mut store, &keys());
        store.get_mut(&2).unwrap().def = Some("어떤 일을 이루는 것이다.".to_string());
        records.persist(&store).await.unwrap();

        let loaded = records.load().await.unwrap();
        assert_eq!(loaded, store);
        assert!(!records.temp_path().exists());
    }

    #[tokio::test]
    async fn backfill_is_idempotent_through_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let records = RecordStore::new(dir.path().join("definitions.json"));

        let mut store = Store::new();
        store.insert(2, Entry::placeholder(2, "하다"));
        assert_eq!(ensure_all_keys_present(&mut store, &keys()), 2);
        records.persist(&store).await.unwrap();
        let once = records.load().await.unwrap();

        let mut again = once.clone();
        assert_eq!(ensure_all_keys_present(&mut again, &keys()), 0);
        records.persist(&again).await.unwrap();

        assert_eq!(records.load().await.unwrap(), once);
        assert_eq!(once.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn backfill_keeps_existing_entries() {
        let mut store = Store::new();
        let mut defined = Entry::placeholder(1, "것");
        defined.def = Some("어떤 사물을 가리키는 말이다.".to_string());
        defined.def_request_id = "req-1".to_string();
        store.insert(1, defined.clone());

        ensure_all_keys_present(&mut store, &keys());

        assert_eq!(store[&1], defined);
        assert_eq!(store[&3].def, None);
        assert_eq!(store[&3].def_request_id, "");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = RecordStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PipelineError::Json { .. }));
    }
}
