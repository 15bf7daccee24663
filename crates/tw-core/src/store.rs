//! Whole-document JSON stores with an optimistic version stamp.
//!
//! Every store is a single JSON object on disk: a `version` counter plus
//! the document's own fields. Reads are lenient: a missing, unreadable,
//! or malformed file loads as the empty default. Writes check that the
//! file still carries the version that was loaded and fail with
//! [`CoreError::Conflict`] otherwise, so a second writer can never
//! silently overwrite the first.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A loaded document together with the version it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot<T> {
    /// Version stamp on disk when loaded; 0 for a fresh document.
    pub version: u64,
    /// The document.
    pub data: T,
}

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    version: u64,
    #[serde(flatten)]
    data: &'a T,
}

#[derive(Deserialize)]
struct Document<T> {
    #[serde(default)]
    version: u64,
    #[serde(flatten)]
    data: T,
}

#[derive(Deserialize)]
struct VersionStamp {
    #[serde(default)]
    version: u64,
}

/// A JSON file holding one document of type `T`.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// A store backed by the file at `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the document. Never fails; unreadable data loads as the default.
    pub fn load(&self) -> Snapshot<T> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "unreadable store, using empty document");
                }
                return Snapshot::default();
            }
        };
        match serde_json::from_str::<Document<T>>(&text) {
            Ok(doc) => Snapshot {
                version: doc.version,
                data: doc.data,
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "malformed store, using empty document");
                Snapshot::default()
            }
        }
    }

    /// Write `snapshot` back if nobody else wrote since it was loaded.
    ///
    /// Returns the new version stamp.
    pub fn save(&self, snapshot: &Snapshot<T>) -> CoreResult<u64> {
        let found = self.disk_version();
        if found != snapshot.version {
            tracing::warn!(
                path = %self.path.display(),
                expected = snapshot.version,
                found,
                "store write conflict"
            );
            return Err(CoreError::Conflict {
                path: self.path.clone(),
                expected: snapshot.version,
                found,
            });
        }

        let version = snapshot.version + 1;
        let json = serde_json::to_string_pretty(&DocumentRef {
            version,
            data: &snapshot.data,
        })?;
        self.write_atomic(json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), version, "store saved");
        Ok(version)
    }

    /// Load, apply `f`, and save in one step.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> CoreResult<R> {
        let mut snapshot = self.load();
        let out = f(&mut snapshot.data);
        self.save(&snapshot)?;
        Ok(out)
    }

    fn disk_version(&self) -> u64 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str::<VersionStamp>(&text).ok())
            .map(|stamp| stamp.version)
            .unwrap_or(0)
    }

    fn write_atomic(&self, bytes: &[u8]) -> CoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Counters {
        counts: BTreeMap<String, u32>,
    }

    fn store(dir: &tempfile::TempDir) -> JsonStore<Counters> {
        JsonStore::new(dir.path().join("nested/counters.json"))
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let snap = store(&dir).load();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.data, Counters::default());
    }

    #[test]
    fn save_then_load_round_trips_with_version() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let mut snap = s.load();
        snap.data.counts.insert("a".to_string(), 3);
        assert_eq!(s.save(&snap).unwrap(), 1);

        let loaded = s.load();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.data.counts["a"], 3);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(s.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["counts"]["a"], 3);
    }

    #[test]
    fn malformed_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        std::fs::create_dir_all(s.path().parent().unwrap()).unwrap();
        std::fs::write(s.path(), "{ definitely not json").unwrap();
        assert_eq!(s.load(), Snapshot::default());

        // A malformed file carries no version, so it can be replaced.
        s.update(|c| c.counts.insert("x".to_string(), 1)).unwrap();
        assert_eq!(s.load().data.counts["x"], 1);
    }

    #[test]
    fn stale_writer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let mut first = s.load();
        let mut second = s.load();

        first.data.counts.insert("first".to_string(), 1);
        s.save(&first).unwrap();

        second.data.counts.insert("second".to_string(), 2);
        let err = s.save(&second).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
        assert!(!s.load().data.counts.contains_key("second"));
    }

    #[test]
    fn update_applies_and_returns() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let n = s
            .update(|c| {
                *c.counts.entry("hits".to_string()).or_default() += 1;
                c.counts["hits"]
            })
            .unwrap();
        assert_eq!(n, 1);
        let n = s
            .update(|c| {
                *c.counts.entry("hits".to_string()).or_default() += 1;
                c.counts["hits"]
            })
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(s.load().version, 2);
    }
}
