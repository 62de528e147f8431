use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{supported_extension, CorpusEntry, CorpusError, CorpusStore, DocumentHandle};


/// Corpus kept as plain files in one directory.
pub struct FsCorpusStore {
    root: PathBuf,
    max_document_bytes: usize,
}

impl FsCorpusStore {

    pub fn open(root: impl Into<PathBuf>, max_document_bytes: usize) -> Result<Self, CorpusError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("Corpus store opened at {}", root.display());
        Ok(Self {
            root,
            max_document_bytes,
        })
    }


    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_name(filename: &str) -> Result<(), CorpusError> {
        let bad = filename.trim().is_empty()
            || filename.starts_with('.')
            || filename.contains(['/', '\\', '\0']);
        if bad {
            return Err(CorpusError::InvalidName(filename.to_string()));
        }
        Ok(())
    }

    fn document_paths(&self) -> Result<Vec<(String, PathBuf)>, CorpusError> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || supported_extension(&name).is_none() {
                continue;
            }
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                paths.push((name, entry.path()));
            }
        }

        paths.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(paths)
    }
}

impl CorpusStore for FsCorpusStore {
    fn list_documents(&self) -> Result<Vec<DocumentHandle>, CorpusError> {
        let handles: Vec<DocumentHandle> = self
            .document_paths()?
            .into_iter()
            .map(|(_, path)| DocumentHandle::file(path))
            .collect();
        debug!("Corpus snapshot: {} documents", handles.len());
        Ok(handles)
    }

    fn get(&self, filename: &str) -> Result<Option<DocumentHandle>, CorpusError> {
        Self::validate_name(filename)?;
        let path = self.root.join(filename);
        Ok(path.is_file().then(|| DocumentHandle::file(path)))
    }

    fn add(&self, filename: &str, bytes: &[u8]) -> Result<CorpusEntry, CorpusError> {
        Self::validate_name(filename)?;
        if supported_extension(filename).is_none() {
            return Err(CorpusError::UnsupportedType(filename.to_string()));
        }
        if bytes.len() > self.max_document_bytes {
            return Err(CorpusError::TooLarge {
                size: bytes.len(),
                limit: self.max_document_bytes,
            });
        }

        // Hidden temp name keeps half-written files out of listings.
        let target = self.root.join(filename);
        let staging = self
            .root
            .join(format!(".{}.{}.partial", filename, Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&staging, bytes).and_then(|()| fs::rename(&staging, &target)) {
            match fs::remove_file(&staging) {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!("Could not remove staging file {}: {}", staging.display(), cleanup);
                }
                _ => {}
            }
            return Err(e.into());
        }

        info!("Added reference document '{}' ({} bytes)", filename, bytes.len());
        Ok(CorpusEntry {
            filename: filename.to_string(),
            size_bytes: bytes.len() as u64,
            modified_at: Some(Utc::now()),
        })
    }

    fn remove(&self, filename: &str) -> Result<bool, CorpusError> {
        Self::validate_name(filename)?;
        match fs::remove_file(self.root.join(filename)) {
            Ok(()) => {
                info!("Removed reference document '{}'", filename);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Remove requested for missing document '{}'", filename);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn entries(&self) -> Result<Vec<CorpusEntry>, CorpusError> {
        let mut entries = Vec::new();
        for (filename, path) in self.document_paths()? {
            // Removed between listing and stat.
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            entries.push(CorpusEntry {
                filename,
                size_bytes: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsCorpusStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCorpusStore::open(dir.path(), 1024).unwrap();
        (dir, store)
    }

    #[test]
    fn test_listing_is_sorted_and_filtered() {
        let (dir, store) = store();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();
        fs::write(dir.path().join("a.TXT"), "alpha").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::write(dir.path().join(".hidden.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let ids: Vec<String> = store.list_documents().unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["a.TXT", "b.txt"]);
    }

    #[test]
    fn test_add_get_remove() {
        let (_dir, store) = store();
        let entry = store.add("essay.txt", b"some reference text").unwrap();
        assert_eq!(entry.size_bytes, 19);

        assert!(store.get("essay.txt").unwrap().is_some());
        assert!(store.get("other.txt").unwrap().is_none());

        assert!(store.remove("essay.txt").unwrap());
        assert!(!store.remove("essay.txt").unwrap());
        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_add_overwrites_same_name() {
        let (dir, store) = store();
        store.add("essay.txt", b"first").unwrap();
        store.add("essay.txt", b"second version").unwrap();

        assert_eq!(store.list_documents().unwrap().len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("essay.txt")).unwrap(), "second version");
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let (_dir, store) = store();
        assert!(matches!(store.add("../escape.txt", b"x"), Err(CorpusError::InvalidName(_))));
        assert!(matches!(store.add("", b"x"), Err(CorpusError::InvalidName(_))));
        assert!(matches!(store.add("image.png", b"x"), Err(CorpusError::UnsupportedType(_))));
        assert!(matches!(
            store.add("big.txt", &vec![b'a'; 2048]),
            Err(CorpusError::TooLarge { size: 2048, limit: 1024 })
        ));
    }

    fn leftovers(dir: &tempfile::TempDir) -> Vec<String> {
        fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".partial"))
            .collect()
    }

    #[test]
    fn test_failed_add_leaves_no_staging_file() {
        let (dir, store) = store();
        // A directory in the way makes the final rename fail.
        fs::create_dir(dir.path().join("taken.txt")).unwrap();

        assert!(matches!(store.add("taken.txt", b"text"), Err(CorpusError::Io(_))));
        assert!(leftovers(&dir).is_empty());
        assert!(dir.path().join("taken.txt").is_dir());
    }

    #[test]
    fn test_successful_add_leaves_no_staging_file() {
        let (dir, store) = store();
        store.add("essay.txt", b"first").unwrap();
        store.add("essay.txt", b"second").unwrap();
        assert!(leftovers(&dir).is_empty());
    }

    #[test]
    fn test_entries_report_sizes() {
        let (_dir, store) = store();
        store.add("one.txt", b"12345").unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "one.txt");
        assert_eq!(entries[0].size_bytes, 5);
        assert!(entries[0].modified_at.is_some());
    }
}
