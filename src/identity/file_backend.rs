use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{error::StorageError, identity::traits::IdentityBackend};

/// File holding every identity key, inside the configured storage directory.
pub const IDENTITY_FILE_NAME: &str = "identity.json";

/// Durable backend storing all keys in one JSON object on disk.
///
/// The file is read once at open. Every write rewrites a sibling temp file,
/// syncs it and renames it over the original, so a crash leaves either the
/// old or the new contents and never a torn file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileBackend {
    /// Opens (or creates) the identity file inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(IDENTITY_FILE_NAME);

        let entries = match fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str(&body).map_err(|source| {
                StorageError::Corrupt {
                    key: path.display().to_string(),
                    source,
                }
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        tracing::debug!("Opened identity file at {:?}", path);
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let body = serde_json::to_string_pretty(&self.entries).map_err(
            |source| StorageError::Serialize {
                key: self.path.display().to_string(),
                source,
            },
        )?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(body.as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl IdentityBackend for FileBackend {
    type Error = StorageError;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, raw: &str) -> Result<(), Self::Error> {
        let previous = self.entries.insert(key.to_string(), raw.to_string());
        if let Err(err) = self.flush() {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(previous) => {
                    self.entries.insert(key.to_string(), previous);
                }
                None => {
                    self.entries.remove(key);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.flush() {
            self.entries.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempdir().unwrap();

        let mut backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.load("a").unwrap(), None);
        backend.save("a", "\"x\"").unwrap();
        backend.save("b", "7").unwrap();
        backend.remove("b").unwrap();
        drop(backend);

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(reopened.load("a").unwrap(), Some("\"x\"".to_string()));
        assert_eq!(reopened.load("b").unwrap(), None);
        assert!(!dir.path().join("identity.json.tmp").exists());
    }

    #[test]
    fn test_file_backend_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IDENTITY_FILE_NAME), "{not json").unwrap();

        let result = FileBackend::open(dir.path());
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_failed_write_keeps_memory_in_sync_with_disk() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();
        backend.save("k", "1").unwrap();

        // A directory in place of the temp file makes every flush fail.
        fs::create_dir(dir.path().join("identity.json.tmp")).unwrap();
        assert!(backend.save("k", "2").is_err());
        assert!(backend.save("new", "3").is_err());
        assert_eq!(backend.load("k").unwrap(), Some("1".to_string()));
        assert_eq!(backend.load("new").unwrap(), None);

        assert!(backend.remove("k").is_err());
        assert_eq!(backend.load("k").unwrap(), Some("1".to_string()));

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(reopened.load("k").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_file_backend_creates_missing_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("store");

        let mut backend = FileBackend::open(&nested).unwrap();
        backend.save("k", "1").unwrap();
        assert!(nested.join(IDENTITY_FILE_NAME).exists());
    }
}
