use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{error::StorageError, identity::traits::IdentityBackend};

/// A simple in-memory backend. Clones share the same map, so a new
/// `IdentityStore` built over a clone sees everything written through the
/// old one, which is how tests simulate an application restart.
#[derive(Debug, Clone, Default)]
pub struct HashMapBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl HashMapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityBackend for HashMapBackend {
    type Error = StorageError;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let entries =
            self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, raw: &str) -> Result<(), Self::Error> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_backend() {
        let mut backend = HashMapBackend::new();
        assert_eq!(backend.load("k").unwrap(), None);

        backend.save("k", "1").unwrap();
        backend.save("k", "2").unwrap();
        assert_eq!(backend.load("k").unwrap(), Some("2".to_string()));

        // Clones share storage.
        let other = backend.clone();
        assert_eq!(other.load("k").unwrap(), Some("2".to_string()));

        backend.remove("k").unwrap();
        backend.remove("k").unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let mut backend = HashMapBackend::new();
        backend.save("k", "1").unwrap();

        let poisoner = backend.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(backend.len(), 1);
        assert!(matches!(
            backend.load("k"),
            Err(StorageError::LockPoisoned)
        ));
    }
}
