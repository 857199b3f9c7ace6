use std::sync::{Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{IdentityError, StorageError},
    identity::{
        record::{AttributionRecord, StatusFlag},
        traits::IdentityBackend,
    },
};

/// Storage key for the JSON-encoded `AttributionRecord`.
pub const ATTRIBUTION_KEY: &str = "identity.attribution";

/// Storage key for the JSON-encoded status flag.
pub const STATUS_KEY: &str = "identity.status";

/// Persists the attribution record and the status flag across restarts.
///
/// One store is shared by every screen of the process. All access goes
/// through a single lock, so concurrent read-modify-write sequences from
/// different screens cannot lose updates, and writes from one screen are
/// observed in issue order.
///
/// Absence is never an error: reads return an empty record or `None` on a
/// fresh install. Storage failures are returned to the caller.
#[derive(Debug)]
pub struct IdentityStore<B: IdentityBackend> {
    backend: Mutex<B>,
}

impl<B> IdentityStore<B>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Tears the store down and hands the backend back.
    pub fn into_backend(self) -> Result<B, StorageError> {
        self.backend
            .into_inner()
            .map_err(|_| StorageError::LockPoisoned)
    }

    /// Returns the persisted attribution record, or an empty record if none
    /// was ever stored.
    pub fn get_attribution(&self) -> Result<AttributionRecord, IdentityError> {
        let backend = self.lock()?;
        let record = read::<B, AttributionRecord>(&*backend, ATTRIBUTION_KEY)?
            .unwrap_or_default();
        Ok(record)
    }

    /// Stored identifier. `None` if never set, `Some("")` if an empty id was
    /// stored.
    pub fn attribution_id(&self) -> Result<Option<String>, IdentityError> {
        Ok(self.get_attribution()?.id)
    }

    /// Stored identifier, or the empty string if unset.
    pub fn attribution_id_string(&self) -> Result<String, IdentityError> {
        Ok(self.attribution_id()?.unwrap_or_default())
    }

    /// Stored identifier read as an integer, for sources that hand out
    /// numeric install ids. `None` when unset or not numeric.
    pub fn attribution_numeric_id(&self) -> Result<Option<i64>, IdentityError> {
        let id = self.attribution_id()?;
        Ok(id.and_then(|id| id.trim().parse().ok()))
    }

    /// Stores `id` as a fresh attribution record. Saving the id that is
    /// already stored does not touch storage.
    pub fn save_attribution_id(&self, id: &str) -> Result<(), IdentityError> {
        let mut backend = self.lock()?;
        let current = read::<B, AttributionRecord>(&*backend, ATTRIBUTION_KEY)?
            .unwrap_or_default();

        if current.id.as_deref() == Some(id) {
            tracing::debug!("Attribution id unchanged, skipping write");
            return Ok(());
        }
        check_not_clearing(&current, id)?;

        write(&mut *backend, ATTRIBUTION_KEY, &AttributionRecord::from_id(id))?;
        tracing::info!("Stored attribution id");
        Ok(())
    }

    /// Replaces the stored record wholesale with a freshly fetched one.
    pub fn save_attribution(
        &self,
        record: &AttributionRecord,
    ) -> Result<(), IdentityError> {
        let mut backend = self.lock()?;
        let current = read::<B, AttributionRecord>(&*backend, ATTRIBUTION_KEY)?
            .unwrap_or_default();

        if &current == record {
            tracing::debug!("Attribution record unchanged, skipping write");
            return Ok(());
        }
        check_not_clearing(&current, record.id_str())?;

        write(&mut *backend, ATTRIBUTION_KEY, record)?;
        tracing::info!(
            payload_keys = record.raw.len(),
            "Stored attribution record"
        );
        Ok(())
    }

    /// Returns the stored status, or `None` if it was never written.
    pub fn get_status(&self) -> Result<Option<StatusFlag>, IdentityError> {
        let backend = self.lock()?;
        Ok(read(&*backend, STATUS_KEY)?)
    }

    /// Overwrites the stored status. Last write wins.
    pub fn save_status(&self, value: i64) -> Result<(), IdentityError> {
        let status = StatusFlag(value);
        let mut backend = self.lock()?;
        write(&mut *backend, STATUS_KEY, &status)?;
        tracing::info!(status = status.value(), "Stored status flag");
        Ok(())
    }

    /// Explicitly removes both records, e.g. on account reset.
    pub fn clear(&self) -> Result<(), IdentityError> {
        let mut backend = self.lock()?;
        backend.remove(ATTRIBUTION_KEY).map_err(StorageError::from)?;
        backend.remove(STATUS_KEY).map_err(StorageError::from)?;
        tracing::info!("Cleared identity records");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, B>, StorageError> {
        self.backend.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn check_not_clearing(
    current: &AttributionRecord,
    new_id: &str,
) -> Result<(), IdentityError> {
    if current.has_id() && new_id.is_empty() {
        tracing::warn!("Rejected write that would clear the attribution id");
        return Err(IdentityError::WouldClearAttributionId {
            stored: current.id_str().to_string(),
        });
    }
    Ok(())
}

fn read<B, T>(backend: &B, key: &str) -> Result<Option<T>, StorageError>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    T: DeserializeOwned,
{
    let Some(raw) = backend.load(key)? else {
        return Ok(None);
    };
    let value =
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
    Ok(Some(value))
}

fn write<B, T>(
    backend: &mut B,
    key: &str,
    value: &T,
) -> Result<(), StorageError>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    T: Serialize,
{
    let raw =
        serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
    backend.save(key, &raw)?;
    Ok(())
}
