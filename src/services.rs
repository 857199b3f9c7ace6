use std::sync::Arc;

use crate::{
    config::ServicesConfig,
    error::StorageError,
    identity::{
        file_backend::FileBackend, hashmap_backend::HashMapBackend,
        identity_store::IdentityStore, traits::IdentityBackend,
    },
    reporting::{
        ad_params::ScreenId, event_reporter::EventReporter,
        traits::AdCollector,
    },
    screen::{context::ScreenContext, orientation::OrientationSupport},
};

/// Backend picked from `ServicesConfig::storage_dir`.
#[derive(Debug)]
pub enum ConfiguredBackend {
    Memory(HashMapBackend),
    File(FileBackend),
}

impl ConfiguredBackend {
    pub fn from_config(config: &ServicesConfig) -> Result<Self, StorageError> {
        match &config.storage_dir {
            Some(dir) => Ok(Self::File(FileBackend::open(dir)?)),
            None => Ok(Self::Memory(HashMapBackend::new())),
        }
    }
}

impl IdentityBackend for ConfiguredBackend {
    type Error = StorageError;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match self {
            Self::Memory(backend) => backend.load(key),
            Self::File(backend) => backend.load(key),
        }
    }

    fn save(&mut self, key: &str, raw: &str) -> Result<(), Self::Error> {
        match self {
            Self::Memory(backend) => backend.save(key, raw),
            Self::File(backend) => backend.save(key, raw),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
        match self {
            Self::Memory(backend) => backend.remove(key),
            Self::File(backend) => backend.remove(key),
        }
    }
}

/// The process-wide service bundle: one identity store and one reporter,
/// created at process start and shared by every screen.
pub struct Services<B: IdentityBackend, C: AdCollector> {
    config: ServicesConfig,
    identity: Arc<IdentityStore<B>>,
    reporter: Arc<EventReporter<B, C>>,
}

impl<C: AdCollector> Services<ConfiguredBackend, C> {
    /// Opens the backend selected by `config`.
    pub fn open(
        config: ServicesConfig,
        collector: Arc<C>,
    ) -> Result<Self, StorageError> {
        let backend = ConfiguredBackend::from_config(&config)?;
        tracing::info!(
            durable = config.storage_dir.is_some(),
            "Opening screen services"
        );
        Ok(Self::new(config, backend, collector))
    }
}

impl<B, C> Services<B, C>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    C: AdCollector,
{
    pub fn new(config: ServicesConfig, backend: B, collector: Arc<C>) -> Self {
        let identity = Arc::new(IdentityStore::new(backend));
        let reporter =
            Arc::new(EventReporter::new(identity.clone(), collector, &config));
        Self {
            config,
            identity,
            reporter,
        }
    }

    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<IdentityStore<B>> {
        &self.identity
    }

    pub fn reporter(&self) -> &Arc<EventReporter<B, C>> {
        &self.reporter
    }

    /// Builds the context for a new screen.
    pub fn screen(
        &self,
        id: impl Into<ScreenId>,
        orientation: OrientationSupport,
    ) -> ScreenContext<B, C> {
        ScreenContext::new(
            id.into(),
            orientation,
            self.identity.clone(),
            self.reporter.clone(),
            self.config.ads_enabled_status,
        )
    }

    /// Tears the services down. Returns the backend, or `None` while screens
    /// still hold the store.
    pub fn shutdown(self) -> Result<Option<B>, StorageError> {
        let Self {
            identity, reporter, ..
        } = self;
        drop(reporter);
        match Arc::try_unwrap(identity) {
            Ok(store) => {
                tracing::info!("Screen services shut down");
                store.into_backend().map(Some)
            }
            Err(_) => {
                tracing::warn!("Shutdown with screens still alive");
                Ok(None)
            }
        }
    }
}
