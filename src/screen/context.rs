use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use futures::future::{AbortHandle, Abortable};

use crate::{
    error::{Cancelled, IdentityError, StorageError},
    identity::{
        identity_store::IdentityStore,
        record::{AttributionRecord, StatusFlag},
        traits::IdentityBackend,
    },
    reporting::{
        ad_params::{AdParameterSet, ScreenId},
        event::EventParams,
        event_reporter::EventReporter,
        traits::AdCollector,
    },
    screen::orientation::{Orientation, OrientationSupport},
};

/// Event posted by `ScreenContext::appeared`.
pub const SCREEN_VIEW_EVENT: &str = "screen_view";

/// Per-screen handle on the shared services.
///
/// Screens get their identity and reporting capabilities from this object
/// instead of inheriting them. Ad-parameter fetches started through it are
/// tied to the screen's lifetime: `dismiss` (or dropping the context)
/// cancels whatever is still in flight.
pub struct ScreenContext<B: IdentityBackend, C: AdCollector> {
    id: ScreenId,
    orientation: OrientationSupport,
    identity: Arc<IdentityStore<B>>,
    reporter: Arc<EventReporter<B, C>>,
    ads_enabled_status: i64,
    dismissed: AtomicBool,
    next_request: AtomicU64,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
}

impl<B: IdentityBackend, C: AdCollector> ScreenContext<B, C> {
    /// Cancels in-flight ad-parameter fetches. Idempotent.
    pub fn dismiss(&self) {
        if self.dismissed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut in_flight =
            self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in in_flight.drain() {
            handle.abort();
        }
        tracing::debug!(screen = %self.id, "Screen dismissed");
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::SeqCst)
    }
}

impl<B: IdentityBackend, C: AdCollector> Drop for ScreenContext<B, C> {
    fn drop(&mut self) {
        self.dismiss();
    }
}

impl<B, C> ScreenContext<B, C>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    C: AdCollector,
{
    pub fn new(
        id: ScreenId,
        orientation: OrientationSupport,
        identity: Arc<IdentityStore<B>>,
        reporter: Arc<EventReporter<B, C>>,
        ads_enabled_status: i64,
    ) -> Self {
        Self {
            id,
            orientation,
            identity,
            reporter,
            ads_enabled_status,
            dismissed: AtomicBool::new(false),
            next_request: AtomicU64::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &ScreenId {
        &self.id
    }

    pub fn orientation(&self) -> OrientationSupport {
        self.orientation
    }

    /// Whether the platform may rotate this screen to `orientation`.
    pub fn supports(&self, orientation: Orientation) -> bool {
        self.orientation.permits(orientation)
    }

    pub fn identity(&self) -> &IdentityStore<B> {
        &self.identity
    }

    pub fn reporter(&self) -> &EventReporter<B, C> {
        &self.reporter
    }

    pub fn get_attribution(&self) -> Result<AttributionRecord, IdentityError> {
        self.identity.get_attribution()
    }

    pub fn save_attribution_id(&self, id: &str) -> Result<(), IdentityError> {
        self.identity.save_attribution_id(id)
    }

    pub fn attribution_id(&self) -> Result<Option<String>, IdentityError> {
        self.identity.attribution_id()
    }

    pub fn attribution_id_string(&self) -> Result<String, IdentityError> {
        self.identity.attribution_id_string()
    }

    pub fn get_status(&self) -> Result<Option<StatusFlag>, IdentityError> {
        self.identity.get_status()
    }

    pub fn save_status(&self, value: i64) -> Result<(), IdentityError> {
        self.identity.save_status(value)
    }

    /// True when the stored status is the configured ad-enabling value.
    pub fn ads_enabled(&self) -> Result<bool, IdentityError> {
        let status = self.identity.get_status()?;
        Ok(status
            .is_some_and(|status| status.value() == self.ads_enabled_status))
    }

    /// Fetches ad parameters for this screen. Returns `Cancelled` if the
    /// screen is dismissed first.
    pub async fn ad_parameters(&self) -> Result<AdParameterSet, Cancelled> {
        let (handle, registration) = AbortHandle::new_pair();
        let request = self.next_request.fetch_add(1, Ordering::Relaxed);
        {
            let mut in_flight =
                self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // Checked under the lock so a concurrent dismiss cannot miss us.
            if self.is_dismissed() {
                return Err(Cancelled);
            }
            in_flight.insert(request, handle);
        }

        let result =
            Abortable::new(self.reporter.ad_parameters(&self.id), registration)
                .await;

        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&request);

        result.map_err(|_| {
            tracing::debug!(screen = %self.id, "Ad parameter fetch cancelled");
            Cancelled
        })
    }

    pub async fn ad_token(&self) -> String {
        self.reporter.ad_token().await
    }

    pub async fn show_ads(&self) {
        self.reporter.show_ads(&self.id).await
    }

    pub async fn post_event(&self, name: &str) {
        self.reporter.post_event(name).await
    }

    pub async fn post_event_with(&self, name: &str, params: EventParams) {
        self.reporter.post_event_with(name, params).await
    }

    /// Reports that the screen became visible.
    pub async fn appeared(&self) {
        let mut params = EventParams::new();
        params.insert("screen".to_string(), self.id.as_str().into());
        self.reporter.post_event_with(SCREEN_VIEW_EVENT, params).await
    }
}
