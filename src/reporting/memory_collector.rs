use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use futures::future::BoxFuture;

use crate::{
    error::NetworkError,
    reporting::{
        ad_params::{AdParameterSet, ScreenId},
        event::AnalyticsEvent,
        traits::AdCollector,
    },
};

/// Collector for hosts without an ad SDK. Accepts everything, serves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollector;

impl AdCollector for NoopCollector {
    fn ad_parameters<'a>(
        &'a self,
        _screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<AdParameterSet, NetworkError>> {
        Box::pin(async { Ok(AdParameterSet::empty()) })
    }

    fn ad_token(&self) -> BoxFuture<'_, Result<String, NetworkError>> {
        Box::pin(async { Ok(String::new()) })
    }

    fn start_session<'a>(
        &'a self,
        _token: &'a str,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async { Ok(()) })
    }

    fn present_ads<'a>(
        &'a self,
        _screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async { Ok(()) })
    }

    fn post_event<'a>(
        &'a self,
        _event: &'a AnalyticsEvent,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<AnalyticsEvent>,
    sessions: Vec<String>,
    presented: Vec<ScreenId>,
    ad_parameter_queries: Vec<ScreenId>,
}

/// In-memory collector that records what it was sent. Useful for tests and
/// for hosts that batch events themselves.
///
/// While unreachable, every call fails with `NetworkError::Unreachable` and
/// nothing is recorded.
#[derive(Debug, Default)]
pub struct MemoryCollector {
    ad_parameters: AdParameterSet,
    ad_token: String,
    unreachable: AtomicBool,
    recorded: Mutex<Recorded>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ad_parameters(mut self, params: AdParameterSet) -> Self {
        self.ad_parameters = params;
        self
    }

    pub fn with_ad_token(mut self, token: impl Into<String>) -> Self {
        self.ad_token = token.into();
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.with_recorded(|recorded| recorded.events.clone())
    }

    pub fn sessions(&self) -> Vec<String> {
        self.with_recorded(|recorded| recorded.sessions.clone())
    }

    pub fn presented(&self) -> Vec<ScreenId> {
        self.with_recorded(|recorded| recorded.presented.clone())
    }

    pub fn ad_parameter_queries(&self) -> Vec<ScreenId> {
        self.with_recorded(|recorded| recorded.ad_parameter_queries.clone())
    }

    fn with_recorded<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
        match self.recorded.lock() {
            Ok(recorded) => f(&*recorded),
            Err(poisoned) => f(&*poisoned.into_inner()),
        }
    }

    fn record(
        &self,
        f: impl FnOnce(&mut Recorded),
    ) -> Result<(), NetworkError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable);
        }
        match self.recorded.lock() {
            Ok(mut recorded) => f(&mut *recorded),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
        Ok(())
    }
}

impl AdCollector for MemoryCollector {
    fn ad_parameters<'a>(
        &'a self,
        screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<AdParameterSet, NetworkError>> {
        Box::pin(async move {
            self.record(|recorded| {
                recorded.ad_parameter_queries.push(screen.clone())
            })?;
            Ok(self.ad_parameters.clone())
        })
    }

    fn ad_token(&self) -> BoxFuture<'_, Result<String, NetworkError>> {
        Box::pin(async move {
            self.record(|_| {})?;
            Ok(self.ad_token.clone())
        })
    }

    fn start_session<'a>(
        &'a self,
        token: &'a str,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async move {
            self.record(|recorded| recorded.sessions.push(token.to_string()))
        })
    }

    fn present_ads<'a>(
        &'a self,
        screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async move {
            self.record(|recorded| recorded.presented.push(screen.clone()))
        })
    }

    fn post_event<'a>(
        &'a self,
        event: &'a AnalyticsEvent,
    ) -> BoxFuture<'a, Result<(), NetworkError>> {
        Box::pin(async move {
            self.record(|recorded| recorded.events.push(event.clone()))
        })
    }
}
