use std::sync::Arc;

use crate::{
    config::ServicesConfig,
    error::StorageError,
    identity::{identity_store::IdentityStore, traits::IdentityBackend},
    reporting::{
        ad_params::{AdParameterSet, ScreenId},
        event::{AnalyticsEvent, EventParams, ParamValue},
        traits::AdCollector,
    },
};

/// Forwards events and ad queries to the external collector.
///
/// Network failures stop here: they are logged and degrade to "no ad, no
/// event" instead of reaching the UI. The reporter never writes to the
/// identity store; it only reads the attribution id to tag events.
pub struct EventReporter<B: IdentityBackend, C: AdCollector> {
    identity: Arc<IdentityStore<B>>,
    collector: Arc<C>,
    attach_attribution_id: bool,
    attribution_param_key: String,
    configured_ad_token: Option<String>,
}

impl<B, C> EventReporter<B, C>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    C: AdCollector,
{
    pub fn new(
        identity: Arc<IdentityStore<B>>,
        collector: Arc<C>,
        config: &ServicesConfig,
    ) -> Self {
        Self {
            identity,
            collector,
            attach_attribution_id: config.attach_attribution_id,
            attribution_param_key: config.attribution_param_key.clone(),
            configured_ad_token: config
                .ad_token
                .clone()
                .filter(|token| !token.is_empty()),
        }
    }

    pub fn collector(&self) -> &Arc<C> {
        &self.collector
    }

    /// Current ad parameters for `screen`, or an empty set if the collector
    /// cannot be reached.
    pub async fn ad_parameters(&self, screen: &ScreenId) -> AdParameterSet {
        match self.collector.ad_parameters(screen).await {
            Ok(params) => {
                tracing::debug!(
                    %screen,
                    count = params.len(),
                    "Fetched ad parameters"
                );
                params
            }
            Err(err) => {
                tracing::warn!(
                    %screen,
                    "Failed to fetch ad parameters: {}",
                    err
                );
                AdParameterSet::empty()
            }
        }
    }

    /// Ad token from configuration, else from the collector. Empty when
    /// neither has one.
    pub async fn ad_token(&self) -> String {
        if let Some(token) = &self.configured_ad_token {
            return token.clone();
        }
        match self.collector.ad_token().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("Failed to fetch ad token: {}", err);
                String::new()
            }
        }
    }

    /// Starts the collector session. Returns whether a session was started;
    /// without a token there is nothing to start.
    pub async fn start_session(&self) -> bool {
        let token = self.ad_token().await;
        if token.is_empty() {
            tracing::debug!("No ad token, collector session not started");
            return false;
        }
        match self.collector.start_session(&token).await {
            Ok(()) => {
                tracing::info!("Collector session started");
                true
            }
            Err(err) => {
                tracing::warn!("Failed to start collector session: {}", err);
                false
            }
        }
    }

    /// Asks the ad SDK to present its view over `screen`.
    pub async fn show_ads(&self, screen: &ScreenId) {
        match self.collector.present_ads(screen).await {
            Ok(()) => tracing::info!(%screen, "Presented ads"),
            Err(err) => {
                tracing::warn!(%screen, "Failed to present ads: {}", err)
            }
        }
    }

    /// Posts a named event with no parameters. Best effort.
    pub async fn post_event(&self, name: &str) {
        self.post_event_with(name, EventParams::new()).await
    }

    /// Posts a named event with parameters. Best effort: failures are logged
    /// and dropped.
    pub async fn post_event_with(&self, name: &str, params: EventParams) {
        if name.is_empty() {
            tracing::warn!("Dropping event with empty name");
            return;
        }
        let event = self.decorate(AnalyticsEvent::with_params(name, params));
        if let Err(err) = self.collector.post_event(&event).await {
            tracing::warn!(
                event = %event.name,
                "Failed to post event: {}",
                err
            );
        }
    }

    /// Attaches the stored attribution id unless the caller already set the
    /// key or attachment is disabled.
    fn decorate(&self, mut event: AnalyticsEvent) -> AnalyticsEvent {
        if !self.attach_attribution_id
            || event.params.contains_key(&self.attribution_param_key)
        {
            return event;
        }
        match self.identity.attribution_id() {
            Ok(Some(id)) if !id.is_empty() => {
                event.params.insert(
                    self.attribution_param_key.clone(),
                    ParamValue::Text(id),
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("Sending event without attribution id: {}", err);
            }
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::{
        identity::{
            hashmap_backend::HashMapBackend, identity_store::STATUS_KEY,
        },
        reporting::memory_collector::MemoryCollector,
    };

    fn reporter(
        collector: MemoryCollector,
        config: &ServicesConfig,
    ) -> EventReporter<HashMapBackend, MemoryCollector> {
        let identity = Arc::new(IdentityStore::new(HashMapBackend::new()));
        EventReporter::new(identity, Arc::new(collector), config)
    }

    #[test]
    fn test_post_event_attaches_attribution_id() {
        let reporter =
            reporter(MemoryCollector::new(), &ServicesConfig::default());
        block_on(reporter.post_event("before_attribution"));
        reporter.identity.save_attribution_id("abc123").unwrap();
        block_on(reporter.post_event("open"));

        let mut params = EventParams::new();
        params.insert("level".to_string(), 2.into());
        params.insert("attribution_id".to_string(), "caller".into());
        block_on(reporter.post_event_with("win", params));

        let events = reporter.collector().events();
        assert_eq!(events.len(), 3);
        assert!(events[0].params.is_empty());
        assert_eq!(
            events[1],
            AnalyticsEvent::new("open").param("attribution_id", "abc123")
        );
        assert_eq!(
            events[2],
            AnalyticsEvent::new("win")
                .param("level", 2)
                .param("attribution_id", "caller")
        );
    }

    #[test]
    fn test_attachment_can_be_disabled() {
        let config = ServicesConfig {
            attach_attribution_id: false,
            ..Default::default()
        };
        let reporter = reporter(MemoryCollector::new(), &config);
        reporter.identity.save_attribution_id("abc123").unwrap();
        block_on(reporter.post_event("open"));

        assert_eq!(
            reporter.collector().events(),
            vec![AnalyticsEvent::new("open")]
        );
    }

    #[test]
    fn test_empty_event_name_is_dropped() {
        let reporter =
            reporter(MemoryCollector::new(), &ServicesConfig::default());
        block_on(reporter.post_event(""));
        assert!(reporter.collector().events().is_empty());
    }

    #[test]
    fn test_unreachable_collector_degrades_silently() {
        let collector = MemoryCollector::new()
            .with_ad_parameters(AdParameterSet(vec![json!({"slot": "top"})]))
            .with_ad_token("tok");
        collector.set_unreachable(true);
        let reporter = reporter(collector, &ServicesConfig::default());
        let screen = ScreenId::new("game");

        block_on(reporter.post_event("open"));
        block_on(reporter.post_event_with("win", EventParams::new()));
        block_on(reporter.show_ads(&screen));
        assert!(block_on(reporter.ad_parameters(&screen)).is_empty());
        assert_eq!(block_on(reporter.ad_token()), "");
        assert!(!block_on(reporter.start_session()));

        reporter.collector().set_unreachable(false);
        assert_eq!(block_on(reporter.ad_parameters(&screen)).len(), 1);
        assert!(reporter.collector().events().is_empty());
    }

    #[test]
    fn test_storage_error_does_not_block_event() {
        let mut backend = HashMapBackend::new();
        backend
            .save(crate::identity::identity_store::ATTRIBUTION_KEY, "garbage")
            .unwrap();
        backend.save(STATUS_KEY, "1").unwrap();
        let identity = Arc::new(IdentityStore::new(backend));
        let reporter = EventReporter::new(
            identity,
            Arc::new(MemoryCollector::new()),
            &ServicesConfig::default(),
        );

        block_on(reporter.post_event("open"));
        assert_eq!(
            reporter.collector().events(),
            vec![AnalyticsEvent::new("open")]
        );
    }

    #[test]
    fn test_configured_ad_token_wins() {
        let config = ServicesConfig {
            ad_token: Some("local".to_string()),
            ..Default::default()
        };
        let reporter =
            reporter(MemoryCollector::new().with_ad_token("remote"), &config);
        assert_eq!(block_on(reporter.ad_token()), "local");
        assert!(block_on(reporter.start_session()));
        assert_eq!(reporter.collector().sessions(), vec!["local".to_string()]);

        let reporter = reporter_without_token();
        assert!(!block_on(reporter.start_session()));
        assert!(reporter.collector().sessions().is_empty());
    }

    fn reporter_without_token(
    ) -> EventReporter<HashMapBackend, MemoryCollector> {
        reporter(MemoryCollector::new(), &ServicesConfig::default())
    }

    #[test]
    fn test_show_ads_reaches_collector() {
        let reporter =
            reporter(MemoryCollector::new(), &ServicesConfig::default());
        let screen = ScreenId::new("start");
        block_on(reporter.show_ads(&screen));
        assert_eq!(reporter.collector().presented(), vec![screen]);
    }
}
