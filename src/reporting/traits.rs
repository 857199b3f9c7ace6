use futures::future::BoxFuture;

use crate::{
    error::NetworkError,
    reporting::{
        ad_params::{AdParameterSet, ScreenId},
        event::AnalyticsEvent,
    },
};

/// Entry points of the external ad/analytics SDK.
///
/// Every call may suspend on network I/O. Implementations report failures as
/// `NetworkError`; `EventReporter` decides which of them are absorbed.
pub trait AdCollector: Send + Sync {
    /// Fetches the current ad-serving parameters for `screen`.
    fn ad_parameters<'a>(
        &'a self,
        screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<AdParameterSet, NetworkError>>;

    /// Fetches the opaque token used to tag outbound ad requests.
    fn ad_token(&self) -> BoxFuture<'_, Result<String, NetworkError>>;

    /// Starts the collector session with an ad token.
    fn start_session<'a>(
        &'a self,
        token: &'a str,
    ) -> BoxFuture<'a, Result<(), NetworkError>>;

    /// Asks the SDK to present its ad view over `screen`.
    fn present_ads<'a>(
        &'a self,
        screen: &'a ScreenId,
    ) -> BoxFuture<'a, Result<(), NetworkError>>;

    /// Delivers one analytics event.
    fn post_event<'a>(
        &'a self,
        event: &'a AnalyticsEvent,
    ) -> BoxFuture<'a, Result<(), NetworkError>>;
}
