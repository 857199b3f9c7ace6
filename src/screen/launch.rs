use futures::future::BoxFuture;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::{
    error::{IdentityError, NetworkError, StorageError},
    identity::{record::AttributionRecord, traits::IdentityBackend},
    reporting::traits::AdCollector,
    screen::context::ScreenContext,
};

/// Device ad data handed out by the attribution backend on first launch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceAdData {
    #[serde(deserialize_with = "deserialize_status")]
    pub status: i64,
    pub url: String,

    /// Every field of the payload, including `status` and `url`.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl DeviceAdData {
    /// Parses the decoded JSON payload. `status` must be numeric (an
    /// integer, a whole float, or a bool read as 0/1) and `url` a string;
    /// anything else is kept only in `raw`.
    pub fn from_json(body: &str) -> Result<Self, NetworkError> {
        let raw: Map<String, Value> = serde_json::from_str(body)
            .map_err(|err| NetworkError::Malformed(err.to_string()))?;
        let mut data: Self =
            serde_json::from_value(Value::Object(raw.clone()))
                .map_err(|err| NetworkError::Malformed(err.to_string()))?;
        data.raw = raw;
        Ok(data)
    }

    fn into_record(self) -> AttributionRecord {
        AttributionRecord::from_payload(self.url, self.raw)
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(i64::from(flag)),
        Value::Number(number) => {
            if let Some(status) = number.as_i64() {
                return Ok(status);
            }
            match number.as_f64() {
                Some(status)
                    if status.fract() == 0.0
                        && status >= i64::MIN as f64
                        && status < i64::MAX as f64 =>
                {
                    Ok(status as i64)
                }
                _ => Err(de::Error::custom(format!(
                    "status {number} is not a whole number"
                ))),
            }
        }
        other => Err(de::Error::custom(format!(
            "status must be numeric, got {other}"
        ))),
    }
}

/// Source of first-launch attribution data, e.g. the app's attribution
/// backend. Connectivity handling belongs to the implementation.
pub trait AttributionSource: Send + Sync {
    fn fetch_device_ad_data(
        &self,
    ) -> BoxFuture<'_, Result<DeviceAdData, NetworkError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Ads were presented over the launch screen.
    AdsShown,
    /// Attribution is known but the status does not enable ads.
    AdsWithheld,
    /// No attribution yet and the source could not be reached. Retry once
    /// connectivity returns.
    Deferred,
}

/// Runs the launch sequence for `screen`.
///
/// With a stored attribution id, the stored status decides whether the
/// collector session is started and ads are shown. Without one, attribution
/// data is fetched from `source` and persisted before the session is
/// started. The status is written before the record, so a storage failure in
/// between leaves no id behind and the next launch fetches again. Storage
/// failures are returned; network failures are not.
pub async fn run_launch<B, C, S>(
    screen: &ScreenContext<B, C>,
    source: &S,
) -> Result<LaunchOutcome, IdentityError>
where
    B: IdentityBackend,
    StorageError: From<B::Error>,
    C: AdCollector,
    S: AttributionSource + ?Sized,
{
    let reporter = screen.reporter();

    if !screen.attribution_id_string()?.is_empty() {
        if !screen.ads_enabled()? {
            tracing::info!(screen = %screen.id(), "Launch: ads withheld");
            return Ok(LaunchOutcome::AdsWithheld);
        }
        reporter.start_session().await;
        screen.show_ads().await;
        tracing::info!(screen = %screen.id(), "Launch: ads shown");
        return Ok(LaunchOutcome::AdsShown);
    }

    let data = match source.fetch_device_ad_data().await {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(
                "Launch deferred, attribution fetch failed: {}",
                err
            );
            return Ok(LaunchOutcome::Deferred);
        }
    };

    let status = data.status;
    screen.save_status(status)?;
    screen.identity().save_attribution(&data.into_record())?;
    reporter.start_session().await;

    if screen.ads_enabled()? {
        screen.show_ads().await;
        tracing::info!(screen = %screen.id(), "Launch: ads shown");
        Ok(LaunchOutcome::AdsShown)
    } else {
        tracing::info!(screen = %screen.id(), status, "Launch: ads withheld");
        Ok(LaunchOutcome::AdsWithheld)
    }
}
