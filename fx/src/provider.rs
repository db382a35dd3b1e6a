//! Upstream rate provider trait and implementations.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use exrates_common::{CurrencyCode, RateSnapshot};
use reqwest::Client;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Public endpoint of exchangerate-api.com.
pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Source of fresh rate snapshots.
///
/// Each call to [`RateProvider::fetch`] performs at most one upstream request
/// and never retries.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest rate table.
    async fn fetch(&self) -> Result<RateSnapshot, ProviderError>;
}

/// Client for the exchangerate-api.com v6 `latest` endpoint.
///
/// Base currency and API key are fixed at construction.
#[derive(Clone)]
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    base: CurrencyCode,
}

impl ExchangeRateApiProvider {
    /// Create a provider quoting against USD.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            base: CurrencyCode::usd(),
        })
    }

    /// Point the provider at a different host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base currency requested from upstream.
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    fn endpoint(&self) -> String {
        format!("{}/v6/{}/latest/{}", self.base_url, self.api_key, self.base)
    }

    fn redacted_endpoint(&self) -> String {
        format!("{}/v6/***/latest/{}", self.base_url, self.base)
    }
}

impl fmt::Debug for ExchangeRateApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRateApiProvider")
            .field("endpoint", &self.redacted_endpoint())
            .finish()
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    async fn fetch(&self) -> Result<RateSnapshot, ProviderError> {
        debug!(endpoint = %self.redacted_endpoint(), "Requesting latest rates");

        // The request URL embeds the API key, so strip it from transport errors.
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Upstream returned non-success status");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;

        parse_latest(&body, &self.base)
    }
}

/// Body of a `latest` response.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    conversion_rates: Option<OrderedRates>,
}

/// JSON object of rates, kept in document order. Values are checked later.
#[derive(Debug, Default)]
struct OrderedRates(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for OrderedRates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedRatesVisitor;

        impl<'de> Visitor<'de> for OrderedRatesVisitor {
            type Value = OrderedRates;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping currency codes to rates")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((code, rate)) = access.next_entry::<String, serde_json::Value>()? {
                    entries.push((code, rate));
                }
                Ok(OrderedRates(entries))
            }
        }

        deserializer.deserialize_map(OrderedRatesVisitor)
    }
}

/// Parse a `latest` response body into a snapshot.
///
/// `fallback_base` is used when the body omits `base_code`. Entries whose
/// code is blank or whose rate is not a positive finite number are skipped
/// with a warning; the rest of the table is kept.
pub fn parse_latest(
    body: &[u8],
    fallback_base: &CurrencyCode,
) -> Result<RateSnapshot, ProviderError> {
    let parsed: LatestResponse = serde_json::from_slice(body)?;

    match parsed.result.as_deref() {
        None | Some("success") => {}
        Some(_) => {
            let reason = parsed.error_type.unwrap_or_else(|| "unknown-error".to_string());
            warn!(reason = %reason, "Upstream reported an error");
            return Err(ProviderError::Rejected(reason));
        }
    }

    let rates = parsed
        .conversion_rates
        .ok_or_else(|| ProviderError::Parse("missing conversion_rates".to_string()))?;

    let base = match parsed.base_code {
        Some(code) => CurrencyCode::parse(code)?,
        None => fallback_base.clone(),
    };

    let entries = rates.0.into_iter().filter_map(|(code, value)| {
        match (CurrencyCode::parse(code.as_str()), value.as_f64()) {
            (Ok(parsed), Some(rate)) if rate.is_finite() && rate > 0.0 => Some((parsed, rate)),
            _ => {
                warn!(code = %code, value = %value, "Skipping unusable upstream rate");
                None
            }
        }
    });

    Ok(RateSnapshot::new(base, entries)?)
}

/// Scriptable in-memory provider for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    snapshot: parking_lot::Mutex<Option<RateSnapshot>>,
    scripted: parking_lot::Mutex<std::collections::VecDeque<Result<RateSnapshot, ProviderError>>>,
    delay: Option<Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider with nothing to serve; every fetch fails.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snapshot: parking_lot::Mutex::new(None),
            scripted: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Serve `snapshot` whenever no scripted outcome is queued.
    pub fn with_snapshot(self, snapshot: RateSnapshot) -> Self {
        self.set_snapshot(Some(snapshot));
        self
    }

    /// Sleep for `delay` inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the default snapshot; `None` makes unscripted fetches fail.
    pub fn set_snapshot(&self, snapshot: Option<RateSnapshot>) {
        *self.snapshot.lock() = snapshot;
    }

    /// Queue an outcome for the next fetch.
    pub fn push(&self, outcome: Result<RateSnapshot, ProviderError>) {
        self.scripted.lock().push_back(outcome);
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<RateSnapshot, ProviderError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self.scripted.lock().pop_front() {
            return outcome;
        }

        self.snapshot.lock().clone().ok_or(ProviderError::Status(503))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SUCCESS_BODY: &str = r#"{
        "result": "success",
        "documentation": "https://www.exchangerate-api.com/docs",
        "time_last_update_unix": 1700000000,
        "base_code": "USD",
        "conversion_rates": {"USD": 1, "JPY": 150.0, "EUR": 0.9, "AED": 3.6725}
    }"#;

    #[derive(Clone)]
    struct Upstream {
        status: StatusCode,
        body: &'static str,
        hits: Arc<AtomicUsize>,
    }

    async fn latest(
        State(upstream): State<Upstream>,
        Path((key, base)): Path<(String, String)>,
    ) -> impl IntoResponse {
        upstream.hits.fetch_add(1, Ordering::SeqCst);
        assert_eq!(key, "test-key");
        assert_eq!(base, "USD");
        (upstream.status, upstream.body)
    }

    async fn serve(status: StatusCode, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v6/{key}/latest/{base}", get(latest))
            .with_state(Upstream {
                status,
                body,
                hits: hits.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), hits)
    }

    fn provider(base_url: &str) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new("test-key")
            .unwrap()
            .with_base_url(base_url)
    }

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(matches!(
            ExchangeRateApiProvider::new("  "),
            Err(ProviderError::MissingApiKey)
        ));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let p = ExchangeRateApiProvider::new("secret-key").unwrap();
        let rendered = format!("{:?}", p);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("/v6/***/latest/USD"));
    }

    #[test]
    fn test_parse_latest_keeps_order() {
        let snapshot = parse_latest(SUCCESS_BODY.as_bytes(), &CurrencyCode::usd()).unwrap();

        let codes: Vec<&str> = snapshot.codes().iter().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["USD", "JPY", "EUR", "AED"]);
        assert_eq!(snapshot.rate("USD"), Some(1.0));
        assert_eq!(snapshot.base().as_str(), "USD");
    }

    #[test]
    fn test_parse_latest_uses_fallback_base() {
        let body = br#"{"conversion_rates": {"USD": 1.0}}"#;
        let snapshot = parse_latest(body, &CurrencyCode::usd()).unwrap();
        assert_eq!(snapshot.base(), &CurrencyCode::usd());
    }

    #[test]
    fn test_parse_latest_errors() {
        let base = CurrencyCode::usd();

        let rejected = parse_latest(br#"{"result":"error","error-type":"invalid-key"}"#, &base);
        assert!(matches!(rejected, Err(ProviderError::Rejected(ref r)) if r == "invalid-key"));

        let missing = parse_latest(br#"{"result":"success","base_code":"USD"}"#, &base);
        assert!(matches!(missing, Err(ProviderError::Parse(_))));

        let garbage = parse_latest(b"<html>oops</html>", &base);
        assert!(matches!(garbage, Err(ProviderError::Parse(_))));

        let not_a_table = parse_latest(br#"{"conversion_rates":[1, 2]}"#, &base);
        assert!(matches!(not_a_table, Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_parse_latest_skips_unusable_entries() {
        let body = br#"{"conversion_rates": {
            "USD": 1, "EUR": 0.9, "XXX": 0, "NEG": -2.5, "US D": 3.0, "": 1.0,
            "TXT": "high", "NUL": null, "JPY": 150
        }}"#;

        let snapshot = parse_latest(body, &CurrencyCode::usd()).unwrap();

        let codes: Vec<&str> = snapshot.codes().iter().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["USD", "EUR", "JPY"]);
        assert_eq!(snapshot.rate("JPY"), Some(150.0));
        assert!(!snapshot.contains("XXX"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let (url, hits) = serve(StatusCode::OK, SUCCESS_BODY).await;

        let snapshot = provider(&url).fetch().await.unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.rate("EUR"), Some(0.9));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_keeps_table_with_zero_rate_entry() {
        let body = r#"{"result":"success","base_code":"USD",
            "conversion_rates":{"USD":1,"EUR":0.9,"XXX":0}}"#;
        let (url, hits) = serve(StatusCode::OK, body).await;

        let snapshot = provider(&url).fetch().await.unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.rate("EUR"), Some(0.9));
        assert_eq!(snapshot.rate("XXX"), None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let (url, hits) = serve(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let result = provider(&url).fetch().await;

        assert!(matches!(result, Err(ProviderError::Status(500))));
        // No retry on failure
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let (url, _) = serve(StatusCode::OK, "not json").await;

        let result = provider(&url).fetch().await;

        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = provider(&format!("http://{}", addr)).fetch().await;

        match result {
            Err(ProviderError::Transport(e)) => assert!(!e.to_string().contains("test-key")),
            other => panic!("expected transport error, got {:?}", other.map(|s| s.len())),
        }
    }

    #[tokio::test]
    async fn test_mock_provider_script() {
        let snapshot = RateSnapshot::new(CurrencyCode::usd(), [("USD", 1.0)]).unwrap();
        let mock = MockRateProvider::new("mock").with_snapshot(snapshot.clone());
        mock.push(Err(ProviderError::Status(502)));

        assert!(matches!(mock.fetch().await, Err(ProviderError::Status(502))));
        assert_eq!(mock.fetch().await.unwrap(), snapshot);
        assert_eq!(mock.calls(), 2);

        mock.set_snapshot(None);
        assert!(mock.fetch().await.is_err());
    }
}
