use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::records::RawRecord;
use super::retry::RetryPolicy;
use super::throttle::RateGate;

pub const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("record source request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("record source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid record source url: {0}")]
    Url(String),
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

/// One page of a collection plus the cursor for the next one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub offset: Option<String>,
}

/// Read-only, page-at-a-time access to named record collections.
///
/// Implementations issue exactly one request per call; [`RecordFetcher`]
/// drives pagination and admits every call through the shared [`RateGate`].
pub trait RecordSource: Debug + Send + Sync {
    fn fetch_page(
        &self,
        collection: &str,
        view: &str,
        offset: Option<&str>,
    ) -> Result<RecordPage, SourceError>;
}

/// Blocking Airtable REST client.
#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    api_url: String,
    api_key: String,
    base_id: String,
}

impl AirtableClient {
    pub fn new(api_key: impl Into<String>, base_id: impl Into<String>) -> Result<Self, SourceError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            api_url: AIRTABLE_API_URL.to_string(),
            api_key: api_key.into(),
            base_id: base_id.into(),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub(crate) fn collection_url(&self, collection: &str) -> Result<Url, SourceError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|err| SourceError::Url(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Url(format!("{} cannot be a base url", self.api_url)))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(collection);
        Ok(url)
    }
}

impl Debug for AirtableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableClient")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .finish_non_exhaustive()
    }
}

impl RecordSource for AirtableClient {
    fn fetch_page(
        &self,
        collection: &str,
        view: &str,
        offset: Option<&str>,
    ) -> Result<RecordPage, SourceError> {
        let mut request = self
            .http
            .get(self.collection_url(collection)?)
            .bearer_auth(&self.api_key)
            .query(&[("view", view)]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<RecordPage>()?)
    }
}

/// Retrying, throttled front door to a [`RecordSource`].
#[derive(Debug, Clone)]
pub struct RecordFetcher {
    source: Arc<dyn RecordSource>,
    gate: Arc<RateGate>,
    retry: RetryPolicy,
}

impl RecordFetcher {
    pub fn new(source: Arc<dyn RecordSource>, gate: Arc<RateGate>, retry: RetryPolicy) -> Self {
        Self {
            source,
            gate,
            retry,
        }
    }

    /// Returns `None` once every attempt failed; callers treat that as no data.
    pub fn fetch(&self, collection: &str, view: &str) -> Option<Vec<RawRecord>> {
        let label = format!("fetch {collection}");
        match self.retry.run(&label, |_| self.fetch_all(collection, view)) {
            Ok(records) => {
                info!(collection, view, records = records.len(), "records retrieved");
                Some(records)
            }
            Err(exhausted) => {
                error!(
                    collection,
                    view,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "failed to retrieve records; continuing with no data"
                );
                None
            }
        }
    }

    /// Follows `offset` until the source stops returning one.
    fn fetch_all(&self, collection: &str, view: &str) -> Result<Vec<RawRecord>, SourceError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self
                .gate
                .throttle(|| self.source.fetch_page(collection, view, offset.as_deref()))?;
            debug!(collection, view, page_len = page.records.len(), "fetched record page");
            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::coaching::throttle::tests::ManualClock;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedSource {
        failures_before_success: Mutex<u32>,
        pages: u32,
        calls: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(failures_before_success: u32) -> Self {
            Self::paged(failures_before_success, 1)
        }

        fn paged(failures_before_success: u32, pages: u32) -> Self {
            Self {
                failures_before_success: Mutex::new(failures_before_success),
                pages,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().expect("calls mutex poisoned")
        }
    }

    impl RecordSource for ScriptedSource {
        fn fetch_page(
            &self,
            collection: &str,
            _view: &str,
            offset: Option<&str>,
        ) -> Result<RecordPage, SourceError> {
            *self.calls.lock().expect("calls mutex poisoned") += 1;
            let mut remaining = self
                .failures_before_success
                .lock()
                .expect("failures mutex poisoned");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SourceError::Unavailable("timeout".to_string()));
            }

            let page: u32 = offset.map_or(0, |cursor| cursor.parse().expect("numeric cursor"));
            let next = page + 1;
            Ok(RecordPage {
                records: vec![RawRecord::new(
                    format!("{collection}-{page}"),
                    json!({ "Worker": "Ana" }),
                )],
                offset: (next < self.pages).then(|| next.to_string()),
            })
        }
    }

    fn fetcher(source: Arc<ScriptedSource>, clock: Arc<ManualClock>) -> RecordFetcher {
        let gate = Arc::new(RateGate::with_clock(5, Duration::from_secs(1), clock));
        RecordFetcher::new(source, gate, RetryPolicy::record_fetch().without_delay())
    }

    #[test]
    fn retries_transient_failures() {
        let source = Arc::new(ScriptedSource::new(2));
        let records = fetcher(source.clone(), Arc::new(ManualClock::new()))
            .fetch("Workers", "Active Workers")
            .expect("third attempt succeeds");
        assert_eq!(records.len(), 1);
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn returns_none_after_three_failures() {
        let source = Arc::new(ScriptedSource::new(10));
        let result = fetcher(source.clone(), Arc::new(ManualClock::new())).fetch("Workers", "Active Workers");
        assert!(result.is_none());
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn every_attempt_passes_through_the_shared_gate() {
        let clock = Arc::new(ManualClock::new());
        let source = Arc::new(ScriptedSource::new(0));
        let fetcher = fetcher(source.clone(), clock.clone());
        for _ in 0..6 {
            fetcher.fetch("Workers", "Active Workers");
        }
        assert_eq!(source.calls(), 6);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn follows_offsets_and_admits_each_page() {
        let clock = Arc::new(ManualClock::new());
        let source = Arc::new(ScriptedSource::paged(0, 7));
        let records = fetcher(source.clone(), clock.clone())
            .fetch("Workers", "Active Workers")
            .expect("all pages fetched");

        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"Workers-0"));
        assert_eq!(ids.last(), Some(&"Workers-6"));
        assert_eq!(source.calls(), 7);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = AirtableClient::new("patSecretKey", "appBase").expect("client builds");
        let rendered = format!("{client:?}");
        assert!(rendered.contains("appBase"));
        assert!(!rendered.contains("patSecretKey"));
    }

    #[test]
    fn collection_url_encodes_table_names() {
        let client = AirtableClient::new("key", "appBase")
            .expect("client builds")
            .with_api_url("https://airtable.test/v0/");
        let url = client
            .collection_url("Coaching Logs")
            .expect("url builds");
        assert_eq!(url.as_str(), "https://airtable.test/v0/appBase/Coaching%20Logs");
    }
}
