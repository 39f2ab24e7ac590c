use meshcore::payload::TelemetryPayload;
use meshcore::prelude::FetchFuture;
use meshcore::{FetchQuery, TelemetryError, TelemetrySource};
use std::sync::{Arc, PoisonError, RwLock};

/// Fetch collaborator speaking HTTP to the telemetry service.
///
/// The base URL can be swapped at runtime; clones share it.
#[derive(Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    base_url: Arc<RwLock<Option<String>>>,
}

fn normalize(url: Option<String>) -> Option<String> {
    url.map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
}

impl HttpTelemetrySource {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::new(RwLock::new(normalize(base_url))),
        }
    }

    /// Replaces the endpoint; returns whether the source is now configured.
    pub fn set_base_url(&self, base_url: Option<String>) -> bool {
        let mut current = self
            .base_url
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = normalize(base_url);
        current.is_some()
    }

    pub fn telemetry_url(&self) -> Option<String> {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|base| format!("{base}/api/telemetry"))
    }
}

impl TelemetrySource for HttpTelemetrySource {
    fn is_configured(&self) -> bool {
        self.telemetry_url().is_some()
    }

    fn fetch(&self, query: FetchQuery) -> FetchFuture {
        let client = self.client.clone();
        let url = self.telemetry_url();
        Box::pin(async move {
            let url = url.ok_or(TelemetryError::NotConfigured)?;
            let response = client
                .get(&url)
                .query(&[("hours", query.hours), ("limit", query.limit)])
                .send()
                .await
                .map_err(|err| TelemetryError::Transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TelemetryError::Http {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            }

            response
                .json::<TelemetryPayload>()
                .await
                .map_err(|err| TelemetryError::Decode(err.to_string()))
        })
    }
}
