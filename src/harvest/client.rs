use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;
use reqwest::Response;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::metrics::RunMetrics;

/// Builds the `Authorization` header value for a Harvest token.
///
/// Harvest uses Basic auth with the token as user name and an
/// empty password: `Basic base64("<token>:")`.
pub fn basic_auth_header(api_token: &str) -> Result<HeaderValue, HarvestError> {
    let encoded = STANDARD.encode(format!("{api_token}:"));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|_| HarvestError::InvalidCredential)?;
    value.set_sensitive(true);
    Ok(value)
}

/// ============================================================
/// HarvestClient
/// ============================================================
///
/// Thin wrapper around `reqwest::Client` for the Harvest API.
///
/// Responsibilities:
/// - Attach auth and content-type headers to every request
/// - Resolve endpoint paths against the configured API root
/// - Turn non-2xx responses into `HarvestError::Status`
/// - Walk paginated endpoints until an empty page
///
/// Endpoint-specific calls live in the sibling modules
/// (`offers`, `candidates`, `scorecards`).
pub struct HarvestClient {
    http: reqwest::Client,
    config: HarvestConfig,
    metrics: Arc<RunMetrics>,
}

impl HarvestClient {
    pub fn new(config: HarvestConfig, metrics: Arc<RunMetrics>) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, basic_auth_header(&config.api_token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(HarvestError::Client)?;

        Ok(Self {
            http,
            config,
            metrics,
        })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Issues one GET request. The status is not checked here.
    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, HarvestError> {
        let url = self.url(path);
        RunMetrics::incr(&self.metrics.requests_sent);

        self.http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| HarvestError::Transport { url, source })
    }

    /// Fetches every page of `path` and returns the records in page order.
    ///
    /// `filters` are sent with each page next to `page`/`per_page`.
    /// The loop ends on the first empty (or `null`) page.
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &[(&str, String)],
        label: &str,
    ) -> Result<Vec<T>, HarvestError> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            info!("Fetching {label} page {page}");

            let mut query = vec![
                ("page", page.to_string()),
                ("per_page", self.config.page_size.to_string()),
            ];
            query.extend(filters.iter().map(|(k, v)| (*k, v.clone())));

            let response = self.get(path, &query).await?;
            let batch: Option<Vec<T>> = read_json(response).await?;

            let batch = batch.unwrap_or_default();
            if batch.is_empty() {
                break;
            }

            RunMetrics::incr(&self.metrics.pages_fetched);
            records.extend(batch);
            page += 1;
        }

        Ok(records)
    }
}

/// Checks the status and decodes a JSON body.
///
/// Non-2xx responses become `HarvestError::Status` carrying the
/// response body for diagnostics.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, HarvestError> {
    let status = response.status();
    let url = response.url().to_string();

    let body = response
        .text()
        .await
        .map_err(|source| HarvestError::Transport {
            url: url.clone(),
            source,
        })?;

    if !status.is_success() {
        return Err(HarvestError::Status { url, status, body });
    }

    serde_json::from_str(&body).map_err(|source| HarvestError::Decode { url, source })
}
