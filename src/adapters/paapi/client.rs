//! PA-API Client - Implementation of ProductApi for Amazon's Product
//! Advertising API 5.0.
//!
//! # Configuration
//!
//! ```ignore
//! let config = PaapiClientConfig::new("store-20")
//!     .with_marketplace("www.amazon.com")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let signer = Arc::new(SigV4Signer::for_paapi(access_key, secret_key, "us-east-1"));
//! let client = PaapiClient::new(config, signer, breaker)?;
//! ```
//!
//! Every call goes through the shared circuit breaker. Item-level errors
//! (item not accessible, invalid parameter) are correct answers from a
//! healthy dependency and are recorded as breaker successes.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::catalog::{ItemId, ItemSnapshot};
use crate::ports::{
    ApiError, CircuitBreaker, CircuitBreakerError, CircuitBreakerExt, CircuitState,
    GetItemsRequest, ItemsLookup, ProductApi, RequestSigner, SearchItemsRequest, SignableRequest,
};

use super::error_map::{map_error_code, map_error_response};
use super::wire::{to_snapshots, GetItemsBody, ResponseParts, SearchItemsBody, PARTNER_TYPE};

/// Default PA-API endpoint for the US marketplace.
pub const DEFAULT_BASE_URL: &str = "https://webservices.amazon.com";

/// Default target marketplace.
pub const DEFAULT_MARKETPLACE: &str = "www.amazon.com";

/// Configuration for the PA-API client.
#[derive(Debug, Clone)]
pub struct PaapiClientConfig {
    /// Associate partner tag sent with every request.
    pub partner_tag: String,
    /// Target marketplace domain (e.g., "www.amazon.com").
    pub marketplace: String,
    /// Scheme and host of the API (default: https://webservices.amazon.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl PaapiClientConfig {
    /// Creates a new configuration for the US marketplace.
    pub fn new(partner_tag: impl Into<String>) -> Self {
        Self {
            partner_tag: partner_tag.into(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the marketplace.
    pub fn with_marketplace(mut self, marketplace: impl Into<String>) -> Self {
        self.marketplace = marketplace.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The two PA-API operations this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetItems,
    SearchItems,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetItems => "GetItems",
            Operation::SearchItems => "SearchItems",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::GetItems => "/paapi5/getitems",
            Operation::SearchItems => "/paapi5/searchitems",
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Operation::GetItems => "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems",
            Operation::SearchItems => "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.SearchItems",
        }
    }

    fn result_key(&self) -> &'static str {
        match self {
            Operation::GetItems => "ItemsResult",
            Operation::SearchItems => "SearchResult",
        }
    }
}

/// PA-API client.
pub struct PaapiClient {
    config: PaapiClientConfig,
    host: String,
    client: Client,
    signer: Arc<dyn RequestSigner>,
    breaker: Arc<dyn CircuitBreaker>,
}

impl PaapiClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the base URL has no host
    /// - `Network` if the HTTP client cannot be built
    pub fn new(
        config: PaapiClientConfig,
        signer: Arc<dyn RequestSigner>,
        breaker: Arc<dyn CircuitBreaker>,
    ) -> Result<Self, ApiError> {
        let host = host_of(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            host,
            client,
            signer,
            breaker,
        })
    }

    pub fn config(&self) -> &PaapiClientConfig {
        &self.config
    }

    /// Runs one operation under the breaker, with before/after logging.
    async fn call(&self, operation: Operation, body: Vec<u8>) -> Result<ResponseParts, ApiError> {
        tracing::debug!(
            operation = operation.name(),
            circuit_state = %self.breaker.state(),
            "PA-API request"
        );
        let started = Instant::now();

        let result = match self.breaker.execute(|| self.send(operation, body)).await {
            Ok(outcome) => outcome,
            Err(CircuitBreakerError::Open(open)) => Err(ApiError::CircuitOpen {
                retry_after_ms: open.retry_after_ms(),
            }),
            Err(CircuitBreakerError::Inner(err)) => Err(err),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(parts) => tracing::debug!(
                operation = operation.name(),
                items = parts.items.len(),
                elapsed_ms,
                circuit_state = %self.breaker.state(),
                "PA-API response"
            ),
            Err(err) => tracing::warn!(
                operation = operation.name(),
                error_code = %err.error_code(),
                error = %err,
                elapsed_ms,
                circuit_state = %self.breaker.state(),
                "PA-API request failed"
            ),
        }
        result
    }

    /// Signs and sends one request.
    ///
    /// The outer `Err` is a dependency failure and trips the breaker; the
    /// inner `Err` is an item-level answer and does not.
    async fn send(
        &self,
        operation: Operation,
        body: Vec<u8>,
    ) -> Result<Result<ResponseParts, ApiError>, ApiError> {
        let timestamp = Utc::now();
        let headers = vec![
            ("content-encoding".to_string(), "amz-1.0".to_string()),
            ("host".to_string(), self.host.clone()),
            (
                "x-amz-date".to_string(),
                timestamp.format("%Y%m%dT%H%M%SZ").to_string(),
            ),
            ("x-amz-target".to_string(), operation.target().to_string()),
        ];
        let auth = self.signer.sign(&SignableRequest {
            method: "POST",
            host: &self.host,
            path: operation.path(),
            headers: &headers,
            body: &body,
            timestamp,
        });

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            operation.path()
        );
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json; charset=utf-8");
        // Host comes from the URL.
        for (name, value) in headers.iter().chain(auth.iter()) {
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return classify(map_error_response(status.as_u16(), &text));
        }

        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::Parse(format!("Failed to parse response: {}", e)))?;
        let parts = ResponseParts::from_body(&body, operation.result_key());

        if parts.items.is_empty() {
            if let Some(first) = parts.errors.first() {
                let err = match map_error_code(&first.code, &first.message) {
                    ApiError::Upstream { code, message, .. } => ApiError::Upstream {
                        status: status.as_u16(),
                        code,
                        message,
                    },
                    mapped => mapped,
                };
                return classify(err);
            }
        }
        Ok(Ok(parts))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            ApiError::Network(format!("Connection failed: {}", e))
        } else {
            ApiError::Network(e.to_string())
        }
    }

    fn encode<T: serde::Serialize>(body: &T) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

/// Splits errors into breaker failures and item-level answers.
fn classify(err: ApiError) -> Result<Result<ResponseParts, ApiError>, ApiError> {
    if err.counts_as_breaker_failure() {
        Err(err)
    } else {
        Ok(Err(err))
    }
}

fn host_of(base_url: &str) -> Result<String, ApiError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid base url '{}': {}", base_url, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::InvalidRequest(format!("base url '{}' has no host", base_url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[async_trait]
impl ProductApi for PaapiClient {
    async fn get_items(&self, request: &GetItemsRequest) -> Result<ItemsLookup, ApiError> {
        request.validate()?;

        let body = Self::encode(&GetItemsBody {
            item_ids: request.item_ids.iter().map(ItemId::as_str).collect(),
            item_id_type: "ASIN",
            resources: &request.resources,
            partner_tag: &self.config.partner_tag,
            partner_type: PARTNER_TYPE,
            marketplace: &self.config.marketplace,
        })?;

        let parts = self.call(Operation::GetItems, body).await?;
        for err in &parts.errors {
            tracing::debug!(code = %err.code, message = %err.message, "PA-API item error");
        }

        let found = to_snapshots(parts.items)?;
        Ok(ItemsLookup::from_found(&request.item_ids, found))
    }

    async fn search_items(
        &self,
        request: &SearchItemsRequest,
    ) -> Result<Vec<ItemSnapshot>, ApiError> {
        request.validate()?;

        let body = Self::encode(&SearchItemsBody {
            keywords: request.keywords.trim(),
            search_index: request.search_index.as_deref(),
            item_count: request.item_count,
            resources: &request.resources,
            partner_tag: &self.config.partner_tag,
            partner_type: PARTNER_TYPE,
            marketplace: &self.config.marketplace,
        })?;

        match self.call(Operation::SearchItems, body).await {
            Ok(parts) => to_snapshots(parts.items),
            Err(ApiError::InvalidParameter { code, .. }) if code == "NoResults" => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }
}
