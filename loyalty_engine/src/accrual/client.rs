use std::{sync::Arc, time::Duration};

use log::*;
use loyalty_common::Points;
use reqwest::{header::RETRY_AFTER, Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    accrual::{AccrualResponse, AccrualService, AccrualStatus},
    db_types::OrderNumber,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Error)]
pub enum AccrualClientError {
    #[error("Invalid accrual service address: {0}")]
    InvalidUrl(String),
    #[error("Could not initialize the HTTP client: {0}")]
    Initialization(String),
}

#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    /// The root address of the accrual service, e.g. `http://localhost:8081`
    pub base_url: String,
    pub timeout: Duration,
}

impl AccrualClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into(), timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone)]
pub struct AccrualClient {
    base_url: Url,
    client: Arc<Client>,
}

/// The body of a `200` response.
#[derive(Debug, Deserialize)]
struct AccrualBody {
    order: String,
    status: AccrualStatus,
    #[serde(default)]
    accrual: Option<f64>,
}

impl AccrualClient {
    pub fn new(config: AccrualClientConfig) -> Result<Self, AccrualClientError> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base).map_err(|e| AccrualClientError::InvalidUrl(format!("{base}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AccrualClientError::InvalidUrl(base.to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualClientError::Initialization(e.to_string()))?;
        Ok(Self { base_url, client: Arc::new(client) })
    }

    pub fn url_for(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{number}", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl AccrualService for AccrualClient {
    async fn query(&self, number: &OrderNumber) -> AccrualResponse {
        let url = self.url_for(number);
        trace!("📡️ Querying accrual status: {url}");
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("📡️ Accrual service request for {number} failed. {e}");
                return AccrualResponse::Unavailable(e.to_string());
            },
        };
        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()).map(str::to_string);
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                debug!("📡️ Could not read the accrual service response for {number}. {e}");
                return AccrualResponse::Unavailable(e.to_string());
            },
        };
        let result = interpret_response(number, status, retry_after.as_deref(), &body);
        trace!("📡️ Accrual service replied {status} for {number}: {result:?}");
        result
    }
}

/// Turns the raw parts of an accrual service reply into an [`AccrualResponse`].
pub fn interpret_response(
    number: &OrderNumber,
    status: StatusCode,
    retry_after: Option<&str>,
    body: &[u8],
) -> AccrualResponse {
    match status {
        StatusCode::OK => decode_body(number, body),
        StatusCode::NO_CONTENT => AccrualResponse::Unknown,
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after.and_then(|v| v.trim().parse::<u64>().ok());
            AccrualResponse::RateLimited { retry_after }
        },
        other => AccrualResponse::Unavailable(format!("Unexpected status code {other}")),
    }
}

fn decode_body(number: &OrderNumber, body: &[u8]) -> AccrualResponse {
    let body = match serde_json::from_slice::<AccrualBody>(body) {
        Ok(b) => b,
        Err(e) => return AccrualResponse::Unavailable(format!("Malformed response body. {e}")),
    };
    if body.order != number.as_str() {
        warn!("📡️ Asked the accrual service about order {number}, but it replied about order {}", body.order);
        return AccrualResponse::Unavailable(format!("Response is for order {}, not {number}", body.order));
    }
    let accrual = match body.accrual.map(Points::try_from_f64).transpose() {
        Ok(a) => a.unwrap_or_default(),
        Err(e) => return AccrualResponse::Unavailable(format!("Invalid accrual. {e}")),
    };
    AccrualResponse::Resolved { status: body.status, accrual }
}
