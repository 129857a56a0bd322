// HTTP client for the external analysis service

use crate::config::ApiConfig;
use crate::types::{BacktestRequest, BacktestResult, Discovery};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DISCOVERY_PATH: &str = "discovery/";
pub const BACKTEST_RUN_PATH: &str = "backtest/run/";

const MAX_DETAIL_LEN: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Transient failures a caller may try again. Nothing here retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /discovery/`: strategies, symbols, timeframes and scenarios.
    pub async fn discovery(&self) -> Result<Discovery, ApiError> {
        let url = self.endpoint(DISCOVERY_PATH);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::decode(response).await
    }

    /// `POST /backtest/run/`. The request is validated locally first.
    pub async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult, ApiError> {
        request.validate().map_err(ApiError::InvalidRequest)?;

        let url = self.endpoint(BACKTEST_RUN_PATH);
        debug!(
            "POST {} ({} {} {})",
            url, request.strategy_name, request.symbol, request.timeframe
        );

        let response = self.client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ApiError::from_transport)?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!("Service returned {}: {}", status.as_u16(), detail);
            return Err(ApiError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Pull the `detail` message out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    let detail = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(msg)) => msg.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    };

    let detail = detail.trim();
    if detail.is_empty() {
        return "no response body".to_string();
    }
    if detail.chars().count() > MAX_DETAIL_LEN {
        let truncated: String = detail.chars().take(MAX_DETAIL_LEN).collect();
        return format!("{}...", truncated);
    }
    detail.to_string()
}
