//! In-process API client for demos and local runs
//!
//! Answers every key with `Body for key: {key}` (`null` when absent) after an
//! optional latency, so the request services can be exercised without an
//! upstream server.

use std::time::Duration;

use async_trait::async_trait;
use bootnotes_core::{ApiClient, ApiClientError};
use bootnotes_domain::ApiResponse;

#[derive(Debug, Clone, Default)]
pub struct EchoApiClient {
    latency: Duration,
}

impl EchoApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl ApiClient for EchoApiClient {
    async fn get_response(&self, key: Option<&str>) -> Result<ApiResponse, ApiClientError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(ApiResponse::new(format!("Body for key: {}", key.unwrap_or("null"))))
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn echoes_key_after_latency() {
        let client = EchoApiClient::with_latency(Duration::from_millis(50));
        let start = Instant::now();

        let response = client.get_response(Some("abc")).await.unwrap();

        assert_eq!(response.body, "Body for key: abc");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn absent_key_is_null() {
        let response = EchoApiClient::new().get_response(None).await.unwrap();
        assert_eq!(response.body, "Body for key: null");
    }
}
