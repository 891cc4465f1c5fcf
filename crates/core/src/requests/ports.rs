//! Port interfaces for outbound API access
//!
//! Implemented by adapters in `bootnotes-infra`.

use async_trait::async_trait;
use bootnotes_domain::ApiResponse;

use super::error::ApiClientError;

/// Trait for fetching a response body from the upstream API
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetch the response for `key`; `None` is forwarded as an absent key
    async fn get_response(&self, key: Option<&str>) -> Result<ApiResponse, ApiClientError>;
}
