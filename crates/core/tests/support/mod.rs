//! Shared test helpers for `bootnotes-core` integration tests.
//!
//! Provides a scripted `ApiClient` mock so service tests can focus on retry
//! and admission behaviour instead of boilerplate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bootnotes_core::{ApiClient, ApiClientError};
use bootnotes_domain::ApiResponse;

/// In-memory `ApiClient` replaying scripted failures before echoing keys.
///
/// Every call pops the next scripted error; once the script is empty the
/// client answers `"Body for key: {key}"`. Calls sleep for `latency` first
/// and track how many are in progress at once.
#[derive(Default)]
pub struct ScriptedApiClient {
    script: Mutex<VecDeque<ApiClientError>>,
    keys: Mutex<Vec<Option<String>>>,
    latency: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next calls with `errors`, in order.
    pub fn with_script(self, errors: impl IntoIterator<Item = ApiClientError>) -> Self {
        self.script.lock().unwrap().extend(errors);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Keys received so far, one entry per call
    pub fn keys(&self) -> Vec<Option<String>> {
        self.keys.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    /// Highest number of concurrent calls observed
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiClient for ScriptedApiClient {
    async fn get_response(&self, key: Option<&str>) -> Result<ApiResponse, ApiClientError> {
        self.keys.lock().unwrap().push(key.map(str::to_string));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(error) => Err(error),
            None => Ok(ApiResponse::new(format!("Body for key: {}", key.unwrap_or("null")))),
        }
    }
}
