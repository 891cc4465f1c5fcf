//! Concurrent request batches
//!
//! Every key is submitted at once; the services' own limiters decide how
//! many run at the same time.

use std::collections::BTreeMap;
use std::time::Duration;

use bootnotes_core::{GuardedRequestService, ProgrammaticRequestService, TransportStatus};
use bootnotes_domain::ApiResponse;
use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

/// Result of one request in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestReport {
    pub key: Option<String>,
    pub status: TransportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestReport {
    fn new(key: Option<String>, result: Result<ApiResponse, TransportStatus>) -> Self {
        match result {
            Ok(response) => Self { key, status: TransportStatus::OK, body: Some(response.body) },
            Err(status) => Self { key, status, body: None },
        }
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub service: &'static str,
    pub reports: Vec<RequestReport>,
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(millis(*duration))
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    /// Number of requests per HTTP status code
    pub fn status_counts(&self) -> BTreeMap<u16, usize> {
        let mut counts = BTreeMap::new();
        for report in &self.reports {
            *counts.entry(report.status.http).or_insert(0) += 1;
        }
        counts
    }

    fn log(&self) {
        info!(
            service = self.service,
            requests = self.reports.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            elapsed_ms = millis(self.elapsed),
            statuses = ?self.status_counts(),
            "Batch finished"
        );
    }
}

/// Submit every key to the guarded service concurrently
pub async fn run_guarded_batch(
    service: &GuardedRequestService,
    keys: &[Option<String>],
) -> BatchSummary {
    let started = Instant::now();
    let reports = join_all(keys.iter().map(|key| async move {
        RequestReport::new(key.clone(), service.process_request_status(key.as_deref()).await)
    }))
    .await;

    let summary = BatchSummary { service: "guarded", reports, elapsed: started.elapsed() };
    summary.log();
    summary
}

/// Submit every key to the fixed-delay service concurrently
pub async fn run_programmatic_batch(
    service: &ProgrammaticRequestService,
    keys: &[Option<String>],
) -> BatchSummary {
    let started = Instant::now();
    let reports = join_all(keys.iter().map(|key| async move {
        RequestReport::new(key.clone(), service.process_request_status(key.as_deref()).await)
    }))
    .await;

    let summary = BatchSummary { service: "programmatic", reports, elapsed: started.elapsed() };
    summary.log();
    summary
}
