//! Application context - dependency injection container

use std::sync::Arc;

use bootnotes_core::{ApiClient, GuardedRequestService, ProgrammaticRequestService};
use bootnotes_domain::{BootNotesError, Config, Result};
use bootnotes_infra::{build_client, build_guarded_service};
use tracing::info;

/// Application context - holds the configuration and both request services
pub struct AppContext {
    pub config: Config,
    pub client: Arc<dyn ApiClient>,
    pub guarded: GuardedRequestService,
    pub programmatic: ProgrammaticRequestService,
}

impl AppContext {
    /// Build the context with the client selected by `config.client`
    ///
    /// # Errors
    /// Returns `BootNotesError::Config` if the client or either service
    /// cannot be built from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = build_client(&config.client)?;
        Self::with_client(config, client)
    }

    /// Build the context around an existing client (tests, embedding)
    ///
    /// # Errors
    /// Returns `BootNotesError::Config` if either service cannot be built.
    pub fn with_client(config: Config, client: Arc<dyn ApiClient>) -> Result<Self> {
        let guarded = build_guarded_service(&config.resilience, client.clone())?;
        let programmatic = ProgrammaticRequestService::new(client.clone())
            .map_err(|e| BootNotesError::Config(e.to_string()))?;

        info!(
            concurrency_limit = guarded.executor().limiter().limit(),
            max_attempts = guarded.executor().policy().max_attempts(),
            "Application context initialized"
        );

        Ok(Self { config, client, guarded, programmatic })
    }
}
