//! Boot Notes - request processing demo
//!
//! Loads configuration, then pushes one batch of keys through the guarded
//! service and one through the fixed-delay service. Keys come from the
//! command line (`-` stands for an absent key); without arguments twenty
//! generated keys and one absent key are used.

use anyhow::Context;
use bootnotes_app::{run_guarded_batch, run_programmatic_batch, AppContext};
use bootnotes_infra::{config, init_logging};
use tracing::info;

const DEFAULT_BATCH_SIZE: usize = 20;

fn keys_from_args() -> Vec<Option<String>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return (0..DEFAULT_BATCH_SIZE)
            .map(|i| Some(format!("key-{i}")))
            .chain(std::iter::once(None))
            .collect();
    }
    args.into_iter().map(|arg| (arg != "-").then_some(arg)).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialise logging")?;

    let ctx = AppContext::new(config).context("failed to build application context")?;
    let keys = keys_from_args();
    info!(requests = keys.len(), backend = %ctx.config.client.backend, "Boot Notes starting");

    let guarded = run_guarded_batch(&ctx.guarded, &keys).await;
    let programmatic = run_programmatic_batch(&ctx.programmatic, &keys).await;

    for summary in [&guarded, &programmatic] {
        let json = serde_json::to_string(summary).context("failed to serialise batch summary")?;
        info!(service = summary.service, summary = %json, "Batch summary");
    }

    info!(
        limiter = %ctx.guarded.executor().limiter().metrics(),
        "Guarded limiter after run"
    );
    Ok(())
}
