//! # relaylogic: rule compiler
//!
//! Composition root that wires the adapters to the application services.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Construct the JSON fact source and the program directory sink
//! - Run one load → compile → write pass and report failing devices
//! - When a dry-run device is configured, replay its input events over HTTP
//!
//! ## Dependency rule
//! This is the **only** crate that depends on adapter crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use relaylogic_adapter_facts_json::{DirectoryProgramSink, JsonFactSource};
use relaylogic_adapter_rpc_http::HttpRpcTransport;
use relaylogic_app::ports::SystemClock;
use relaylogic_app::services::compile_service::CompileService;
use relaylogic_app::services::dry_run_service::DryRunService;
use relaylogic_domain::event::ReplayStep;
use tracing_subscriber::EnvFilter;

/// Some devices could not be compiled; the others were written.
#[derive(Debug, thiserror::Error)]
#[error("{0} device(s) failed to compile")]
struct CompileFailed(usize);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let facts = JsonFactSource::new(&config.facts.devices, &config.facts.rules);
    let sink = DirectoryProgramSink::new(&config.output.dir);
    let service = CompileService::new(facts.clone(), sink, config.compile.clone());

    let report = service.run().await?;
    for failure in &report.failures {
        tracing::error!(device = %failure.device, error = %failure.error, "device not compiled");
    }
    tracing::info!(
        programs = report.programs.len(),
        dir = %config.output.dir.display(),
        "programs written"
    );

    if let Some(device) = &config.dry_run.device {
        let raw = tokio::fs::read(&config.dry_run.events).await?;
        let steps: Vec<ReplayStep> = serde_json::from_slice(&raw)?;
        let transport = HttpRpcTransport::new(config.compile.dispatch.call_timeout())?;
        let dry_run = DryRunService::new(facts, Arc::new(transport), SystemClock, config.compile);
        let stats = dry_run.run(device, steps).await?;
        tracing::info!(
            %device,
            dispatched = stats.dispatched,
            succeeded = stats.succeeded,
            failed = stats.failed,
            rejected = stats.rejected,
            "dry run finished"
        );
    }

    if !report.is_success() {
        return Err(CompileFailed(report.failures.len()).into());
    }
    Ok(())
}
