//! Application entry point.
//!
//! Thin operational shell over `collegium-engine`: connects to the
//! store, runs migrations, executes one admin operation, and logs its
//! report as JSON. The bulk-run safeguard is the two-call protocol:
//! run `preview` first, then the approve command you meant.
//!
//! Usage: collegium-server <preview | approve-all | approve-valid | reconcile>

use std::env;

use collegium_db::repository::{SurrealMemberRepository, SurrealTransitionRequestRepository};
use collegium_db::{DbConfig, DbManager};
use collegium_engine::{BulkPolicy, BulkRunner, EngineConfig, NullNotifier, Reconciler, TransitionEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("collegium=info".parse()?),
        )
        .json()
        .init();

    let command = match env::args().nth(1) {
        Some(c) => c,
        None => {
            tracing::error!(
                "missing command: expected preview | approve-all | approve-valid | reconcile"
            );
            std::process::exit(2);
        }
    };

    let manager = DbManager::connect(&DbConfig::from_env()).await?;
    collegium_db::run_migrations(manager.client()).await?;
    let db = manager.client().clone();

    let members = SurrealMemberRepository::new(db.clone());
    let requests = SurrealTransitionRequestRepository::new(db);
    let config = EngineConfig::default();

    match command.as_str() {
        "preview" => {
            let runner = BulkRunner::new(TransitionEngine::new(
                members,
                requests,
                NullNotifier,
                config,
            ));
            let report = runner.preview().await?;
            tracing::info!(report = %serde_json::to_string(&report)?, "preview complete");
        }
        "approve-all" => {
            let runner = BulkRunner::new(TransitionEngine::new(
                members,
                requests,
                NullNotifier,
                config,
            ));
            let report = runner.run_bulk(BulkPolicy::All).await?;
            tracing::info!(report = %serde_json::to_string(&report)?, "bulk approval complete");
        }
        "approve-valid" => {
            let runner = BulkRunner::new(TransitionEngine::new(
                members,
                requests,
                NullNotifier,
                config,
            ));
            let report = runner.run_bulk(BulkPolicy::ValidOnly).await?;
            tracing::info!(report = %serde_json::to_string(&report)?, "bulk approval complete");
        }
        "reconcile" => {
            let reconciler = Reconciler::new(members, requests, config.op_timeout);
            let report = reconciler.reconcile_member_references().await?;
            tracing::info!(report = %serde_json::to_string(&report)?, "reconciliation complete");
        }
        other => {
            tracing::error!(command = %other, "unknown command");
            std::process::exit(2);
        }
    }

    Ok(())
}
