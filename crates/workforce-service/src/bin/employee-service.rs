use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use workforce_core::SharedNotifier;
use workforce_notify::HttpNotifier;
use workforce_service::config::EmployeeArgs;
use workforce_service::employee::{app, EmployeeState};
use workforce_service::{init_tracing, shutdown_signal};
use workforce_store_json::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = EmployeeArgs::parse();
    init_tracing(&args.log_level);

    let notifier: SharedNotifier = Arc::new(HttpNotifier::new(args.notifier_config()));
    let state = EmployeeState::new(JsonFileStore::open(&args.data_file), notifier);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(
        bind = %args.bind,
        data_file = %args.data_file.display(),
        notification_url = %args.notification_url,
        activity_url = %args.activity_url,
        "employee service listening"
    );
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
