use anyhow::Result;
use clap::Parser;
use tracing::info;
use workforce_service::config::NotificationArgs;
use workforce_service::notification::{app, NotificationState};
use workforce_service::{init_tracing, shutdown_signal};
use workforce_store_json::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = NotificationArgs::parse();
    init_tracing(&args.log_level);

    let state = NotificationState::new(JsonFileStore::open(&args.data_file));
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(bind = %args.bind, data_file = %args.data_file.display(), "notification service listening");
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
