use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use workforce_core::{Notification, RecordLog};
use workforce_store_json::JsonFileStore;

use crate::{health, run_blocking, ServiceFailure, HEALTH_PATH};

pub const SERVICE_TITLE: &str = "Notification Service";

#[derive(Clone)]
pub struct NotificationState {
    log: Arc<RecordLog<JsonFileStore<Notification>>>,
}

impl NotificationState {
    pub fn new(store: JsonFileStore<Notification>) -> Self {
        Self { log: Arc::new(RecordLog::new(store)) }
    }
}

pub fn app(state: NotificationState) -> Router {
    Router::new()
        .route(HEALTH_PATH, health(SERVICE_TITLE))
        .route("/api/notifications", get(list_notifications).post(receive_notification))
        .with_state(state)
}

async fn receive_notification(
    State(state): State<NotificationState>,
    payload: Result<Json<Notification>, JsonRejection>,
) -> Result<StatusCode, ServiceFailure> {
    let Json(notification) =
        payload.map_err(|rejection| ServiceFailure::invalid_json(&rejection))?;
    info!(
        message = %notification.message,
        employee_id = notification.employee_id,
        "notification received"
    );
    let log = Arc::clone(&state.log);
    run_blocking("receive_notification", move || log.append(notification)).await?;
    Ok(StatusCode::OK)
}

async fn list_notifications(
    State(state): State<NotificationState>,
) -> Result<Json<Vec<Notification>>, ServiceFailure> {
    info!("fetching all notifications");
    let log = Arc::clone(&state.log);
    let notifications = run_blocking("list_notifications", move || log.list()).await?;
    Ok(Json(notifications))
}
