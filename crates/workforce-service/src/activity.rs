use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use workforce_core::{Activity, RecordLog};
use workforce_store_json::JsonFileStore;

use crate::{health, run_blocking, ServiceFailure, HEALTH_PATH};

pub const SERVICE_TITLE: &str = "Activity Service";

#[derive(Clone)]
pub struct ActivityState {
    log: Arc<RecordLog<JsonFileStore<Activity>>>,
}

impl ActivityState {
    pub fn new(store: JsonFileStore<Activity>) -> Self {
        Self { log: Arc::new(RecordLog::new(store)) }
    }
}

pub fn app(state: ActivityState) -> Router {
    Router::new()
        .route(HEALTH_PATH, health(SERVICE_TITLE))
        .route("/api/activities", get(list_activities).post(record_activity))
        .with_state(state)
}

async fn record_activity(
    State(state): State<ActivityState>,
    payload: Result<Json<Activity>, JsonRejection>,
) -> Result<StatusCode, ServiceFailure> {
    let Json(activity) = payload.map_err(|rejection| ServiceFailure::invalid_json(&rejection))?;
    info!(kind = %activity.kind, service = %activity.service, "recording activity");
    let log = Arc::clone(&state.log);
    run_blocking("record_activity", move || log.append(activity)).await?;
    Ok(StatusCode::OK)
}

async fn list_activities(
    State(state): State<ActivityState>,
) -> Result<Json<Vec<Activity>>, ServiceFailure> {
    info!("fetching all activities");
    let log = Arc::clone(&state.log);
    let activities = run_blocking("list_activities", move || log.list()).await?;
    Ok(Json(activities))
}
