//! HTTP surface for the employee, notification and activity services.
//!
//! Each service module exposes an `app(state)` router. Handlers hand the
//! synchronous store and notifier work to [`run_blocking`] so the runtime's
//! worker threads never wait on file or outbound I/O.

pub mod activity;
pub mod config;
pub mod employee;
pub mod notification;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;
use workforce_core::WorkforceError;

pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    error: ServiceErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceErrorPayload {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Error response carried back to the HTTP caller as a JSON envelope.
#[derive(Debug, Clone)]
pub struct ServiceFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ServiceFailure {
    fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self { status, code, message: message.into(), details }
    }

    pub(crate) fn invalid_json(rejection: &JsonRejection) -> Self {
        Self::new(
            rejection.status(),
            "invalid_json",
            rejection.body_text(),
            Some(json!({ "rejection": rejection.to_string() })),
        )
    }

    pub(crate) fn invalid_path(rejection: &PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_path", rejection.body_text(), None)
    }

    fn from_workforce(err: &WorkforceError) -> Self {
        match err {
            WorkforceError::EmployeeNotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "employee_not_found",
                err.to_string(),
                Some(json!({ "id": id })),
            ),
            WorkforceError::Storage(_) => {
                error!(error = %err, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string(), None)
            }
            WorkforceError::IdSpaceExhausted => {
                error!(error = %err, "cannot assign employee id");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "id_space_exhausted", err.to_string(), None)
            }
            WorkforceError::Timestamp(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string(), None)
            }
        }
    }
}

impl IntoResponse for ServiceFailure {
    fn into_response(self) -> Response {
        let payload = ServiceError {
            error: ServiceErrorPayload {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(payload)).into_response()
    }
}

/// Runs `op` on the blocking pool and maps its outcome onto a
/// [`ServiceFailure`].
///
/// # Errors
/// Returns the mapped [`WorkforceError`], or `internal_error` when the
/// blocking task itself failed.
pub async fn run_blocking<T, F>(operation_label: &'static str, op: F) -> Result<T, ServiceFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, WorkforceError> + Send + 'static,
{
    let op_result = tokio::task::spawn_blocking(op).await.map_err(|err| {
        error!(operation = operation_label, error = %err, "blocking task failed");
        ServiceFailure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            format!("{operation_label} join failure: {err}"),
            None,
        )
    })?;
    op_result.map_err(|err| ServiceFailure::from_workforce(&err))
}

/// `GET /api/health` handler answering with `"<service title> is healthy"`.
pub(crate) fn health<S>(service_title: &'static str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    get(move || async move { format!("{service_title} is healthy") })
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
