use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use workforce_core::{Employee, EmployeeDirectory, SharedNotifier};
use workforce_store_json::JsonFileStore;

use crate::{health, run_blocking, ServiceFailure, HEALTH_PATH};

pub const SERVICE_TITLE: &str = "Employee Management Service";

pub type Directory = EmployeeDirectory<JsonFileStore<Employee>, SharedNotifier>;

#[derive(Clone)]
pub struct EmployeeState {
    directory: Arc<Directory>,
}

impl EmployeeState {
    pub fn new(store: JsonFileStore<Employee>, notifier: SharedNotifier) -> Self {
        Self { directory: Arc::new(EmployeeDirectory::new(store, notifier)) }
    }
}

pub fn app(state: EmployeeState) -> Router {
    Router::new()
        .route(HEALTH_PATH, health(SERVICE_TITLE))
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .with_state(state)
}

async fn create_employee(
    State(state): State<EmployeeState>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Result<Json<Employee>, ServiceFailure> {
    let Json(employee) = payload.map_err(|rejection| ServiceFailure::invalid_json(&rejection))?;
    info!(first_name = %employee.first_name, last_name = %employee.last_name, "creating employee");
    let directory = Arc::clone(&state.directory);
    let created = run_blocking("create_employee", move || directory.create(employee)).await?;
    Ok(Json(created))
}

async fn list_employees(
    State(state): State<EmployeeState>,
) -> Result<Json<Vec<Employee>>, ServiceFailure> {
    info!("fetching all employees");
    let directory = Arc::clone(&state.directory);
    let employees = run_blocking("list_employees", move || directory.list()).await?;
    Ok(Json(employees))
}

async fn get_employee(
    State(state): State<EmployeeState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Employee>, ServiceFailure> {
    let Path(id) = id.map_err(|rejection| ServiceFailure::invalid_path(&rejection))?;
    info!(id, "fetching employee");
    let directory = Arc::clone(&state.directory);
    let employee = run_blocking("get_employee", move || directory.get(id)).await?;
    Ok(Json(employee))
}

async fn update_employee(
    State(state): State<EmployeeState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<Employee>, JsonRejection>,
) -> Result<Json<Employee>, ServiceFailure> {
    let Path(id) = id.map_err(|rejection| ServiceFailure::invalid_path(&rejection))?;
    let Json(patch) = payload.map_err(|rejection| ServiceFailure::invalid_json(&rejection))?;
    info!(id, "updating employee");
    let directory = Arc::clone(&state.directory);
    let updated = run_blocking("update_employee", move || directory.update(id, &patch)).await?;
    Ok(Json(updated))
}

async fn delete_employee(
    State(state): State<EmployeeState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, ServiceFailure> {
    let Path(id) = id.map_err(|rejection| ServiceFailure::invalid_path(&rejection))?;
    info!(id, "deleting employee");
    let directory = Arc::clone(&state.directory);
    run_blocking("delete_employee", move || directory.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{response_json, response_text, send, unique_temp_path};
    use serde_json::json;
    use std::sync::Mutex;
    use workforce_core::{EmployeeEvent, EmployeeEventKind, Notifier};

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<EmployeeEvent>>,
    }

    impl RecordingNotifier {
        fn kinds(&self) -> Vec<EmployeeEventKind> {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .iter()
                .map(|event| event.kind)
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &EmployeeEvent) {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event.clone());
        }
    }

    fn test_router(label: &str) -> (Router, Arc<RecordingNotifier>, std::path::PathBuf) {
        let path = unique_temp_path(label);
        let notifier = Arc::new(RecordingNotifier::default());
        let shared: SharedNotifier = notifier.clone();
        let state = EmployeeState::new(JsonFileStore::open(&path), shared);
        (app(state), notifier, path)
    }

    fn ana() -> serde_json::Value {
        json!({"firstName": "Ana", "lastName": "Lee", "email": "a@x.com"})
    }

    #[tokio::test]
    async fn health_endpoint_reports_service_name() {
        let (router, _, _) = test_router("health");
        let response = send(&router, "GET", "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_text(response).await, "Employee Management Service is healthy");
    }

    #[tokio::test]
    async fn empty_store_lists_no_employees() {
        let (router, _, path) = test_router("empty");
        let response = send(&router, "GET", "/api/employees", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!([]));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn create_create_delete_list_flow() {
        let (router, notifier, path) = test_router("flow");

        let first = send(&router, "POST", "/api/employees", Some(ana())).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            response_json(first).await,
            json!({"id": 1, "firstName": "Ana", "lastName": "Lee", "email": "a@x.com"})
        );

        let second = send(
            &router,
            "POST",
            "/api/employees",
            Some(json!({"id": 77, "firstName": "Bo", "lastName": "Kim", "email": "b@x.com"})),
        )
        .await;
        assert_eq!(response_json(second).await["id"], 2);

        let deleted = send(&router, "DELETE", "/api/employees/1", None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert!(response_text(deleted).await.is_empty());

        let listed = response_json(send(&router, "GET", "/api/employees", None).await).await;
        assert_eq!(
            listed,
            json!([{"id": 2, "firstName": "Bo", "lastName": "Kim", "email": "b@x.com"}])
        );
        assert_eq!(
            notifier.kinds(),
            vec![EmployeeEventKind::Created, EmployeeEventKind::Created, EmployeeEventKind::Deleted]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn get_and_update_existing_employee() {
        let (router, notifier, path) = test_router("update");
        send(&router, "POST", "/api/employees", Some(ana())).await;

        let fetched = send(&router, "GET", "/api/employees/1", None).await;
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(response_json(fetched).await["email"], "a@x.com");

        let updated = send(
            &router,
            "PUT",
            "/api/employees/1",
            Some(json!({"id": 5, "firstName": "Anna", "lastName": "Leigh", "email": "anna@x.com"})),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(
            response_json(updated).await,
            json!({"id": 1, "firstName": "Anna", "lastName": "Leigh", "email": "anna@x.com"})
        );
        assert_eq!(notifier.kinds(), vec![EmployeeEventKind::Created, EmployeeEventKind::Updated]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_employee_returns_not_found_envelope() {
        let (router, notifier, path) = test_router("missing");
        send(&router, "POST", "/api/employees", Some(ana())).await;

        let fetched = send(&router, "GET", "/api/employees/9", None).await;
        assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
        let value = response_json(fetched).await;
        assert_eq!(value["error"]["code"], "employee_not_found");
        assert_eq!(value["error"]["details"]["id"], 9);

        let updated = send(&router, "PUT", "/api/employees/9", Some(ana())).await;
        assert_eq!(updated.status(), StatusCode::NOT_FOUND);

        let deleted = send(&router, "DELETE", "/api/employees/9", None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed = response_json(send(&router, "GET", "/api/employees", None).await).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(notifier.kinds(), vec![EmployeeEventKind::Created]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn malformed_requests_return_machine_errors() {
        let (router, _, _) = test_router("malformed");

        let missing_field =
            send(&router, "POST", "/api/employees", Some(json!({"firstName": "Ana"}))).await;
        assert_eq!(missing_field.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response_json(missing_field).await["error"]["code"], "invalid_json");

        let bad_id = send(&router, "GET", "/api/employees/abc", None).await;
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(bad_id).await["error"]["code"], "invalid_path");
    }

    #[tokio::test]
    async fn corrupt_store_surfaces_storage_error() {
        let (router, notifier, path) = test_router("corrupt");
        if let Err(err) = std::fs::write(&path, b"not json") {
            panic!("failed to seed corrupt store: {err}");
        }

        let response = send(&router, "POST", "/api/employees", Some(ana())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await["error"]["code"], "storage_error");
        assert!(notifier.kinds().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn exhausted_id_space_is_reported_without_writing() {
        let (router, notifier, path) = test_router("exhausted");
        let seeded = r#"[{"id":18446744073709551615,"firstName":"Max","lastName":"Id","email":"m@x.com"}]"#;
        if let Err(err) = std::fs::write(&path, seeded) {
            panic!("failed to seed store: {err}");
        }

        let response = send(&router, "POST", "/api/employees", Some(ana())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await["error"]["code"], "id_space_exhausted");
        assert!(notifier.kinds().is_empty());
        match std::fs::read_to_string(&path) {
            Ok(contents) => assert_eq!(contents, seeded),
            Err(err) => panic!("failed to read store: {err}"),
        }

        let _ = std::fs::remove_file(&path);
    }
}
