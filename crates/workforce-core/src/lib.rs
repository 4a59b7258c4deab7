//! Domain records and CRUD operations shared by the workforce services.
//!
//! Each service owns one [`RecordStore`] holding its whole collection. The
//! employee service drives it through [`EmployeeDirectory`], which also fires
//! best-effort [`Notifier`] calls after every successful mutation. The
//! notification and activity services only append and list, via [`RecordLog`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};

/// Name the employee service reports as the origin of its activities.
pub const EMPLOYEE_SERVICE_NAME: &str = "employee-management-service";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode records for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum WorkforceError {
    #[error("employee {0} not found")]
    EmployeeNotFound(u64),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("timestamp error: {0}")]
    Timestamp(String),
    #[error("employee id space exhausted")]
    IdSpaceExhausted,
}

impl WorkforceError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EmployeeNotFound(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Employee {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Copies the mutable fields from `patch`. The id is left untouched.
    pub fn apply_update(&mut self, patch: &Employee) {
        self.first_name.clone_from(&patch.first_name);
        self.last_name.clone_from(&patch.last_name);
        self.email.clone_from(&patch.email);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    #[serde(default)]
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub timestamp: String,
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: Value,
}

/// Whole-collection persistence for one kind of record.
///
/// Implementations read and write the full collection on every call; there is
/// no partial access.
pub trait RecordStore {
    type Record;

    /// Returns the stored collection, or an empty one when nothing was ever
    /// written.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backing data exists but cannot be read
    /// or decoded.
    fn load(&self) -> Result<Vec<Self::Record>, StoreError>;

    /// Replaces the stored collection with `records`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any encoding or I/O failure.
    fn save(&self, records: &[Self::Record]) -> Result<(), StoreError>;

    /// Runs one load-mutate-save cycle. When `mutate` fails nothing is
    /// written; otherwise the collection is saved even if it did not change.
    ///
    /// # Errors
    /// Returns the error from `mutate`, or a [`StoreError`] converted into `E`.
    fn modify<R, E, F>(&self, mutate: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Vec<Self::Record>) -> Result<R, E>,
    {
        let mut records = self.load()?;
        let outcome = mutate(&mut records)?;
        self.save(&records)?;
        Ok(outcome)
    }
}

/// Best-effort delivery of employee events to sibling services.
///
/// Delivery never reports failure to the caller; implementations log and
/// move on.
pub trait Notifier {
    fn notify(&self, event: &EmployeeEvent);
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, event: &EmployeeEvent) {
        (**self).notify(event);
    }
}

pub type SharedNotifier = Arc<dyn Notifier + Send + Sync>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EmployeeEventKind {
    Created,
    Updated,
    Deleted,
}

impl EmployeeEventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Employee Created",
            Self::Updated => "Employee Updated",
            Self::Deleted => "Employee Deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeEvent {
    pub kind: EmployeeEventKind,
    pub employee_id: u64,
    pub details: Value,
}

impl EmployeeEvent {
    fn with_record(kind: EmployeeEventKind, employee: &Employee) -> Self {
        Self {
            kind,
            employee_id: employee.id.unwrap_or_default(),
            details: serde_json::to_value(employee).unwrap_or(Value::Null),
        }
    }

    #[must_use]
    pub fn created(employee: &Employee) -> Self {
        Self::with_record(EmployeeEventKind::Created, employee)
    }

    #[must_use]
    pub fn updated(employee: &Employee) -> Self {
        Self::with_record(EmployeeEventKind::Updated, employee)
    }

    #[must_use]
    pub fn deleted(employee_id: u64) -> Self {
        Self {
            kind: EmployeeEventKind::Deleted,
            employee_id,
            details: Value::from(employee_id),
        }
    }

    #[must_use]
    pub fn notification(&self) -> Notification {
        Notification {
            message: self.kind.as_str().to_string(),
            employee_id: Some(self.employee_id),
        }
    }

    /// Builds the activity entry describing this event.
    ///
    /// # Errors
    /// Returns [`WorkforceError::Timestamp`] when `at` cannot be rendered as
    /// RFC 3339.
    pub fn activity(&self, service: &str, at: OffsetDateTime) -> Result<Activity, WorkforceError> {
        Ok(Activity {
            timestamp: format_rfc3339(at)?,
            service: service.to_string(),
            kind: self.kind.as_str().to_string(),
            details: self.details.clone(),
        })
    }
}

/// Next identifier for a new employee: one past the largest id on record.
/// Records without an id count as zero.
///
/// # Errors
/// Returns [`WorkforceError::IdSpaceExhausted`] when the largest id is
/// already `u64::MAX`.
pub fn next_employee_id(employees: &[Employee]) -> Result<u64, WorkforceError> {
    employees
        .iter()
        .filter_map(|employee| employee.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(WorkforceError::IdSpaceExhausted)
}

/// # Errors
/// Returns [`WorkforceError::Timestamp`] if formatting fails.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, WorkforceError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|err| WorkforceError::Timestamp(format!("failed to format RFC3339 timestamp: {err}")))
}

#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}

/// CRUD over the employee collection, with side-channel notification.
pub struct EmployeeDirectory<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> EmployeeDirectory<S, N>
where
    S: RecordStore<Record = Employee>,
    N: Notifier,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores `employee` under a freshly assigned id, replacing any id the
    /// caller supplied.
    ///
    /// # Errors
    /// Returns [`WorkforceError::Storage`] when the collection cannot be
    /// loaded or saved, and [`WorkforceError::IdSpaceExhausted`] when no
    /// larger id is left.
    pub fn create(&self, mut employee: Employee) -> Result<Employee, WorkforceError> {
        let stored = self.store.modify(|employees| {
            employee.id = Some(next_employee_id(employees)?);
            employees.push(employee.clone());
            Ok::<_, WorkforceError>(employee)
        })?;
        info!(
            first_name = %stored.first_name,
            last_name = %stored.last_name,
            id = stored.id,
            "employee created"
        );
        self.notifier.notify(&EmployeeEvent::created(&stored));
        Ok(stored)
    }

    /// # Errors
    /// Returns [`WorkforceError::Storage`] when the collection cannot be loaded.
    pub fn list(&self) -> Result<Vec<Employee>, WorkforceError> {
        Ok(self.store.load()?)
    }

    /// # Errors
    /// Returns [`WorkforceError::EmployeeNotFound`] when no record has `id`.
    pub fn get(&self, id: u64) -> Result<Employee, WorkforceError> {
        debug!(id, "looking up employee");
        self.store
            .load()?
            .into_iter()
            .find(|employee| employee.id == Some(id))
            .ok_or(WorkforceError::EmployeeNotFound(id))
    }

    /// Overwrites name and email of the employee with `id`. A missing id
    /// leaves the collection untouched and sends no notification.
    ///
    /// # Errors
    /// Returns [`WorkforceError::EmployeeNotFound`] or
    /// [`WorkforceError::Storage`].
    pub fn update(&self, id: u64, patch: &Employee) -> Result<Employee, WorkforceError> {
        let outcome: Result<Employee, WorkforceError> = self.store.modify(|employees| {
            let employee = employees
                .iter_mut()
                .find(|employee| employee.id == Some(id))
                .ok_or(WorkforceError::EmployeeNotFound(id))?;
            employee.apply_update(patch);
            Ok(employee.clone())
        });

        match outcome {
            Ok(updated) => {
                info!(first_name = %updated.first_name, id, "employee updated");
                self.notifier.notify(&EmployeeEvent::updated(&updated));
                Ok(updated)
            }
            Err(err) => {
                if err.is_not_found() {
                    warn!(id, "employee not found for update");
                }
                Err(err)
            }
        }
    }

    /// Removes the employee with `id`, if any, and saves the collection
    /// either way. Returns whether a record was removed.
    ///
    /// # Errors
    /// Returns [`WorkforceError::Storage`] when the collection cannot be
    /// loaded or saved.
    pub fn delete(&self, id: u64) -> Result<bool, WorkforceError> {
        let removed = self.store.modify(|employees| {
            let position = employees.iter().position(|employee| employee.id == Some(id));
            Ok::<_, WorkforceError>(position.map(|index| employees.remove(index)).is_some())
        })?;

        if removed {
            info!(id, "employee deleted");
            self.notifier.notify(&EmployeeEvent::deleted(id));
        } else {
            warn!(id, "employee not found for delete");
        }
        Ok(removed)
    }
}

/// Append-only collection used by the notification and activity services.
pub struct RecordLog<S> {
    store: S,
}

impl<S> RecordLog<S>
where
    S: RecordStore,
    S::Record: Clone,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    /// Returns [`WorkforceError::Storage`] when the collection cannot be
    /// loaded or saved.
    pub fn append(&self, record: S::Record) -> Result<(), WorkforceError> {
        self.store.modify(|records| {
            records.push(record);
            Ok::<_, WorkforceError>(())
        })
    }

    /// # Errors
    /// Returns [`WorkforceError::Storage`] when the collection cannot be loaded.
    pub fn list(&self) -> Result<Vec<S::Record>, WorkforceError> {
        Ok(self.store.load()?)
    }
}
