#![allow(clippy::missing_errors_doc)]

//! Flat JSON-file implementation of [`RecordStore`].
//!
//! The whole collection lives in one pretty-printed JSON array. Every write
//! replaces the file. A per-store mutex makes each load-modify-save cycle
//! exclusive within the process; other processes writing the same file are
//! not coordinated with.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use workforce_core::{RecordStore, StoreError};

pub const EMPLOYEES_FILE: &str = "employees.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.json";
pub const ACTIVITIES_FILE: &str = "activities.json";

pub struct JsonFileStore<T> {
    path: PathBuf,
    guard: Mutex<()>,
    records: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for JsonFileStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), guard: Mutex::new(()), records: PhantomData }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_records(&self) -> Result<Vec<T>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no backing file yet; starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                error!(path = %self.path.display(), error = %source, "failed to read records");
                return Err(StoreError::Read { path: self.path.clone(), source });
            }
        };

        let records: Vec<T> = serde_json::from_slice(&bytes).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "failed to decode records");
            StoreError::Decode { path: self.path.clone(), source }
        })?;
        debug!(path = %self.path.display(), count = records.len(), "read records");
        Ok(records)
    }

    fn write_records(&self, records: &[T]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(records)
            .map_err(|source| StoreError::Encode { path: self.path.clone(), source })?;
        fs::write(&self.path, body).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "failed to write records");
            StoreError::Write { path: self.path.clone(), source }
        })?;
        debug!(path = %self.path.display(), count = records.len(), "wrote records");
        Ok(())
    }
}

impl<T> RecordStore for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    type Record = T;

    fn load(&self) -> Result<Vec<T>, StoreError> {
        let _guard = self.lock();
        self.read_records()
    }

    fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.write_records(records)
    }

    fn modify<R, E, F>(&self, mutate: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
    {
        let _guard = self.lock();
        let mut records = self.read_records()?;
        let outcome = mutate(&mut records)?;
        self.write_records(&records)?;
        Ok(outcome)
    }
}
