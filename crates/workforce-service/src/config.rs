//! Command-line and environment configuration for the three binaries.
//!
//! Every flag falls back to an environment variable, then to a default that
//! lets the services find each other on localhost.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use workforce_core::EMPLOYEE_SERVICE_NAME;
use workforce_notify::{NotifierConfig, DEFAULT_ACTIVITY_URL, DEFAULT_NOTIFICATION_URL};
use workforce_store_json::{ACTIVITIES_FILE, EMPLOYEES_FILE, NOTIFICATIONS_FILE};

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Parser)]
#[command(name = "employee-service")]
#[command(about = "Employee CRUD service backed by a flat JSON file")]
pub struct EmployeeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8081")]
    pub bind: SocketAddr,
    #[arg(long, env = "DATA_FILE", default_value = EMPLOYEES_FILE)]
    pub data_file: PathBuf,
    #[arg(long, env = "NOTIFICATION_URL", default_value = DEFAULT_NOTIFICATION_URL)]
    pub notification_url: String,
    #[arg(long, env = "ACTIVITY_URL", default_value = DEFAULT_ACTIVITY_URL)]
    pub activity_url: String,
    /// Timeout for calls to sibling services; unset means no timeout.
    #[arg(long, env = "NOTIFY_TIMEOUT_MS")]
    pub notify_timeout_ms: Option<u64>,
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl EmployeeArgs {
    #[must_use]
    pub fn notifier_config(&self) -> NotifierConfig {
        NotifierConfig {
            notification_url: self.notification_url.clone(),
            activity_url: self.activity_url.clone(),
            timeout: self.notify_timeout_ms.map(Duration::from_millis),
            service_name: EMPLOYEE_SERVICE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "notification-service")]
#[command(about = "Receives and records employee notifications")]
pub struct NotificationArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
    #[arg(long, env = "DATA_FILE", default_value = NOTIFICATIONS_FILE)]
    pub data_file: PathBuf,
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "activity-service")]
#[command(about = "Append-only activity log for the workforce services")]
pub struct ActivityArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8083")]
    pub bind: SocketAddr,
    #[arg(long, env = "DATA_FILE", default_value = ACTIVITIES_FILE)]
    pub data_file: PathBuf,
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}
