//! Blocking HTTP delivery of employee events to the notification and
//! activity services.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info};
use workforce_core::{now_utc, EmployeeEvent, Notifier, EMPLOYEE_SERVICE_NAME};

pub const DEFAULT_NOTIFICATION_URL: &str = "http://localhost:8080";
pub const DEFAULT_ACTIVITY_URL: &str = "http://localhost:8083";

const NOTIFICATIONS_PATH: &str = "/api/notifications";
const ACTIVITIES_PATH: &str = "/api/activities";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{endpoint} responded with http status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("http transport failure for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: Box<ureq::Transport>,
    },
    #[error("failed to encode payload for {endpoint}: {source}")]
    Encode {
        endpoint: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub notification_url: String,
    pub activity_url: String,
    /// `None` keeps the client default, which never times out.
    pub timeout: Option<Duration>,
    pub service_name: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            notification_url: DEFAULT_NOTIFICATION_URL.to_string(),
            activity_url: DEFAULT_ACTIVITY_URL.to_string(),
            timeout: None,
            service_name: EMPLOYEE_SERVICE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpNotifier {
    agent: ureq::Agent,
    notifications_endpoint: String,
    activities_endpoint: String,
    service_name: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

impl HttpNotifier {
    #[must_use]
    pub fn new(config: NotifierConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            notifications_endpoint: endpoint(&config.notification_url, NOTIFICATIONS_PATH),
            activities_endpoint: endpoint(&config.activity_url, ACTIVITIES_PATH),
            service_name: config.service_name,
        }
    }

    #[must_use]
    pub fn notifications_endpoint(&self) -> &str {
        &self.notifications_endpoint
    }

    #[must_use]
    pub fn activities_endpoint(&self) -> &str {
        &self.activities_endpoint
    }

    /// POSTs `payload` as JSON and discards the response body.
    ///
    /// # Errors
    /// Returns [`NotifyError::Status`] for any non-2xx answer and
    /// [`NotifyError::Transport`] when the request never completed.
    pub fn post(&self, endpoint: &str, payload: &Value) -> Result<(), NotifyError> {
        match self.agent.post(endpoint).send_json(payload) {
            Ok(response) => {
                debug!(endpoint, status = response.status(), "sibling service accepted call");
                Ok(())
            }
            Err(ureq::Error::Status(status, _)) => {
                Err(NotifyError::Status { endpoint: endpoint.to_string(), status })
            }
            Err(ureq::Error::Transport(transport)) => Err(NotifyError::Transport {
                endpoint: endpoint.to_string(),
                source: Box::new(transport),
            }),
        }
    }

    fn post_serialized<T: serde::Serialize>(&self, endpoint: &str, payload: &T) -> Result<(), NotifyError> {
        let body = serde_json::to_value(payload)
            .map_err(|source| NotifyError::Encode { endpoint: endpoint.to_string(), source })?;
        self.post(endpoint, &body)
    }

    fn send_notification(&self, event: &EmployeeEvent) {
        let notification = event.notification();
        if let Err(err) = self.post_serialized(&self.notifications_endpoint, &notification) {
            error!(kind = event.kind.as_str(), employee_id = event.employee_id, error = %err, "failed to send notification");
        }
    }

    fn send_activity(&self, event: &EmployeeEvent) {
        let activity = match event.activity(&self.service_name, now_utc()) {
            Ok(activity) => activity,
            Err(err) => {
                error!(kind = event.kind.as_str(), error = %err, "failed to build activity event");
                return;
            }
        };
        info!(
            kind = event.kind.as_str(),
            service = %self.service_name,
            endpoint = %self.activities_endpoint,
            "sending activity"
        );
        if let Err(err) = self.post_serialized(&self.activities_endpoint, &activity) {
            error!(kind = event.kind.as_str(), error = %err, "failed to send activity event");
        }
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, event: &EmployeeEvent) {
        self.send_notification(event);
        self.send_activity(event);
    }
}
