//! Canonical alert record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Event type assigned by the webhook receiver to metrics-alerting events
pub const PROMETHEUS_EVENT_TYPE: &str = "prometheusAlert";

/// Canonical alert exchanged across the pipeline
///
/// The webhook receiver fills the raw fields (`event_type`, `event`,
/// `tags`, `severity`); processing stages derive the rest before the
/// alert is persisted or matched against open alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert id, used for logging and tracing only
    pub id: String,
    /// Discriminates which processing stages run for this alert
    pub event_type: String,
    /// Alert rule name (e.g. "KubeHpaMaxedOut")
    pub event: String,
    /// Composite identifier of the entity the alert is about
    pub resource: String,
    /// Severity in the downstream alerting vocabulary
    pub severity: String,
    /// Deployment environment
    pub environment: String,
    /// Affected services; the first entry is the primary one
    pub service: Vec<String>,
    /// Source system that emitted the alert
    pub origin: String,
    /// Raw `key=value` tag strings from the webhook payload
    pub tags: Vec<String>,
    /// Structured attributes promoted from tags or derived by rules
    pub attributes: HashMap<String, String>,
    /// Expiry timeout in seconds
    pub timeout: u64,
    /// When the webhook receiver accepted the event
    pub receive_time: DateTime<Utc>,
}

impl Alert {
    /// Create an alert with a fresh id and receive timestamp
    pub fn new(event_type: &str, event: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            event: event.to_string(),
            resource: String::new(),
            severity: String::new(),
            environment: String::new(),
            service: Vec::new(),
            origin: String::new(),
            tags: Vec::new(),
            attributes: HashMap::new(),
            timeout: 0,
            receive_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Alert::new(PROMETHEUS_EVENT_TYPE, "Watchdog");
        let b = Alert::new(PROMETHEUS_EVENT_TYPE, "Watchdog");

        assert_ne!(a.id, b.id);
        assert_eq!(a.event_type, "prometheusAlert");
        assert_eq!(a.event, "Watchdog");
    }

    #[test]
    fn test_serde_preserves_attributes() {
        let mut alert = Alert::new(PROMETHEUS_EVENT_TYPE, "PodCrashLooping");
        alert.attributes.insert("cluster".to_string(), "east-1".to_string());

        let json = serde_json::to_string(&alert).unwrap();
        let decoded: Alert = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, alert);
    }
}
