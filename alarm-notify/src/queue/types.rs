//! Queue message types.

use serde::{Deserialize, Serialize};

use crate::notify::AlarmNotification;

/// Queue name for verified alarm notifications.
pub const ALARM_QUEUE: &str = "alarm_notifications";

/// Verified alarm notification as published to the alarm queue.
///
/// Only produced after the notification passed identity and signature
/// checks; consumers do not re-verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmMessage {
    /// Sender AppId
    pub app_id: String,
    /// Platform error code
    #[serde(default)]
    pub error_type: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Alarm details
    #[serde(default)]
    pub alarm_content: Option<String>,
    /// Unix timestamp (seconds), when present and numeric
    #[serde(default)]
    pub time_stamp: Option<i64>,
    /// The XML document exactly as received
    pub raw_xml: String,
}

impl AlarmMessage {
    pub fn from_notification(notification: &AlarmNotification, raw: &[u8]) -> Self {
        Self {
            app_id: notification.app_id().unwrap_or_default().to_string(),
            error_type: notification.error_type().map(str::to_string),
            description: notification.description().map(str::to_string),
            alarm_content: notification.alarm_content().map(str::to_string),
            time_stamp: notification.time_stamp().and_then(Result::ok),
            raw_xml: String::from_utf8_lossy(raw).into_owned(),
        }
    }

    /// Message ID used for tracking on the broker.
    pub fn message_id(&self) -> String {
        match self.time_stamp {
            Some(ts) => format!("alarm-{}-{}", self.app_id, ts),
            None => format!("alarm-{}", self.app_id),
        }
    }
}
