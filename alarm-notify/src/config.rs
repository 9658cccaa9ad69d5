//! Configuration module for environment variable parsing.

use std::env;

use crate::web::DEFAULT_MAX_BODY_BYTES;

/// Default route for alarm notifications.
pub const DEFAULT_NOTIFY_PATH: &str = "/wechat/pay/alarm";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// AppId the platform must claim in every notification
    pub app_id: Option<String>,

    /// Shared app key used to verify notification signatures
    pub app_key: Option<String>,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Route the notification endpoint is served on
    pub notify_path: String,

    /// RabbitMQ connection URL; verified alarms are only logged when unset
    pub cloudamqp_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            app_id: non_empty("WECHAT_PAY_APP_ID"),

            app_key: non_empty("WECHAT_PAY_APP_KEY"),

            max_body_bytes: env::var("ALARM_NOTIFY_MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),

            notify_path: non_empty("ALARM_NOTIFY_PATH")
                .unwrap_or_else(|| DEFAULT_NOTIFY_PATH.to_string()),

            cloudamqp_url: non_empty("CLOUDAMQP_URL"),
        }
    }
}

// Keeps the app key out of debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key.as_ref().map(|_| "<redacted>"))
            .field("max_body_bytes", &self.max_body_bytes)
            .field("notify_path", &self.notify_path)
            .field("cloudamqp_url_set", &self.cloudamqp_url.is_some())
            .finish()
    }
}

/// Read an environment variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
