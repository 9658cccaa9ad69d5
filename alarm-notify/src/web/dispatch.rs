//! Business hook invoked with fully verified notifications.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::notify::AlarmNotification;

/// Body the platform expects when a notification has been accepted.
pub const SUCCESS_BODY: &str = "success";

/// Receives notifications that passed every verification step.
///
/// The implementation owns the HTTP response; the pipeline returns it
/// unchanged.
#[async_trait]
pub trait DispatchTarget: Send + Sync {
    async fn serve_verified_notification(
        &self,
        parts: &Parts,
        notification: AlarmNotification,
        raw: Bytes,
    ) -> Response;
}

/// Dispatch target that only logs the alarm.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatch;

#[async_trait]
impl DispatchTarget for LogDispatch {
    async fn serve_verified_notification(
        &self,
        _parts: &Parts,
        notification: AlarmNotification,
        raw: Bytes,
    ) -> Response {
        info!(
            app_id = notification.app_id().unwrap_or_default(),
            error_type = notification.error_type().unwrap_or_default(),
            description = notification.description().unwrap_or_default(),
            alarm_content = notification.alarm_content().unwrap_or_default(),
            time_stamp = notification.time_stamp_raw().unwrap_or_default(),
            raw_length = raw.len(),
            "alarm_notification_logged"
        );

        (StatusCode::OK, SUCCESS_BODY).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::FieldMap;
    use axum::http::Request;

    #[tokio::test]
    async fn test_log_dispatch_responds_success() {
        let (parts, _) = Request::post("/alarm").body(()).unwrap().into_parts();
        let notification =
            AlarmNotification::new([("AppId", "ID1")].into_iter().collect::<FieldMap>());

        let response = LogDispatch
            .serve_verified_notification(&parts, notification, Bytes::from_static(b"<xml/>"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], SUCCESS_BODY.as_bytes());
    }
}
