//! Dispatch target that forwards verified alarms to RabbitMQ.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::{AlarmMessage, Publisher};
use crate::notify::AlarmNotification;
use crate::web::{DispatchTarget, SUCCESS_BODY};

/// Publishes each verified alarm and acknowledges it to the platform.
///
/// A failed publish answers 500 so that the platform retries delivery.
#[derive(Clone)]
pub struct QueueDispatch {
    publisher: Publisher,
}

impl QueueDispatch {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl DispatchTarget for QueueDispatch {
    async fn serve_verified_notification(
        &self,
        _parts: &Parts,
        notification: AlarmNotification,
        raw: Bytes,
    ) -> Response {
        let message = AlarmMessage::from_notification(&notification, &raw);

        if let Err(e) = self.publisher.publish_alarm(&message).await {
            error!(error = %e, app_id = %message.app_id, "alarm_publish_failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        (StatusCode::OK, SUCCESS_BODY).into_response()
    }
}
