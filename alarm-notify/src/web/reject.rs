//! Handling of requests that failed verification.

use async_trait::async_trait;
use axum::{
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::notify::FailureReason;

/// Receives every request the pipeline rejects, together with the reason.
#[async_trait]
pub trait RejectionSink: Send + Sync {
    async fn serve_rejected_request(&self, parts: &Parts, reason: FailureReason) -> Response;
}

/// Rejection response body.
///
/// Identical for every failure kind so that callers cannot probe which
/// verification step failed.
#[derive(Debug, Serialize)]
pub struct RejectionResponse {
    pub status: &'static str,
}

/// Logs the failure and answers `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRejectionSink;

#[async_trait]
impl RejectionSink for DefaultRejectionSink {
    async fn serve_rejected_request(&self, parts: &Parts, reason: FailureReason) -> Response {
        warn!(
            method = %parts.method,
            uri = %parts.uri,
            reason = reason.kind(),
            error = %reason,
            "alarm_notify_rejected"
        );

        (
            StatusCode::BAD_REQUEST,
            Json(RejectionResponse { status: "rejected" }),
        )
            .into_response()
    }
}
