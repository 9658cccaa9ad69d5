//! Alarm notification endpoint.
//!
//! Every request runs through the same fixed sequence:
//! 1. Check the request method is POST
//! 2. Read the body (size capped)
//! 3. Decode the XML document
//! 4. Match the claimed AppId against the configured one
//! 5. Verify the signature with the configured app key
//!
//! The first failing step hands the request to the rejection sink. Only a
//! request that passes all five reaches the dispatch target.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::Method,
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::notify::{
    decode, identity, AlarmNotification, ConfigError, FailureReason, IdentityMatch,
    IdentityMismatchKind, SignatureCheck,
};
use crate::web::dispatch::DispatchTarget;
use crate::web::reject::{DefaultRejectionSink, RejectionSink};

/// Default cap on the request body size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Result of running the verification steps over one request.
#[derive(Debug)]
pub enum VerificationOutcome {
    Verified {
        notification: AlarmNotification,
        raw: Bytes,
    },
    Rejected(FailureReason),
}

/// Verification pipeline for alarm notifications.
///
/// Holds the configured AppId and app key for its whole lifetime; several
/// independently configured handlers can coexist.
pub struct AlarmNotifyHandler {
    app_id: String,
    app_key: String,
    max_body_bytes: usize,
    dispatch: Arc<dyn DispatchTarget>,
    rejection_sink: Arc<dyn RejectionSink>,
}

impl AlarmNotifyHandler {
    /// Create a handler, failing if the AppId or app key is blank.
    ///
    /// Rejected requests go to [`DefaultRejectionSink`] unless replaced with
    /// [`with_rejection_sink`](Self::with_rejection_sink).
    pub fn new(
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        dispatch: Arc<dyn DispatchTarget>,
    ) -> Result<Self, ConfigError> {
        let app_id = app_id.into();
        let app_key = app_key.into();

        if app_id.trim().is_empty() {
            return Err(ConfigError::Missing("app id"));
        }
        if app_key.trim().is_empty() {
            return Err(ConfigError::Missing("app key"));
        }

        Ok(Self {
            app_id,
            app_key,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            dispatch,
            rejection_sink: Arc::new(DefaultRejectionSink),
        })
    }

    pub fn with_rejection_sink(mut self, sink: Arc<dyn RejectionSink>) -> Self {
        self.rejection_sink = sink;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Verify a request and hand it to the dispatch target or the
    /// rejection sink.
    pub async fn handle(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();

        info!(method = %parts.method, uri = %parts.uri, "alarm_notify_received");

        match self.verify(&parts.method, body).await {
            VerificationOutcome::Verified { notification, raw } => {
                info!(
                    app_id = notification.app_id().unwrap_or_default(),
                    error_type = notification.error_type().unwrap_or_default(),
                    raw_length = raw.len(),
                    "alarm_notify_verified"
                );
                self.dispatch
                    .serve_verified_notification(&parts, notification, raw)
                    .await
            }
            VerificationOutcome::Rejected(reason) => {
                debug!(reason = reason.kind(), "alarm_notify_verification_failed");
                self.rejection_sink
                    .serve_rejected_request(&parts, reason)
                    .await
            }
        }
    }

    /// Run the method check and body read, then [`verify_payload`](Self::verify_payload).
    pub async fn verify(&self, method: &Method, body: Body) -> VerificationOutcome {
        if method != Method::POST {
            return VerificationOutcome::Rejected(FailureReason::TransportPolicyViolation {
                method: method.to_string(),
            });
        }

        let raw = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(raw) => raw,
            Err(e) => {
                return VerificationOutcome::Rejected(FailureReason::TransportReadFailure(format!(
                    "{} (limit {} bytes)",
                    e, self.max_body_bytes
                )))
            }
        };

        self.verify_payload(raw)
    }

    /// Decode, identity match and signature check over an already read body.
    pub fn verify_payload(&self, raw: Bytes) -> VerificationOutcome {
        let fields = match decode(&raw) {
            Ok(fields) => fields,
            Err(e) => return VerificationOutcome::Rejected(e.into()),
        };
        let notification = AlarmNotification::new(fields);

        let claimed = match notification.app_id() {
            Some(app_id) => app_id,
            None => return VerificationOutcome::Rejected(FailureReason::MissingField("AppId")),
        };

        let kind = match identity::compare(claimed, &self.app_id) {
            IdentityMatch::Equal => None,
            IdentityMatch::LengthMismatch { .. } => Some(IdentityMismatchKind::Length),
            IdentityMatch::ContentMismatch => Some(IdentityMismatchKind::Content),
        };
        if let Some(kind) = kind {
            return VerificationOutcome::Rejected(FailureReason::IdentityMismatch {
                kind,
                claimed_len: claimed.len(),
                expected_len: self.app_id.len(),
            });
        }

        match notification.verify_signature(&self.app_key) {
            SignatureCheck::Valid => VerificationOutcome::Verified { notification, raw },
            SignatureCheck::Missing => {
                VerificationOutcome::Rejected(FailureReason::MissingField("AppSignature"))
            }
            SignatureCheck::Mismatch(e) => VerificationOutcome::Rejected(e.into()),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<AlarmNotifyHandler>,
}

impl AppState {
    pub fn new(handler: AlarmNotifyHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Alarm notification endpoint.
///
/// Bound for every method so that the method check is reported through the
/// rejection sink rather than as a bare 405.
pub async fn alarm_notify_webhook(State(state): State<AppState>, request: Request) -> Response {
    state.handler.handle(request).await
}

/// Build the router serving `/health` and the notification endpoint at `path`.
pub fn router(state: AppState, path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(path, any(alarm_notify_webhook))
        .with_state(state)
}
