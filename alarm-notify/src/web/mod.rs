//! Web layer for receiving alarm notifications.
//!
//! - `handlers`: the verification pipeline and router
//! - `dispatch`: hook for verified notifications
//! - `reject`: hook for rejected requests

pub mod dispatch;
pub mod handlers;
pub mod reject;

pub use dispatch::{DispatchTarget, LogDispatch, SUCCESS_BODY};
pub use handlers::{
    alarm_notify_webhook, health, router, AlarmNotifyHandler, AppState, HealthResponse,
    VerificationOutcome, DEFAULT_MAX_BODY_BYTES,
};
pub use reject::{DefaultRejectionSink, RejectionResponse, RejectionSink};
