//! Alarm Notify - verifying receiver for payment platform alarm notifications.
//!
//! The platform pushes signed XML alarm notifications. This library checks
//! each one before any application code sees it:
//! - `notify`: document decoding, identity matching, signature verification
//! - `web`: the verification pipeline as an axum endpoint
//! - `queue`: a dispatch target publishing verified alarms to RabbitMQ
//!
//! ## Architecture
//!
//! ```text
//! Platform → AlarmNotifyHandler → DispatchTarget (verified) / RejectionSink (rejected)
//! ```

pub mod config;
pub mod notify;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use notify::{AlarmNotification, FailureReason, FieldMap};
pub use queue::{AlarmMessage, Publisher, QueueDispatch, ALARM_QUEUE};
pub use web::{AlarmNotifyHandler, AppState, DispatchTarget, RejectionSink, VerificationOutcome};
