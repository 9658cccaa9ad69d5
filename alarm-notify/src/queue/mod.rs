//! Queue module for handing verified alarms to RabbitMQ.
//!
//! ```text
//! Platform → alarm endpoint → QueueDispatch → alarm_notifications queue
//! ```

pub mod dispatch;
pub mod publisher;
pub mod types;

pub use dispatch::QueueDispatch;
pub use publisher::Publisher;
pub use types::{AlarmMessage, ALARM_QUEUE};
