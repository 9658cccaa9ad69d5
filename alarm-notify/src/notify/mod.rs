//! Alarm notification decoding and verification primitives.
//!
//! ## Verification Flow
//!
//! ```text
//! raw XML → decode() → FieldMap → AlarmNotification → identity::compare() → verify_signature()
//! ```

pub mod alarm;
pub mod decode;
pub mod error;
pub mod fields;
pub mod identity;

pub use alarm::{check_sign_method, sign, AlarmNotification, SignatureCheck};
pub use decode::decode;
pub use error::{ConfigError, DecodeError, FailureReason, IdentityMismatchKind, SignatureMismatch};
pub use fields::FieldMap;
pub use identity::IdentityMatch;
