//! Error types for notification decoding and verification.

use thiserror::Error;

/// Failure to decode a notification document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("xml syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("document truncated: {open} element(s) left open")]
    Truncated { open: usize },

    #[error("document has no root element")]
    MissingRoot,

    #[error("document has content after the root element")]
    MultipleRoots,

    #[error("field {field:?} contains a nested element")]
    NestedElement { field: String },

    #[error("unexpected text outside of a field")]
    UnexpectedText,

    #[error("invalid utf-8 in document")]
    InvalidUtf8,
}

/// Why a claimed signature was not accepted.
///
/// Never carries the locally computed signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureMismatch {
    #[error("unsupported sign method {0:?}")]
    UnsupportedMethod(String),

    #[error("signature length mismatch: expected {expected}, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("signature does not match")]
    Content,
}

/// How a claimed identity differed from the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMismatchKind {
    Length,
    Content,
}

/// Reason a request was rejected by the verification pipeline.
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("request method {method} is not POST")]
    TransportPolicyViolation { method: String },

    #[error("failed to read request body: {0}")]
    TransportReadFailure(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] DecodeError),

    #[error("AppId mismatch ({kind:?}): claimed length {claimed_len}, expected length {expected_len}")]
    IdentityMismatch {
        kind: IdentityMismatchKind,
        claimed_len: usize,
        expected_len: usize,
    },

    #[error("required field {0} is missing")]
    MissingField(&'static str),

    #[error("signature mismatch: {0}")]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl FailureReason {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::TransportPolicyViolation { .. } => "transport_policy_violation",
            FailureReason::TransportReadFailure(_) => "transport_read_failure",
            FailureReason::MalformedPayload(_) => "malformed_payload",
            FailureReason::IdentityMismatch { .. } => "identity_mismatch",
            FailureReason::MissingField(_) => "missing_field",
            FailureReason::SignatureMismatch(_) => "signature_mismatch",
        }
    }
}

/// Startup misconfiguration of the notification handler.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}
