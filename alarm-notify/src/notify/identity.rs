//! Sender identity matching.

use subtle::ConstantTimeEq;

/// Result of comparing a claimed identity against the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMatch {
    Equal,
    /// Lengths differ. Lengths are not secret, so this is reported before
    /// any content comparison.
    LengthMismatch { claimed: usize, expected: usize },
    ContentMismatch,
}

/// Compare `claimed` against `configured`.
///
/// Equal-length inputs are compared in constant time with respect to their
/// content.
pub fn compare(claimed: &str, configured: &str) -> IdentityMatch {
    if claimed.len() != configured.len() {
        return IdentityMatch::LengthMismatch {
            claimed: claimed.len(),
            expected: configured.len(),
        };
    }

    if bool::from(claimed.as_bytes().ct_eq(configured.as_bytes())) {
        IdentityMatch::Equal
    } else {
        IdentityMatch::ContentMismatch
    }
}

/// Returns `true` if `claimed` equals `configured`.
pub fn matches(claimed: &str, configured: &str) -> bool {
    compare(claimed, configured) == IdentityMatch::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        assert!(matches("wx2421b1c4370ec43b", "wx2421b1c4370ec43b"));
        assert!(!matches("wx2421b1c4370ec43c", "wx2421b1c4370ec43b"));
        assert!(!matches("wx2421b1c4370ec43", "wx2421b1c4370ec43b"));
        assert!(matches("", ""));
    }

    #[test]
    fn test_length_mismatch_reported_first() {
        assert_eq!(
            compare("ID", "ID1"),
            IdentityMatch::LengthMismatch {
                claimed: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn test_content_mismatch_any_position() {
        let configured = "ID1ABCDEF";
        for i in 0..configured.len() {
            let mut claimed = configured.as_bytes().to_vec();
            claimed[i] = b'#';
            let claimed = String::from_utf8(claimed).unwrap();
            assert_eq!(compare(&claimed, configured), IdentityMatch::ContentMismatch);
        }
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(compare("id1", "ID1"), IdentityMatch::ContentMismatch);
    }
}
