//! Typed view over a decoded alarm notification.
//!
//! The platform signs an alarm by sorting the non-empty fields (other than
//! `AppSignature` and `SignMethod`) by name, joining them as
//! `name=value` pairs with `&`, appending `&key=<app key>` and hashing the
//! result with SHA-1. The digest is hex-encoded in upper case.
//!
//! Field names keep the case they arrive with and the key is appended
//! rather than sorted in as an `appkey` member. The older pay v2 `paySign`
//! family lowercases names and sorts `appkey` in; this module does not
//! implement that variant. The only accepted method is the `sha1` value the
//! platform sends in `SignMethod`.

use std::num::ParseIntError;

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use super::error::SignatureMismatch;
use super::fields::FieldMap;

pub const FIELD_APP_ID: &str = "AppId";
pub const FIELD_ERROR_TYPE: &str = "ErrorType";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_ALARM_CONTENT: &str = "AlarmContent";
pub const FIELD_TIME_STAMP: &str = "TimeStamp";
pub const FIELD_APP_SIGNATURE: &str = "AppSignature";
pub const FIELD_SIGN_METHOD: &str = "SignMethod";

/// Length of an upper-case hex SHA-1 digest.
pub const SIGNATURE_HEX_LEN: usize = 40;

/// Check the `SignMethod` field. An absent field means SHA-1; any value
/// other than `sha1`/`SHA1` is rejected.
pub fn check_sign_method(value: Option<&str>) -> Result<(), SignatureMismatch> {
    match value {
        None | Some("sha1") | Some("SHA1") => Ok(()),
        Some(other) => Err(SignatureMismatch::UnsupportedMethod(other.to_string())),
    }
}

/// Outcome of [`AlarmNotification::verify_signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    /// No `AppSignature` field, or it is empty.
    Missing,
    Mismatch(SignatureMismatch),
}

/// Alarm notification pushed by the payment platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmNotification {
    fields: FieldMap,
}

impl AlarmNotification {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Claimed sender identity.
    pub fn app_id(&self) -> Option<&str> {
        self.fields.get(FIELD_APP_ID)
    }

    pub fn error_type(&self) -> Option<&str> {
        self.fields.get(FIELD_ERROR_TYPE)
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.get(FIELD_DESCRIPTION)
    }

    pub fn alarm_content(&self) -> Option<&str> {
        self.fields.get(FIELD_ALARM_CONTENT)
    }

    pub fn time_stamp_raw(&self) -> Option<&str> {
        self.fields.get(FIELD_TIME_STAMP)
    }

    /// Unix timestamp (seconds) of the alarm.
    pub fn time_stamp(&self) -> Option<Result<i64, ParseIntError>> {
        self.time_stamp_raw().map(str::parse)
    }

    pub fn app_signature(&self) -> Option<&str> {
        self.fields.get(FIELD_APP_SIGNATURE)
    }

    pub fn sign_method(&self) -> Option<&str> {
        self.fields.get(FIELD_SIGN_METHOD)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Check `AppSignature` against a signature computed with `app_key`.
    ///
    /// The computed signature never leaves this function.
    pub fn verify_signature(&self, app_key: &str) -> SignatureCheck {
        let claimed = match self.app_signature() {
            Some(s) if !s.is_empty() => s,
            _ => return SignatureCheck::Missing,
        };

        if let Err(e) = check_sign_method(self.sign_method()) {
            return SignatureCheck::Mismatch(e);
        }

        if claimed.len() != SIGNATURE_HEX_LEN {
            return SignatureCheck::Mismatch(SignatureMismatch::Length {
                expected: SIGNATURE_HEX_LEN,
                actual: claimed.len(),
            });
        }

        let expected = digest(&canonical_string(&self.fields, app_key));

        if bool::from(expected.as_bytes().ct_eq(claimed.as_bytes())) {
            SignatureCheck::Valid
        } else {
            SignatureCheck::Mismatch(SignatureMismatch::Content)
        }
    }
}

/// Compute the `AppSignature` the platform would send for `fields`.
///
/// Fails if `fields` names a sign method other than SHA-1.
pub fn sign(fields: &FieldMap, app_key: &str) -> Result<String, SignatureMismatch> {
    check_sign_method(fields.get(FIELD_SIGN_METHOD))?;
    Ok(digest(&canonical_string(fields, app_key)))
}

/// Build the string that is hashed to produce the signature.
fn canonical_string(fields: &FieldMap, app_key: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = fields
        .iter()
        .filter(|(name, value)| {
            *name != FIELD_APP_SIGNATURE && *name != FIELD_SIGN_METHOD && !value.is_empty()
        })
        .collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut canonical = String::new();
    for (name, value) in pairs {
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(value);
        canonical.push('&');
    }
    canonical.push_str("key=");
    canonical.push_str(app_key);
    canonical
}

fn digest(canonical: &str) -> String {
    hex::encode_upper(Sha1::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_KEY: &str = "L8LrMqqeGRxST5reouB0K66CaYAWpqhAVsq7ggKkxHCOastWksvuX1uvmvQclxaHoYd3ElNBrNO2DHnnzgfVG9Qs473M3DTOZug5er46FhuGofumV8H2FVR9qkjSlC5K";

    fn alarm_fields() -> FieldMap {
        [
            ("AppId", "wxf8b4f85f3a794e77"),
            ("ErrorType", "1001"),
            ("Description", "错误描述"),
            ("AlarmContent", "错误详情"),
            ("TimeStamp", "1393860740"),
        ]
        .into_iter()
        .collect()
    }

    fn signed(mut fields: FieldMap) -> AlarmNotification {
        let signature = sign(&fields, APP_KEY).unwrap();
        fields.insert(FIELD_APP_SIGNATURE, signature);
        AlarmNotification::new(fields)
    }

    #[test]
    fn test_canonical_string_sorted_and_filtered() {
        let mut fields = alarm_fields();
        fields.insert("Empty", "");
        fields.insert(FIELD_APP_SIGNATURE, "ignored");
        fields.insert(FIELD_SIGN_METHOD, "sha1");

        assert_eq!(
            canonical_string(&fields, "secret"),
            "AlarmContent=错误详情&AppId=wxf8b4f85f3a794e77&Description=错误描述\
             &ErrorType=1001&TimeStamp=1393860740&key=secret"
        );
    }

    #[test]
    fn test_canonical_string_no_fields() {
        assert_eq!(canonical_string(&FieldMap::new(), "secret"), "key=secret");
    }

    #[test]
    fn test_sign_sha1_known_value() {
        let fields: FieldMap = [("AppId", "ID1")].into_iter().collect();
        // SHA-1 of "AppId=ID1&key=secret"
        let expected = hex::encode_upper(Sha1::digest(b"AppId=ID1&key=secret"));

        assert_eq!(sign(&fields, "secret").unwrap(), expected);
        assert_eq!(expected.len(), 40);
        assert!(expected.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_verify_valid_sha1() {
        let notification = signed(alarm_fields());
        assert_eq!(notification.verify_signature(APP_KEY), SignatureCheck::Valid);
    }

    #[test]
    fn test_verify_rejects_hmac_sha256_method() {
        let mut fields = alarm_fields();
        // Correct SHA-1 signature, but the sender asks for another scheme.
        let signature = sign(&fields, APP_KEY).unwrap();
        fields.insert(FIELD_APP_SIGNATURE, signature);
        fields.insert(FIELD_SIGN_METHOD, "HMAC-SHA256");

        assert_eq!(
            AlarmNotification::new(fields.clone()).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(SignatureMismatch::UnsupportedMethod(
                "HMAC-SHA256".to_string()
            ))
        );
        assert!(sign(&fields, APP_KEY).is_err());
    }

    #[test]
    fn test_verify_wrong_key() {
        let notification = signed(alarm_fields());
        assert_eq!(
            notification.verify_signature("another-key"),
            SignatureCheck::Mismatch(SignatureMismatch::Content)
        );
    }

    #[test]
    fn test_verify_lowercase_signature_rejected() {
        let mut fields = alarm_fields();
        let signature = sign(&fields, APP_KEY).unwrap().to_lowercase();
        fields.insert(FIELD_APP_SIGNATURE, signature);

        assert_eq!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(SignatureMismatch::Content)
        );
    }

    #[test]
    fn test_verify_tampered_field() {
        let notification = signed(alarm_fields());
        let mut fields = notification.into_fields();
        fields.insert(FIELD_ERROR_TYPE, "1002");

        assert_eq!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(SignatureMismatch::Content)
        );
    }

    #[test]
    fn test_verify_added_field_changes_signature() {
        let mut fields = signed(alarm_fields()).into_fields();
        fields.insert("Injected", "value");

        assert!(matches!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(_)
        ));
    }

    #[test]
    fn test_verify_missing_signature() {
        let notification = AlarmNotification::new(alarm_fields());
        assert_eq!(notification.verify_signature(APP_KEY), SignatureCheck::Missing);

        let mut fields = alarm_fields();
        fields.insert(FIELD_APP_SIGNATURE, "");
        assert_eq!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Missing
        );
    }

    #[test]
    fn test_verify_wrong_length() {
        let mut fields = alarm_fields();
        fields.insert(FIELD_APP_SIGNATURE, "ABC");

        assert_eq!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(SignatureMismatch::Length {
                expected: 40,
                actual: 3
            })
        );
    }

    #[test]
    fn test_verify_unsupported_method() {
        let mut fields = alarm_fields();
        fields.insert(FIELD_SIGN_METHOD, "md5");
        fields.insert(FIELD_APP_SIGNATURE, "0".repeat(32));

        assert_eq!(
            AlarmNotification::new(fields).verify_signature(APP_KEY),
            SignatureCheck::Mismatch(SignatureMismatch::UnsupportedMethod("md5".to_string()))
        );
    }

    #[test]
    fn test_accessors_never_synthesize() {
        let notification = AlarmNotification::new(FieldMap::new());

        assert_eq!(notification.app_id(), None);
        assert_eq!(notification.error_type(), None);
        assert_eq!(notification.description(), None);
        assert_eq!(notification.alarm_content(), None);
        assert!(notification.time_stamp().is_none());
        assert_eq!(notification.sign_method(), None);
    }

    #[test]
    fn test_time_stamp_parse() {
        let notification = AlarmNotification::new(alarm_fields());
        assert_eq!(notification.time_stamp(), Some(Ok(1393860740)));

        let bad: FieldMap = [("TimeStamp", "soon")].into_iter().collect();
        assert!(matches!(AlarmNotification::new(bad).time_stamp(), Some(Err(_))));
    }

    #[test]
    fn test_check_sign_method() {
        assert_eq!(check_sign_method(None), Ok(()));
        assert_eq!(check_sign_method(Some("sha1")), Ok(()));
        assert_eq!(check_sign_method(Some("SHA1")), Ok(()));
        assert!(check_sign_method(Some("Sha1")).is_err());
        assert!(check_sign_method(Some("hmac-sha256")).is_err());
        assert!(check_sign_method(Some("MD5")).is_err());
    }
}
