//! Password policy response control (draft-behera-ldap-password-policy)
//!
//! Returned by the server to report password expiration warnings and policy
//! errors. The value is:
//!
//! ```text
//! PasswordPolicyResponseValue ::= SEQUENCE {
//!      warning [0] CHOICE {
//!           timeBeforeExpiration [0] INTEGER (0 .. maxInt),
//!           graceAuthNsRemaining [1] INTEGER (0 .. maxInt) } OPTIONAL,
//!      error   [1] ENUMERATED {
//!           passwordExpired             (0),
//!           accountLocked               (1),
//!           changeAfterReset            (2),
//!           passwordModNotAllowed       (3),
//!           mustSupplyOldPassword       (4),
//!           insufficientPasswordQuality (5),
//!           passwordTooShort            (6),
//!           passwordTooYoung            (7),
//!           passwordInHistory           (8) } OPTIONAL }
//! ```
//!
//! The request control shares this OID and has no value; it is not part of
//! the control registry, since one OID can only dispatch to one decoder.

use crate::shape::{non_negative, unexpected_element};
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value};
use ldap_protocol::json::payload::{from_payload, to_payload};
use ldap_protocol::{Control, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const WARNING_TAG: BerTag = BerTag::context_specific(true, 0);
const ERROR_TAG: BerTag = BerTag::context_specific(false, 1);
const TIME_BEFORE_EXPIRATION_TAG: BerTag = BerTag::context_specific(false, 0);
const GRACE_LOGINS_REMAINING_TAG: BerTag = BerTag::context_specific(false, 1);

/// Kind of password policy warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordPolicyWarningType {
    /// Seconds until the password expires
    TimeBeforeExpiration,
    /// Grace logins left after expiration
    GraceLoginsRemaining,
}

/// Password policy warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicyWarning {
    warning_type: PasswordPolicyWarningType,
    value: i32,
}

impl PasswordPolicyWarning {
    /// # Panics
    /// Panics if `seconds` is negative.
    pub fn time_before_expiration(seconds: i32) -> Self {
        Self::new(PasswordPolicyWarningType::TimeBeforeExpiration, seconds)
    }

    /// # Panics
    /// Panics if `count` is negative.
    pub fn grace_logins_remaining(count: i32) -> Self {
        Self::new(PasswordPolicyWarningType::GraceLoginsRemaining, count)
    }

    fn new(warning_type: PasswordPolicyWarningType, value: i32) -> Self {
        assert!(value >= 0, "password policy warning value must not be negative");
        Self {
            warning_type,
            value,
        }
    }

    pub fn warning_type(&self) -> PasswordPolicyWarningType {
        self.warning_type
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    fn to_element(self) -> BerElement {
        let number = match self.warning_type {
            PasswordPolicyWarningType::TimeBeforeExpiration => 0,
            PasswordPolicyWarningType::GraceLoginsRemaining => 1,
        };
        let choice = BerElement::integer(i64::from(self.value)).with_context_tag(number);
        BerElement::constructed(WARNING_TAG, vec![choice])
    }

    fn from_element(element: &BerElement) -> DecodeResult<Self> {
        let choices = element.as_sequence()?;
        check_element_count(choices, 1, 1, "Password policy warning")?;
        let choice = &choices[0];
        let warning_type = match choice.tag() {
            TIME_BEFORE_EXPIRATION_TAG => PasswordPolicyWarningType::TimeBeforeExpiration,
            GRACE_LOGINS_REMAINING_TAG => PasswordPolicyWarningType::GraceLoginsRemaining,
            _ => return Err(unexpected_element(choice, "password policy warning")),
        };
        let value = non_negative(choice, "Password policy warning value")?;
        Ok(Self {
            warning_type,
            value,
        })
    }
}

/// Password policy error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordPolicyErrorType {
    PasswordExpired,
    AccountLocked,
    ChangeAfterReset,
    PasswordModNotAllowed,
    MustSupplyOldPassword,
    InsufficientPasswordQuality,
    PasswordTooShort,
    PasswordTooYoung,
    PasswordInHistory,
}

impl PasswordPolicyErrorType {
    const ALL: [PasswordPolicyErrorType; 9] = [
        Self::PasswordExpired,
        Self::AccountLocked,
        Self::ChangeAfterReset,
        Self::PasswordModNotAllowed,
        Self::MustSupplyOldPassword,
        Self::InsufficientPasswordQuality,
        Self::PasswordTooShort,
        Self::PasswordTooYoung,
        Self::PasswordInHistory,
    ];

    /// Get the wire code
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Look up an error by its wire code
    ///
    /// # Errors
    /// `ValueOutOfRange` for codes outside 0..=8
    pub fn from_code(code: i64) -> DecodeResult<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| {
                DecodeError::ValueOutOfRange(format!("Unknown password policy error code {}", code))
            })
    }
}

impl fmt::Display for PasswordPolicyErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warning_type: Option<PasswordPolicyWarningType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warning_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_type: Option<PasswordPolicyErrorType>,
}

const PAYLOAD_FIELDS: &[&str] = &["warning-type", "warning-value", "error-type"];

/// Password policy response control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicyResponseControl {
    critical: bool,
    warning: Option<PasswordPolicyWarning>,
    error: Option<PasswordPolicyErrorType>,
    source: SourceValue,
}

impl PasswordPolicyResponseControl {
    /// Create a non-critical response control
    pub fn new(warning: Option<PasswordPolicyWarning>, error: Option<PasswordPolicyErrorType>) -> Self {
        Self {
            critical: false,
            warning,
            error,
            source: SourceValue::none(),
        }
    }

    pub fn with_criticality(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn warning(&self) -> Option<PasswordPolicyWarning> {
        self.warning
    }

    pub fn error(&self) -> Option<PasswordPolicyErrorType> {
        self.error
    }
}

impl TypedElement for PasswordPolicyResponseControl {
    type Envelope = Control;
    const OID: &'static str = "1.3.6.1.4.1.42.2.27.8.5.1";
    const NAME: &'static str = "Password Policy Response Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        let element = decode_value_element(control, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 0, 2, Self::NAME)?;

        let mut warning = None;
        let mut error = None;
        for child in children {
            match child.tag() {
                WARNING_TAG if warning.is_none() && error.is_none() => {
                    warning = Some(PasswordPolicyWarning::from_element(child)?);
                }
                ERROR_TAG if error.is_none() => {
                    let code = child
                        .as_enumerated()
                        .map_err(|e| e.context("Password policy error"))?;
                    error = Some(PasswordPolicyErrorType::from_code(code)?);
                }
                _ => return Err(unexpected_element(child, Self::NAME)),
            }
        }

        Ok(Self {
            critical: control.is_critical(),
            warning,
            error,
            source: SourceValue::of(control),
        })
    }

    fn to_envelope(&self) -> Control {
        let value = self.source.or_encode(|| {
            let mut children = Vec::with_capacity(2);
            if let Some(warning) = self.warning {
                children.push(warning.to_element());
            }
            if let Some(error) = self.error {
                children.push(BerElement::enumerated(error.code()).with_context_tag(1));
            }
            Some(element_value(&BerElement::sequence(children)))
        });
        Control::new(Self::OID, self.critical, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&Payload {
            warning_type: self.warning.map(|w| w.warning_type),
            warning_value: self.warning.map(|w| i64::from(w.value)),
            error_type: self.error,
        })
    }

    fn decode_json_value(header: &Control, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: Payload = from_payload(value, PAYLOAD_FIELDS, strict, Self::NAME)?;
        let warning = match (payload.warning_type, payload.warning_value) {
            (Some(warning_type), Some(value)) => {
                let value = i32::try_from(value).ok().filter(|v| *v >= 0).ok_or_else(|| {
                    DecodeError::ValueOutOfRange(format!(
                        "Password policy warning value {} out of range",
                        value
                    ))
                })?;
                Some(PasswordPolicyWarning {
                    warning_type,
                    value,
                })
            }
            (None, None) => None,
            _ => {
                return Err(DecodeError::Decoding(
                    "Password policy warning-type and warning-value must appear together".to_string(),
                ));
            }
        };
        Ok(Self::new(warning, payload.error_type).with_criticality(header.is_critical()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ldap_core::DecodeErrorKind;
    use ldap_protocol::json;
    use serde_json::json;

    fn with_value(value: &BerElement) -> Control {
        Control::new(PasswordPolicyResponseControl::OID, false, Some(element_value(value)))
    }

    fn decode(value: &BerElement) -> DecodeResult<PasswordPolicyResponseControl> {
        PasswordPolicyResponseControl::decode_envelope(&with_value(value))
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            PasswordPolicyResponseControl::new(None, None),
            PasswordPolicyResponseControl::new(
                Some(PasswordPolicyWarning::time_before_expiration(300)),
                None,
            ),
            PasswordPolicyResponseControl::new(
                Some(PasswordPolicyWarning::grace_logins_remaining(2)),
                Some(PasswordPolicyErrorType::ChangeAfterReset),
            ),
            PasswordPolicyResponseControl::new(None, Some(PasswordPolicyErrorType::PasswordInHistory))
                .with_criticality(true),
        ];
        for control in cases {
            let bytes = control.to_envelope().encode_to_bytes();
            let decoded = PasswordPolicyResponseControl::decode_envelope(
                &Control::decode_from_bytes(&bytes).unwrap(),
            )
            .unwrap();
            assert_eq!(decoded, control);
        }
    }

    #[test]
    fn test_value_layout() {
        let control = PasswordPolicyResponseControl::new(
            Some(PasswordPolicyWarning::time_before_expiration(300)),
            Some(PasswordPolicyErrorType::AccountLocked),
        );
        assert_eq!(
            control.to_envelope().value().unwrap().as_ref(),
            &[0x30, 0x09, 0xA0, 0x04, 0x80, 0x02, 0x01, 0x2C, 0x81, 0x01, 0x01]
        );
    }

    #[test]
    fn test_received_value_kept() {
        // 300 seconds with a redundant leading zero byte
        let received = Control::new(
            PasswordPolicyResponseControl::OID,
            true,
            Some(Bytes::from_static(&[0x30, 0x07, 0xA0, 0x05, 0x80, 0x03, 0x00, 0x01, 0x2C])),
        );
        let decoded = PasswordPolicyResponseControl::decode_envelope(&received).unwrap();
        assert_eq!(
            decoded,
            PasswordPolicyResponseControl::new(
                Some(PasswordPolicyWarning::time_before_expiration(300)),
                None
            )
            .with_criticality(true)
        );
        assert_eq!(decoded.to_envelope(), received);
    }

    #[test]
    fn test_out_of_range_values() {
        let unknown_error = BerElement::sequence(vec![BerElement::enumerated(9).with_context_tag(1)]);
        assert_eq!(decode(&unknown_error).unwrap_err().kind(), DecodeErrorKind::ValueOutOfRange);

        let negative_error = BerElement::sequence(vec![BerElement::enumerated(-1).with_context_tag(1)]);
        assert_eq!(decode(&negative_error).unwrap_err().kind(), DecodeErrorKind::ValueOutOfRange);

        let negative_warning = BerElement::sequence(vec![BerElement::constructed(
            WARNING_TAG,
            vec![BerElement::integer(-5).with_context_tag(0)],
        )]);
        assert_eq!(decode(&negative_warning).unwrap_err().kind(), DecodeErrorKind::ValueOutOfRange);
    }

    #[test]
    fn test_malformed_values() {
        let missing = Control::new(PasswordPolicyResponseControl::OID, false, None);
        assert_eq!(
            PasswordPolicyResponseControl::decode_envelope(&missing).unwrap_err().kind(),
            DecodeErrorKind::MissingValue
        );

        let bad_choice = BerElement::sequence(vec![BerElement::constructed(
            WARNING_TAG,
            vec![BerElement::integer(5).with_context_tag(2)],
        )]);
        assert_eq!(decode(&bad_choice).unwrap_err().kind(), DecodeErrorKind::InvalidElementType);

        let reversed = BerElement::sequence(vec![
            BerElement::enumerated(1).with_context_tag(1),
            BerElement::constructed(WARNING_TAG, vec![BerElement::integer(5).with_context_tag(0)]),
        ]);
        assert_eq!(decode(&reversed).unwrap_err().kind(), DecodeErrorKind::InvalidElementType);

        let too_many = BerElement::sequence(vec![
            BerElement::enumerated(1).with_context_tag(1),
            BerElement::enumerated(1).with_context_tag(1),
            BerElement::enumerated(1).with_context_tag(1),
        ]);
        assert_eq!(decode(&too_many).unwrap_err().kind(), DecodeErrorKind::InvalidElementCount);

        let empty_choice = BerElement::sequence(vec![BerElement::constructed(WARNING_TAG, vec![])]);
        assert_eq!(decode(&empty_choice).unwrap_err().kind(), DecodeErrorKind::InvalidElementCount);
    }

    #[test]
    fn test_json_round_trip() {
        let control = PasswordPolicyResponseControl::new(
            Some(PasswordPolicyWarning::grace_logins_remaining(3)),
            Some(PasswordPolicyErrorType::PasswordExpired),
        );
        let document = json::encode_typed(&control);
        assert_eq!(
            document["value-json"],
            json!({
                "warning-type": "grace-logins-remaining",
                "warning-value": 3,
                "error-type": "password-expired"
            })
        );
        assert_eq!(
            json::decode_typed::<PasswordPolicyResponseControl>(&document, true).unwrap(),
            control
        );
    }

    #[test]
    fn test_json_rejects_bad_payloads() {
        let half_warning = json!({
            "oid": PasswordPolicyResponseControl::OID,
            "criticality": false,
            "value-json": { "warning-type": "time-before-expiration" }
        });
        assert_eq!(
            json::decode_typed::<PasswordPolicyResponseControl>(&half_warning, false)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::DecodingError
        );

        let negative = json!({
            "oid": PasswordPolicyResponseControl::OID,
            "criticality": false,
            "value-json": { "warning-type": "time-before-expiration", "warning-value": -1 }
        });
        assert_eq!(
            json::decode_typed::<PasswordPolicyResponseControl>(&negative, false)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn test_error_codes() {
        for (code, error) in PasswordPolicyErrorType::ALL.iter().enumerate() {
            assert_eq!(PasswordPolicyErrorType::from_code(code as i64).unwrap(), *error);
            assert_eq!(error.code(), code as i64);
        }
        assert_eq!(
            PasswordPolicyErrorType::AccountLocked.to_string(),
            "AccountLocked (1)"
        );
    }

    #[test]
    #[should_panic(expected = "must not be negative")]
    fn test_negative_warning_panics() {
        let _ = PasswordPolicyWarning::time_before_expiration(-1);
    }
}
