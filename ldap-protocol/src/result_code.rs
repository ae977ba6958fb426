//! LDAP result codes
//!
//! Result codes are carried through unchanged: a code this table does not
//! know is still a valid `ResultCode`, it just has no name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// LDAP result code (RFC 4511 section 4.1.9 plus common extensions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(i32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const OPERATIONS_ERROR: ResultCode = ResultCode(1);
    pub const PROTOCOL_ERROR: ResultCode = ResultCode(2);
    pub const TIME_LIMIT_EXCEEDED: ResultCode = ResultCode(3);
    pub const SIZE_LIMIT_EXCEEDED: ResultCode = ResultCode(4);
    pub const COMPARE_FALSE: ResultCode = ResultCode(5);
    pub const COMPARE_TRUE: ResultCode = ResultCode(6);
    pub const AUTH_METHOD_NOT_SUPPORTED: ResultCode = ResultCode(7);
    pub const STRONGER_AUTH_REQUIRED: ResultCode = ResultCode(8);
    pub const REFERRAL: ResultCode = ResultCode(10);
    pub const ADMIN_LIMIT_EXCEEDED: ResultCode = ResultCode(11);
    pub const UNAVAILABLE_CRITICAL_EXTENSION: ResultCode = ResultCode(12);
    pub const CONFIDENTIALITY_REQUIRED: ResultCode = ResultCode(13);
    pub const SASL_BIND_IN_PROGRESS: ResultCode = ResultCode(14);
    pub const NO_SUCH_ATTRIBUTE: ResultCode = ResultCode(16);
    pub const UNDEFINED_ATTRIBUTE_TYPE: ResultCode = ResultCode(17);
    pub const INAPPROPRIATE_MATCHING: ResultCode = ResultCode(18);
    pub const CONSTRAINT_VIOLATION: ResultCode = ResultCode(19);
    pub const ATTRIBUTE_OR_VALUE_EXISTS: ResultCode = ResultCode(20);
    pub const INVALID_ATTRIBUTE_SYNTAX: ResultCode = ResultCode(21);
    pub const NO_SUCH_OBJECT: ResultCode = ResultCode(32);
    pub const ALIAS_PROBLEM: ResultCode = ResultCode(33);
    pub const INVALID_DN_SYNTAX: ResultCode = ResultCode(34);
    pub const ALIAS_DEREFERENCING_PROBLEM: ResultCode = ResultCode(36);
    pub const INAPPROPRIATE_AUTHENTICATION: ResultCode = ResultCode(48);
    pub const INVALID_CREDENTIALS: ResultCode = ResultCode(49);
    pub const INSUFFICIENT_ACCESS_RIGHTS: ResultCode = ResultCode(50);
    pub const BUSY: ResultCode = ResultCode(51);
    pub const UNAVAILABLE: ResultCode = ResultCode(52);
    pub const UNWILLING_TO_PERFORM: ResultCode = ResultCode(53);
    pub const LOOP_DETECT: ResultCode = ResultCode(54);
    pub const NAMING_VIOLATION: ResultCode = ResultCode(64);
    pub const OBJECT_CLASS_VIOLATION: ResultCode = ResultCode(65);
    pub const NOT_ALLOWED_ON_NONLEAF: ResultCode = ResultCode(66);
    pub const NOT_ALLOWED_ON_RDN: ResultCode = ResultCode(67);
    pub const ENTRY_ALREADY_EXISTS: ResultCode = ResultCode(68);
    pub const OBJECT_CLASS_MODS_PROHIBITED: ResultCode = ResultCode(69);
    pub const AFFECTS_MULTIPLE_DSAS: ResultCode = ResultCode(71);
    pub const OTHER: ResultCode = ResultCode(80);
    pub const CANCELED: ResultCode = ResultCode(118);
    pub const NO_SUCH_OPERATION: ResultCode = ResultCode(119);
    pub const TOO_LATE: ResultCode = ResultCode(120);
    pub const CANNOT_CANCEL: ResultCode = ResultCode(121);
    pub const ASSERTION_FAILED: ResultCode = ResultCode(122);
    pub const AUTHORIZATION_DENIED: ResultCode = ResultCode(123);
    pub const NO_OPERATION: ResultCode = ResultCode(16654);

    /// Wrap a raw result code
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw integer value
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Check for `SUCCESS`
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Get the standard name of the result code, if it has one
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "success",
            1 => "operations error",
            2 => "protocol error",
            3 => "time limit exceeded",
            4 => "size limit exceeded",
            5 => "compare false",
            6 => "compare true",
            7 => "auth method not supported",
            8 => "stronger auth required",
            10 => "referral",
            11 => "admin limit exceeded",
            12 => "unavailable critical extension",
            13 => "confidentiality required",
            14 => "sasl bind in progress",
            16 => "no such attribute",
            17 => "undefined attribute type",
            18 => "inappropriate matching",
            19 => "constraint violation",
            20 => "attribute or value exists",
            21 => "invalid attribute syntax",
            32 => "no such object",
            33 => "alias problem",
            34 => "invalid DN syntax",
            36 => "alias dereferencing problem",
            48 => "inappropriate authentication",
            49 => "invalid credentials",
            50 => "insufficient access rights",
            51 => "busy",
            52 => "unavailable",
            53 => "unwilling to perform",
            54 => "loop detect",
            64 => "naming violation",
            65 => "object class violation",
            66 => "not allowed on nonleaf",
            67 => "not allowed on RDN",
            68 => "entry already exists",
            69 => "object class mods prohibited",
            71 => "affects multiple DSAs",
            80 => "other",
            118 => "canceled",
            119 => "no such operation",
            120 => "too late",
            121 => "cannot cancel",
            122 => "assertion failed",
            123 => "authorization denied",
            16654 => "no operation",
            _ => return None,
        };
        Some(name)
    }
}

impl From<i32> for ResultCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(ResultCode::SUCCESS.name(), Some("success"));
        assert_eq!(ResultCode::UNWILLING_TO_PERFORM.name(), Some("unwilling to perform"));
        assert_eq!(ResultCode::new(4242).name(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResultCode::NO_SUCH_OBJECT.to_string(), "32 (no such object)");
        assert_eq!(ResultCode::new(-7).to_string(), "-7");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let code = ResultCode::from(9999);
        assert_eq!(i32::from(code), 9999);
        assert!(!code.is_success());
        assert!(ResultCode::SUCCESS.is_success());
    }
}
