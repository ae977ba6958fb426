use crate::error::{DecodeError, DecodeResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static NUMERIC_OID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))+$").expect("valid regex"));

/// Numeric object identifier (dotted-decimal form)
///
/// LDAP carries OIDs as strings (`LDAPOID ::= OCTET STRING`), so envelopes keep
/// them as `String` and accept whatever a peer sends. `Oid` is the validated
/// form used where strictness is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid {
    text: String,
}

impl Oid {
    /// Parse a numeric OID
    ///
    /// Accepts "1.2.840.113556.1.4.319". Rejects leading zeros in a component,
    /// empty components, fewer than two components, a first arc above 2, and a
    /// second arc above 39 under the first arcs 0 and 1.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Oid)` if parsing succeeds, `Err(DecodeError::ValueOutOfRange)` otherwise
    pub fn parse(s: &str) -> DecodeResult<Self> {
        if !NUMERIC_OID.is_match(s) {
            return Err(DecodeError::ValueOutOfRange(format!(
                "Invalid numeric OID: {:?}",
                s
            )));
        }

        let components = Self::split(s)?;
        match components[0] {
            0 | 1 if components[1] > 39 => Err(DecodeError::ValueOutOfRange(format!(
                "Invalid numeric OID: {:?} (second arc must be at most 39)",
                s
            ))),
            0..=2 => Ok(Self { text: s.to_string() }),
            _ => Err(DecodeError::ValueOutOfRange(format!(
                "Invalid numeric OID: {:?} (first arc must be 0, 1 or 2)",
                s
            ))),
        }
    }

    /// Check whether a string is a valid numeric OID
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    fn split(s: &str) -> DecodeResult<Vec<u64>> {
        s.split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    DecodeError::ValueOutOfRange(format!("OID component too large: {}", part))
                })
            })
            .collect()
    }

    /// Get the OID components
    pub fn components(&self) -> Vec<u64> {
        // Validated at construction.
        self.text
            .split('.')
            .filter_map(|p| p.parse::<u64>().ok())
            .collect()
    }

    /// Get the dotted-decimal text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for Oid {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.text
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
