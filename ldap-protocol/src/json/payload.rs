//! Helpers for the structured (`value-json`) payload of typed elements
//!
//! Typed elements describe their payload as a serde struct and list the keys
//! it may contain. Unknown keys are rejected in strict mode and ignored
//! otherwise, the same rule the envelope documents follow.

use base64::{engine::general_purpose::STANDARD, Engine};
use ldap_core::{DecodeError, DecodeResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Check that a payload is an object and (in strict mode) has only known keys
///
/// # Errors
/// - `Decoding` if the payload is not a JSON object
/// - `UnrecognizedField` for an unknown key when `strict` is set
pub fn check_fields<'a>(
    value: &'a Value,
    allowed: &[&str],
    strict: bool,
    what: &str,
) -> DecodeResult<&'a Map<String, Value>> {
    let object = value.as_object().ok_or_else(|| {
        DecodeError::Decoding(format!("{} value must be a JSON object", what))
    })?;
    if strict {
        if let Some(key) = object.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(DecodeError::UnrecognizedField(format!(
                "Unrecognized field '{}' in {} value",
                key, what
            )));
        }
    }
    Ok(object)
}

/// Deserialize a structured payload after checking its keys
///
/// # Errors
/// As [`check_fields`], plus `Decoding` for a missing required field or a
/// field of the wrong JSON type
pub fn from_payload<P: DeserializeOwned>(
    value: &Value,
    allowed: &[&str],
    strict: bool,
    what: &str,
) -> DecodeResult<P> {
    check_fields(value, allowed, strict, what)?;
    serde_json::from_value(value.clone())
        .map_err(|e| DecodeError::Decoding(format!("Invalid {} value: {}", what, e)))
}

/// Serialize a structured payload
///
/// Returns `None` if the payload cannot be represented as JSON.
pub fn to_payload<P: Serialize>(payload: &P) -> Option<Value> {
    serde_json::to_value(payload).ok()
}

/// Encode binary data for a `*-base64` field
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a `*-base64` field
///
/// # Errors
/// `Decoding` if the text is not valid base64
pub fn decode_base64(text: &str, what: &str) -> DecodeResult<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| DecodeError::Decoding(format!("Invalid base64 in {}: {}", what, e)))
}
