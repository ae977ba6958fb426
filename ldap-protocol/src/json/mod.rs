//! JSON document codec for protocol envelopes
//!
//! A human-readable encoding of the same envelopes the BER codec handles,
//! used for logging, tooling and interchange. It runs independently of the
//! binary path but reuses the same typed validation: a structured payload is
//! checked with the same [`DecodeError`](ldap_core::DecodeError) taxonomy as a
//! BER payload.
//!
//! # Strictness
//!
//! With `strict` set, unknown keys (at the document level or inside a
//! structured payload) are rejected with `UnrecognizedField` and OIDs must be
//! numeric. Without it, unknown keys are ignored.
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_protocol::json;
//! use ldap_protocol::{Control, Registry};
//!
//! let registry: Registry<Control, Control> = Registry::new();
//! let control = Control::new("1.2.3.4", false, None);
//! let document = json::encode_generic(&control, &registry);
//! assert_eq!(document.to_string(), r#"{"control-name":"1.2.3.4","criticality":false,"oid":"1.2.3.4"}"#);
//! assert_eq!(json::decode_generic(&document, &registry, true)?, control);
//! # Ok::<(), ldap_core::DecodeError>(())
//! ```

pub mod document;
pub mod payload;

pub use document::{JsonEnvelope, ParsedDocument};

use crate::envelope::Envelope;
use crate::registry::{Registry, TypedElement};
use ldap_core::{DecodeError, DecodeResult};
use serde_json::Value;

/// Encode a generic envelope
///
/// The display name is the registered name of the OID, or the OID itself if
/// it is not registered. The payload is structured if the OID's typed element
/// supports it and accepts the payload, base64 otherwise.
pub fn encode_generic<E, T>(envelope: &E, registry: &Registry<E, T>) -> Value
where
    E: JsonEnvelope,
    T: From<E>,
{
    let name = envelope
        .oid()
        .map(|oid| registry.name(oid).unwrap_or(oid));
    let value_json = match envelope.value() {
        Some(_) => registry.json_value(envelope),
        None => None,
    };
    envelope.to_document(name, value_json)
}

/// Encode a typed element
///
/// Falls back to base64 when the element has no structured form.
pub fn encode_typed<X>(element: &X) -> Value
where
    X: TypedElement,
    X::Envelope: JsonEnvelope,
{
    let envelope = element.to_envelope();
    let value_json = match envelope.value() {
        Some(_) => element.to_json_value(),
        None => None,
    };
    envelope.to_document(Some(X::NAME), value_json)
}

/// Decode a document into a generic envelope
///
/// A structured payload is converted back to its BER form through the
/// registry, so the result is the same envelope a base64 payload would give.
///
/// # Errors
/// Document-level errors as [`JsonEnvelope::parse_document`]; `Decoding` for a
/// structured payload on an OID without a structured decoder; typed
/// validation errors from the structured decoder.
pub fn decode_generic<E, T>(document: &Value, registry: &Registry<E, T>, strict: bool) -> DecodeResult<E>
where
    E: JsonEnvelope,
    T: From<E>,
{
    let parsed = E::parse_document(document, strict)?;
    match parsed.value_json {
        Some(value) => registry.json_to_envelope(&parsed.envelope, &value, strict),
        None => Ok(parsed.envelope),
    }
}

/// Decode a document directly into a known typed element
///
/// # Errors
/// As [`decode_generic`], plus `Decoding` if the document names another OID
pub fn decode_typed<X>(document: &Value, strict: bool) -> DecodeResult<X>
where
    X: TypedElement,
    X::Envelope: JsonEnvelope,
{
    let parsed = <X::Envelope as JsonEnvelope>::parse_document(document, strict)?;
    match parsed.value_json {
        Some(value) => X::decode_json_value(&parsed.envelope, &value, strict),
        None => X::decode_envelope(&parsed.envelope),
    }
}

/// Decode a document and dispatch it through a registry
///
/// Unregistered OIDs come back as the generic variant, unless they carry a
/// structured payload (which cannot be interpreted without a decoder).
pub fn decode_registered<E, T>(document: &Value, registry: &Registry<E, T>, strict: bool) -> DecodeResult<T>
where
    E: JsonEnvelope,
    T: From<E>,
{
    let parsed = E::parse_document(document, strict)?;
    match parsed.value_json {
        Some(value) => registry.decode_json_value(&parsed.envelope, &value, strict),
        None => registry.decode(&parsed.envelope),
    }
}

/// Parse JSON text into a document value
///
/// # Errors
/// `Decoding` if the text is not valid JSON
pub fn parse_text(text: &str) -> DecodeResult<Value> {
    serde_json::from_str(text).map_err(|e| DecodeError::Decoding(format!("Invalid JSON: {}", e)))
}
