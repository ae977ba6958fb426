//! Common behavior of protocol envelopes
//!
//! Controls, extended requests, extended results and intermediate responses
//! all share one shape: an OID naming the semantic type plus an optional
//! opaque payload. Typed elements are built on top of that shape, so the
//! helpers here are what every typed decoder starts with.

use bytes::Bytes;
use ldap_asn1::BerElement;
use ldap_core::{DecodeError, DecodeResult};
use std::fmt;

/// An OID-addressed protocol element carrying an optional opaque value
pub trait Envelope: Clone + fmt::Debug + PartialEq {
    /// Short lowercase name used in diagnostics ("control", "extended request", ...)
    const KIND: &'static str;

    /// OID identifying the semantic type, if the envelope carries one
    fn oid(&self) -> Option<&str>;

    /// Encoded payload; `None` is distinct from an empty payload
    fn value(&self) -> Option<&Bytes>;

    /// Copy of this envelope with the payload replaced
    fn with_value(&self, value: Option<Bytes>) -> Self;
}

/// Check that an envelope names the expected OID
///
/// # Errors
/// `Decoding` if the OID is absent or different
pub fn check_oid<E: Envelope>(envelope: &E, expected: &str, name: &str) -> DecodeResult<()> {
    match envelope.oid() {
        Some(oid) if oid == expected => Ok(()),
        Some(oid) => Err(DecodeError::Decoding(format!(
            "Cannot decode {} {} as {} (expected OID {})",
            E::KIND,
            oid,
            name,
            expected
        ))),
        None => Err(DecodeError::Decoding(format!(
            "Cannot decode {} without an OID as {}",
            E::KIND,
            name
        ))),
    }
}

/// Get the payload of an envelope that requires one
///
/// # Errors
/// `MissingValue` if the envelope has no payload
pub fn require_value<'a, E: Envelope>(envelope: &'a E, name: &str) -> DecodeResult<&'a Bytes> {
    envelope
        .value()
        .ok_or_else(|| DecodeError::MissingValue(format!("{} requires a value", name)))
}

/// Check that an envelope carries no payload
///
/// # Errors
/// `Decoding` if a payload is present
pub fn forbid_value<E: Envelope>(envelope: &E, name: &str) -> DecodeResult<()> {
    match envelope.value() {
        Some(_) => Err(DecodeError::Decoding(format!("{} must not have a value", name))),
        None => Ok(()),
    }
}

/// Decode the payload of an envelope as exactly one BER element
///
/// # Errors
/// - `MissingValue` if the envelope has no payload
/// - any BER decode error, prefixed with `name`
pub fn decode_value_element<E: Envelope>(envelope: &E, name: &str) -> DecodeResult<BerElement> {
    let value = require_value(envelope, name)?;
    BerElement::decode_exact(value).map_err(|e| e.context(name))
}

/// Encode a BER element as an envelope payload
pub fn element_value(element: &BerElement) -> Bytes {
    Bytes::from(element.encode())
}

/// Payload a typed element was decoded from
///
/// Converting a decoded element back to its envelope returns these bytes
/// unchanged, so a peer's non-canonical encoding survives a typed round
/// trip. Elements built from their fields keep nothing and encode from the
/// fields. Equality ignores the kept bytes: elements with the same fields are
/// equal whatever encoding they arrived in.
#[derive(Debug, Clone, Default)]
pub struct SourceValue(Option<Option<Bytes>>);

impl SourceValue {
    /// Nothing received; the value is encoded from the element's fields
    pub fn none() -> Self {
        Self(None)
    }

    /// Keep the payload of a received envelope, including its absence
    pub fn of<E: Envelope>(envelope: &E) -> Self {
        Self(Some(envelope.value().cloned()))
    }

    /// Check if a received payload is kept
    pub fn is_kept(&self) -> bool {
        self.0.is_some()
    }

    /// The received payload, or `encode()` if nothing was received
    pub fn or_encode(&self, encode: impl FnOnce() -> Option<Bytes>) -> Option<Bytes> {
        match &self.0 {
            Some(value) => value.clone(),
            None => encode(),
        }
    }
}

impl PartialEq for SourceValue {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for SourceValue {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;

    #[test]
    fn test_source_value_kept() {
        let received = Control::new("1.2.3.4", false, Some(Bytes::from_static(b"\x02\x02\x00\x05")));
        let source = SourceValue::of(&received);
        assert!(source.is_kept());
        assert_eq!(
            source.or_encode(|| Some(element_value(&BerElement::integer(5)))),
            received.value().cloned()
        );

        let absent = SourceValue::of(&Control::new("1.2.3.4", false, None));
        assert_eq!(absent.or_encode(|| Some(Bytes::from_static(b"\x05\x00"))), None);
    }

    #[test]
    fn test_source_value_built_from_fields() {
        let source = SourceValue::none();
        assert!(!source.is_kept());
        assert_eq!(
            source.or_encode(|| Some(element_value(&BerElement::integer(5)))),
            Some(Bytes::from_static(b"\x02\x01\x05"))
        );
        assert_eq!(source, SourceValue::of(&Control::new("1.2.3.4", false, None)));
    }
}
