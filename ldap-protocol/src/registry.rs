//! Typed-element registry and OID dispatch
//!
//! A generic envelope is upgraded to a typed element by looking up its OID.
//! The caller decides what "typed" means by supplying a tagged union `T` with
//! one variant per known element and a fallback variant for the generic
//! envelope (`T: From<E>`). An OID that is not registered is not an error:
//! the envelope comes back unchanged in the fallback variant, so newer peers
//! can send extensions this library has never heard of.
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_core::{DecodeError, DecodeResult};
//! use ldap_protocol::{Control, Registry, TypedElement};
//!
//! #[derive(Debug, PartialEq)]
//! struct Ping;
//!
//! impl TypedElement for Ping {
//!     type Envelope = Control;
//!     const OID: &'static str = "1.2.3.4";
//!     const NAME: &'static str = "Ping";
//!
//!     fn decode_envelope(control: &Control) -> DecodeResult<Self> {
//!         ldap_protocol::envelope::check_oid(control, Self::OID, Self::NAME)?;
//!         ldap_protocol::envelope::forbid_value(control, Self::NAME)?;
//!         Ok(Ping)
//!     }
//!
//!     fn to_envelope(&self) -> Control {
//!         Control::new(Self::OID, false, None)
//!     }
//! }
//!
//! #[derive(Debug, PartialEq)]
//! enum Known {
//!     Ping(Ping),
//!     Generic(Control),
//! }
//!
//! impl From<Ping> for Known {
//!     fn from(p: Ping) -> Self { Known::Ping(p) }
//! }
//! impl From<Control> for Known {
//!     fn from(c: Control) -> Self { Known::Generic(c) }
//! }
//!
//! let registry: Registry<Control, Known> = Registry::new().with::<Ping>();
//! assert_eq!(registry.decode(&Control::new("1.2.3.4", false, None))?, Known::Ping(Ping));
//! assert!(matches!(
//!     registry.decode(&Control::new("1.9", false, None))?,
//!     Known::Generic(_)
//! ));
//! # Ok::<(), DecodeError>(())
//! ```

use crate::envelope::Envelope;
use ldap_core::{DecodeError, DecodeResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A strongly-typed reconstruction of one OID's envelope
pub trait TypedElement: Sized {
    /// Envelope kind this element is carried in
    type Envelope: Envelope;

    /// OID claimed by this element
    const OID: &'static str;

    /// Human-readable name, used as the display name in JSON documents
    const NAME: &'static str;

    /// Decode from a generic envelope, validating the payload shape
    fn decode_envelope(envelope: &Self::Envelope) -> DecodeResult<Self>;

    /// Convert back to a generic envelope (byte-identical to what was decoded)
    fn to_envelope(&self) -> Self::Envelope;

    /// Structured form of the payload, if this element supports one
    fn to_json_value(&self) -> Option<Value> {
        None
    }

    /// Decode from an envelope header plus a structured payload
    ///
    /// `header` carries everything except the payload (OID, criticality,
    /// result fields). The default rejects structured payloads.
    fn decode_json_value(header: &Self::Envelope, value: &Value, strict: bool) -> DecodeResult<Self> {
        let _ = (header, value, strict);
        Err(DecodeError::Decoding(format!(
            "{} does not support a structured value",
            Self::NAME
        )))
    }
}

/// Binary decoder stored in a registry entry
pub type DecodeFn<E, T> = fn(&E) -> DecodeResult<T>;

/// Structured decoder stored in a registry entry
pub type DecodeJsonFn<E, T> = fn(&E, &Value, bool) -> DecodeResult<T>;

struct Entry<E, T> {
    name: String,
    decode: DecodeFn<E, T>,
    decode_json: Option<DecodeJsonFn<E, T>>,
    json_envelope: Option<DecodeJsonFn<E, E>>,
    to_json: Option<fn(&E) -> Option<Value>>,
}

/// OID-keyed registry of typed decoders
///
/// Built once, then only read: decoding never mutates the registry, so a
/// registry can be shared freely between threads (e.g. in a `Lazy` static).
pub struct Registry<E, T> {
    entries: HashMap<String, Entry<E, T>>,
}

impl<E: Envelope, T: From<E>> Registry<E, T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a typed element
    ///
    /// # Panics
    /// Panics if the OID is already registered.
    pub fn with<X>(self) -> Self
    where
        X: TypedElement<Envelope = E>,
        T: From<X>,
    {
        self.insert(
            X::OID,
            Entry {
                name: X::NAME.to_string(),
                decode: decode_typed::<X, T>,
                decode_json: Some(decode_json_typed::<X, T>),
                json_envelope: Some(decode_json_envelope::<X>),
                to_json: Some(envelope_json_value::<X>),
            },
        )
    }

    /// Register a binary-only decoder for an OID
    ///
    /// This is how an operation layer adds its own vendor-specific entries
    /// without implementing [`TypedElement`].
    ///
    /// # Panics
    /// Panics if the OID is already registered.
    pub fn with_decoder(
        self,
        oid: impl Into<String>,
        name: impl Into<String>,
        decode: DecodeFn<E, T>,
    ) -> Self {
        let oid = oid.into();
        self.insert(
            &oid,
            Entry {
                name: name.into(),
                decode,
                decode_json: None,
                json_envelope: None,
                to_json: None,
            },
        )
    }

    fn insert(mut self, oid: &str, entry: Entry<E, T>) -> Self {
        assert!(
            !self.entries.contains_key(oid),
            "OID {} is already registered",
            oid
        );
        self.entries.insert(oid.to_string(), entry);
        self
    }

    /// Decode an envelope into its typed form
    ///
    /// # Returns
    /// The typed variant for a registered OID, the generic variant otherwise
    ///
    /// # Errors
    /// Whatever the registered decoder reports for a payload that does not
    /// match its schema
    pub fn decode(&self, envelope: &E) -> DecodeResult<T> {
        match self.entry(envelope) {
            Some(entry) => (entry.decode)(envelope),
            None => {
                log::debug!(
                    "No typed decoder for {} {:?}, keeping generic form",
                    E::KIND,
                    envelope.oid()
                );
                Ok(T::from(envelope.clone()))
            }
        }
    }

    /// Decode an envelope header plus structured payload into its typed form
    ///
    /// # Errors
    /// `Decoding` if the OID has no structured decoder
    pub fn decode_json_value(&self, header: &E, value: &Value, strict: bool) -> DecodeResult<T> {
        match self.entry(header).and_then(|e| e.decode_json) {
            Some(decode) => decode(header, value, strict),
            None => Err(self.no_structured_decoder(header)),
        }
    }

    /// Rebuild the binary payload of an envelope from a structured payload
    ///
    /// # Errors
    /// `Decoding` if the OID has no structured decoder
    pub fn json_to_envelope(&self, header: &E, value: &Value, strict: bool) -> DecodeResult<E> {
        match self.entry(header).and_then(|e| e.json_envelope) {
            Some(decode) => decode(header, value, strict),
            None => Err(self.no_structured_decoder(header)),
        }
    }

    /// Structured form of an envelope's payload, if its OID supports one
    ///
    /// Returns `None` for unregistered OIDs and for payloads the typed
    /// decoder rejects.
    pub fn json_value(&self, envelope: &E) -> Option<Value> {
        self.entry(envelope).and_then(|e| e.to_json).and_then(|f| f(envelope))
    }

    /// Get the registered display name of an OID
    pub fn name(&self, oid: &str) -> Option<&str> {
        self.entries.get(oid).map(|e| e.name.as_str())
    }

    /// Check whether an OID is registered
    pub fn is_registered(&self, oid: &str) -> bool {
        self.entries.contains_key(oid)
    }

    /// Registered OIDs, sorted
    pub fn oids(&self) -> Vec<&str> {
        let mut oids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        oids.sort_unstable();
        oids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, envelope: &E) -> Option<&Entry<E, T>> {
        envelope.oid().and_then(|oid| self.entries.get(oid))
    }

    fn no_structured_decoder(&self, header: &E) -> DecodeError {
        DecodeError::Decoding(format!(
            "No structured value decoder for {} {}",
            E::KIND,
            header.oid().unwrap_or("<no OID>")
        ))
    }
}

impl<E: Envelope, T: From<E>> Default for Registry<E, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T> fmt::Debug for Registry<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut oids: Vec<&String> = self.entries.keys().collect();
        oids.sort_unstable();
        f.debug_struct("Registry").field("oids", &oids).finish()
    }
}

fn decode_typed<X, T>(envelope: &X::Envelope) -> DecodeResult<T>
where
    X: TypedElement,
    T: From<X>,
{
    X::decode_envelope(envelope).map(T::from)
}

fn decode_json_typed<X, T>(header: &X::Envelope, value: &Value, strict: bool) -> DecodeResult<T>
where
    X: TypedElement,
    T: From<X>,
{
    X::decode_json_value(header, value, strict).map(T::from)
}

fn decode_json_envelope<X: TypedElement>(
    header: &X::Envelope,
    value: &Value,
    strict: bool,
) -> DecodeResult<X::Envelope> {
    X::decode_json_value(header, value, strict).map(|x| x.to_envelope())
}

fn envelope_json_value<X: TypedElement>(envelope: &X::Envelope) -> Option<Value> {
    X::decode_envelope(envelope).ok().and_then(|x| x.to_json_value())
}
