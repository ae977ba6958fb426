//! ldap - protocol element encoding for LDAP
//!
//! This library provides the encoding core of an LDAP SDK: BER encoding of
//! protocol elements, the generic envelopes for controls and extended
//! operations, OID-based dispatch to typed elements, and a JSON document
//! form of the same elements.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ldap-core`: Error taxonomy, decode behavior, OIDs
//! - `ldap-asn1`: BER value tree, encoder, decoder, async stream reader
//! - `ldap-protocol`: Envelopes, result codes, typed-element registry, JSON codec
//! - `ldap-extensions`: Typed controls, extended operations and intermediate responses
//!
//! # Usage
//!
//! ```rust
//! use ldap::json;
//! use ldap::protocol::{Control, TypedElement};
//! use ldap::extensions::{control_registry, KnownControl, ManageDsaItRequestControl};
//!
//! let control = ManageDsaItRequestControl::with_criticality(true);
//! let document = json::encode_typed(&control);
//!
//! let generic: Control = json::decode_generic(&document, control_registry(), true)?;
//! assert_eq!(
//!     control_registry().decode(&generic)?,
//!     KnownControl::ManageDsaIt(control)
//! );
//! # Ok::<(), ldap::DecodeError>(())
//! ```

// Re-export core types
pub use ldap_core::{
    DecodeBehavior, DecodeError, DecodeErrorKind, DecodeResult, LdapError, LdapResult, Oid,
};

// Re-export the JSON codec
pub use ldap_protocol::json;

// Re-export BER encoding
pub mod ber {
    pub use ldap_asn1::*;
}

// Re-export envelopes and dispatch
pub mod protocol {
    pub use ldap_protocol::*;
}

// Re-export typed elements
pub mod extensions {
    pub use ldap_extensions::*;
}
