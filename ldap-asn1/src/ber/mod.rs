//! BER (Basic Encoding Rules) encoder and decoder
//!
//! This module provides the BER value model used on the LDAP wire
//! (RFC 4511 section 5.1 restricts BER to definite lengths, minimal
//! encodings and primitive OCTET STRINGs).
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number** (5 bits): 0-30, or 11111 followed by the high-tag-number form
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form** (2-5 bytes): `0x80 | n` followed by `n` big-endian length bytes
//!
//! The indefinite form is not supported.
//!
//! ## Value Encoding
//!
//! - **Primitive types**: raw content bytes (INTEGER, OCTET STRING, BOOLEAN, ...)
//! - **Constructed types**: concatenated child TLVs (SEQUENCE, SET, tagged containers)
//!
//! # Decoding Untrusted Input
//!
//! Decoding never panics. Every declared length is checked against the bytes
//! that are actually available before anything is allocated, and nesting is
//! bounded by [`decoder::MAX_NESTING_DEPTH`].

pub mod decoder;
pub mod element;
pub mod encoder;
#[cfg(feature = "tokio")]
pub mod stream;
pub mod types;

pub use decoder::BerDecoder;
pub use element::{check_element_count, BerContent, BerElement};
pub use encoder::BerEncoder;
#[cfg(feature = "tokio")]
pub use stream::{BerStreamReader, StreamReaderConfig};
pub use types::{universal, BerLength, BerTag, BerTagClass};
