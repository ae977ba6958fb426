//! BER encoder for ASN.1 structures
//!
//! This module provides encoding functionality for ASN.1 values using the BER
//! subset that LDAP uses (definite lengths only, minimal encodings).
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_asn1::ber::BerEncoder;
//!
//! let mut encoder = BerEncoder::new();
//! encoder.encode_integer(12345);
//! let bytes = encoder.into_bytes();
//! assert_eq!(bytes, vec![0x02, 0x02, 0x30, 0x39]);
//! ```

use crate::ber::element::{BerContent, BerElement};
use crate::ber::types::{universal, BerLength, BerTag};

/// BER encoder for ASN.1 structures
///
/// Each encoded value is a TLV (Tag-Length-Value) triplet appended to an
/// internal buffer. Encoding never fails: every in-memory value has exactly
/// one minimal definite-length encoding.
#[derive(Debug, Default)]
pub struct BerEncoder {
    buffer: Vec<u8>,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new BER encoder with initial capacity
    ///
    /// # Arguments
    /// * `capacity` - Initial buffer capacity in bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Arguments
    /// * `tag` - BER tag
    /// * `value` - Content bytes (already encoded)
    pub fn encode_tlv(&mut self, tag: &BerTag, value: &[u8]) {
        tag.encode_into(&mut self.buffer);
        BerLength::new(value.len()).encode_into(&mut self.buffer);
        self.buffer.extend_from_slice(value);
    }

    /// Encode a BOOLEAN (TRUE is 0xFF)
    pub fn encode_boolean(&mut self, value: bool) {
        let tag = BerTag::universal(false, universal::BOOLEAN);
        self.encode_tlv(&tag, &[if value { 0xFF } else { 0x00 }]);
    }

    /// Encode an INTEGER
    ///
    /// # Encoding Format
    /// - Tag: Universal, Primitive, tag 2
    /// - Value: minimal two's complement, big-endian (zero is a single 0x00)
    pub fn encode_integer(&mut self, value: i64) {
        let tag = BerTag::universal(false, universal::INTEGER);
        self.encode_tlv(&tag, &integer_content(value));
    }

    /// Encode an ENUMERATED (same content rules as INTEGER)
    pub fn encode_enumerated(&mut self, value: i64) {
        let tag = BerTag::universal(false, universal::ENUMERATED);
        self.encode_tlv(&tag, &integer_content(value));
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) {
        let tag = BerTag::universal(false, universal::OCTET_STRING);
        self.encode_tlv(&tag, value);
    }

    /// Encode a NULL
    pub fn encode_null(&mut self) {
        let tag = BerTag::universal(false, universal::NULL);
        self.encode_tlv(&tag, &[]);
    }

    /// Encode a SEQUENCE whose elements are already encoded
    ///
    /// # Arguments
    /// * `elements` - Concatenated element TLVs
    pub fn encode_sequence(&mut self, elements: &[u8]) {
        let tag = BerTag::universal(true, universal::SEQUENCE);
        self.encode_tlv(&tag, elements);
    }

    /// Encode a context-specific tag
    ///
    /// # Arguments
    /// * `tag_number` - Context-specific tag number
    /// * `value` - Encoded value bytes
    /// * `constructed` - Whether this is a constructed type
    pub fn encode_context_specific(&mut self, tag_number: u32, value: &[u8], constructed: bool) {
        let tag = BerTag::context_specific(constructed, tag_number);
        self.encode_tlv(&tag, value);
    }

    /// Encode an application tag
    ///
    /// LDAP protocol operations use application tags (ExtendedRequest is
    /// `[APPLICATION 23]`, ExtendedResponse `[APPLICATION 24]`).
    pub fn encode_application(&mut self, tag_number: u32, value: &[u8], constructed: bool) {
        let tag = BerTag::application(constructed, tag_number);
        self.encode_tlv(&tag, value);
    }

    /// Encode a complete element tree
    ///
    /// Children of constructed elements are encoded in their original order.
    pub fn encode_element(&mut self, element: &BerElement) {
        match element.content() {
            BerContent::Primitive(bytes) => self.encode_tlv(&element.tag(), bytes),
            BerContent::Constructed(children) => {
                let mut inner = BerEncoder::new();
                for child in children {
                    inner.encode_element(child);
                }
                self.encode_tlv(&element.tag(), inner.as_bytes());
            }
        }
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Minimal two's complement content bytes of an integer
///
/// Leading 0x00 / 0xFF bytes are dropped as long as the sign of the value is
/// still carried by the high bit of the next byte.
pub fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}
