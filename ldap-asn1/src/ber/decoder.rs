//! BER decoder for ASN.1 structures
//!
//! This module provides decoding functionality for BER-encoded data.
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_asn1::ber::BerDecoder;
//!
//! let data = [0x02, 0x01, 0x05, 0x04, 0x02, b'h', b'i'];
//! let mut decoder = BerDecoder::new(&data);
//! assert_eq!(decoder.read_element()?.as_integer()?, 5);
//! assert_eq!(decoder.read_element()?.as_string()?, "hi");
//! assert!(!decoder.has_remaining());
//! # Ok::<(), ldap_core::DecodeError>(())
//! ```

use crate::ber::element::BerElement;
use crate::ber::types::{BerLength, BerTag};
use ldap_core::{DecodeError, DecodeResult};

/// Maximum nesting depth of constructed elements
///
/// Bounds recursion on attacker-controlled input.
pub const MAX_NESTING_DEPTH: usize = 64;

/// BER decoder over a byte slice
///
/// The decoder maintains a position that advances as elements are read, so
/// several consecutive elements can be decoded from one buffer. Every declared
/// length is checked against the bytes actually remaining before anything is
/// sliced or allocated.
pub struct BerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> BerDecoder<'a> {
    /// Create a new BER decoder
    ///
    /// # Arguments
    /// * `buffer` - Buffer containing BER-encoded data
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            depth: 0,
        }
    }

    fn nested(buffer: &'a [u8], depth: usize) -> Self {
        Self {
            buffer,
            position: 0,
            depth,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there is more data to decode
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Read multiple bytes from the buffer
    ///
    /// # Errors
    /// `MalformedLength` if the buffer doesn't have enough bytes
    fn read_bytes(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(DecodeError::MalformedLength(format!(
                "Declared length {} exceeds remaining {} bytes",
                count,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Decode a TLV (Tag-Length-Value) triplet
    ///
    /// # Returns
    /// Returns `Ok((tag, value_bytes, total_bytes_consumed))` if successful.
    /// The position is left unchanged on error.
    pub fn decode_tlv(&mut self) -> DecodeResult<(BerTag, &'a [u8], usize)> {
        let start_pos = self.position;
        let result = self.decode_tlv_inner();
        if result.is_err() {
            self.position = start_pos;
        }
        result.map(|(tag, value)| (tag, value, self.position - start_pos))
    }

    fn decode_tlv_inner(&mut self) -> DecodeResult<(BerTag, &'a [u8])> {
        let (tag, tag_bytes) = BerTag::decode(&self.buffer[self.position..])?;
        self.position += tag_bytes;

        let (length, length_bytes) = BerLength::decode(&self.buffer[self.position..])?;
        self.position += length_bytes;

        let value = self.read_bytes(length.value())?;
        Ok((tag, value))
    }

    /// Decode one complete element, recursing into constructed content
    ///
    /// # Errors
    /// - `Decoding` on a truncated tag or nesting deeper than [`MAX_NESTING_DEPTH`]
    /// - `MalformedLength` on invalid length octets or a length (at any
    ///   nesting level) that exceeds the bytes available
    pub fn read_element(&mut self) -> DecodeResult<BerElement> {
        let start_pos = self.position;
        let (tag, value, _) = self.decode_tlv()?;

        if !tag.is_constructed() {
            return Ok(BerElement::primitive(tag, value.to_vec()));
        }

        if self.depth >= MAX_NESTING_DEPTH {
            self.position = start_pos;
            return Err(DecodeError::Decoding(format!(
                "Elements nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        let mut inner = BerDecoder::nested(value, self.depth + 1);
        let mut children = Vec::new();
        while inner.has_remaining() {
            match inner.read_element() {
                Ok(child) => children.push(child),
                Err(e) => {
                    self.position = start_pos;
                    return Err(e);
                }
            }
        }

        Ok(BerElement::constructed(tag, children))
    }

    /// Read every remaining element
    pub fn read_all(&mut self) -> DecodeResult<Vec<BerElement>> {
        let mut elements = Vec::new();
        while self.has_remaining() {
            elements.push(self.read_element()?);
        }
        Ok(elements)
    }

    /// Skip a TLV (useful for skipping unknown fields)
    ///
    /// # Returns
    /// Returns the number of bytes skipped.
    pub fn skip_tlv(&mut self) -> DecodeResult<usize> {
        let (_, _, bytes_consumed) = self.decode_tlv()?;
        Ok(bytes_consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::encoder::BerEncoder;
    use ldap_core::DecodeErrorKind;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_decode_integer() {
        let mut encoder = BerEncoder::new();
        encoder.encode_integer(12345);
        let encoded = encoder.into_bytes();

        let mut decoder = BerDecoder::new(&encoded);
        let value = decoder.read_element().unwrap().as_integer().unwrap();
        assert_eq!(value, 12345);
    }

    #[test]
    fn test_decode_octet_string() {
        let mut encoder = BerEncoder::new();
        encoder.encode_octet_string(b"Hello");
        let encoded = encoder.into_bytes();

        let mut decoder = BerDecoder::new(&encoded);
        let element = decoder.read_element().unwrap();
        assert_eq!(element.as_octet_string().unwrap(), b"Hello");
    }

    #[test]
    fn test_decode_sequence_of_elements() {
        let data = [0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x01, b'x', 0x05, 0x00];
        let mut decoder = BerDecoder::new(&data);
        let sequence = decoder.read_element().unwrap();
        let children = sequence.as_sequence().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].as_string().unwrap(), "x");
        assert_eq!(decoder.remaining(), 2);
        assert_eq!(decoder.skip_tlv().unwrap(), 2);
        assert!(!decoder.has_remaining());
    }

    #[test]
    fn test_truncated_content() {
        let err = BerDecoder::new(&[0x04, 0x05, b'a', b'b']).read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedLength);
    }

    #[test]
    fn test_nested_length_exceeds_parent() {
        // The outer sequence is well formed but its child claims 10 bytes.
        let data = [0x30, 0x03, 0x04, 0x0A, b'a'];
        let mut decoder = BerDecoder::new(&data);
        let err = decoder.read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedLength);
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn test_truncated_tag() {
        let err = BerDecoder::new(&[]).read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::DecodingError);
        let err = BerDecoder::new(&[0x04]).read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedLength);
    }

    #[test]
    fn test_huge_declared_length_does_not_allocate() {
        let data = [0x04, 0x84, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        let err = BerDecoder::new(&data).read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::MalformedLength);
    }

    #[test]
    fn test_nesting_limit() {
        let mut element = BerElement::null();
        for _ in 0..=MAX_NESTING_DEPTH {
            element = BerElement::sequence(vec![element]);
        }
        let err = BerDecoder::new(&element.encode()).read_element().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::DecodingError);

        let mut element = BerElement::null();
        for _ in 0..MAX_NESTING_DEPTH {
            element = BerElement::sequence(vec![element]);
        }
        assert!(BerDecoder::new(&element.encode()).read_element().is_ok());
    }

    #[test]
    fn test_read_all() {
        let data = [0x05, 0x00, 0x01, 0x01, 0xFF];
        let elements = BerDecoder::new(&data).read_all().unwrap();
        assert_eq!(elements, vec![BerElement::null(), BerElement::boolean(true)]);
    }

    #[test]
    fn test_random_garbage_never_panics() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x4C44_4150);
        for _ in 0..5000 {
            let len = rng.gen_range(0..48);
            let mut data = vec![0u8; len];
            rng.fill(&mut data[..]);
            // Bias towards structured-looking input.
            if len > 0 && rng.gen_bool(0.5) {
                data[0] = 0x30;
            }
            let _ = BerDecoder::new(&data).read_all();
        }
    }

    #[test]
    fn test_truncations_of_valid_input_fail_cleanly() {
        let element = BerElement::sequence(vec![
            BerElement::string("cn=test").with_context_tag(0),
            BerElement::sequence(vec![BerElement::integer(300), BerElement::boolean(false)]),
        ]);
        let encoded = element.encode();
        for cut in 0..encoded.len() {
            assert!(BerElement::decode(&encoded[..cut]).is_err(), "cut at {}", cut);
        }
        assert_eq!(BerElement::decode_exact(&encoded).unwrap(), element);
    }
}
