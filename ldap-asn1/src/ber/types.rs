//! BER encoding types (Tag, Length, etc.)

use ldap_core::{DecodeError, DecodeResult};
use serde::Serialize;
use std::fmt;

/// Maximum number of length octets accepted in long form (32-bit lengths)
pub const MAX_LENGTH_OCTETS: usize = 4;

/// Universal tag numbers used by the LDAP protocol
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const ENUMERATED: u32 = 10;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types (LDAP protocol operations)
/// - **Context-specific**: Context-dependent types (fields inside SEQUENCE/CHOICE)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 8-7 of the identifier byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value contains other values
/// - **Tag Number**: 0-30 in the identifier byte, larger numbers in the high-tag-number form
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// High-tag-number form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1
/// Following bytes: 1 T T T T T T T ... 0 T T T T T T T  (base 128, big-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BerTag {
    /// Tag class
    class: BerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl BerTag {
    /// Create a new BER tag
    pub const fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Interpret a single identifier byte (low tag numbers only)
    ///
    /// LDAP specifications usually write context tags as bytes (`0x80`,
    /// `0xA0`), so typed elements declare their field tags this way.
    pub const fn from_byte(byte: u8) -> Self {
        let class = match (byte >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        };
        Self::new(class, (byte & 0x20) != 0, (byte & 0x1F) as u32)
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Same class and number with the given constructed bit
    pub fn with_constructed(self, constructed: bool) -> Self {
        Self::new(self.class, constructed, self.number)
    }

    /// Encode tag to bytes
    ///
    /// - If tag number <= 30: single identifier byte
    /// - If tag number > 30: identifier byte with all tag bits set, followed by
    ///   the number in base 128 with the continuation bit on all but the last byte
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1);
        self.encode_into(&mut result);
        result
    }

    /// Append the encoded tag to a buffer
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            out.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
            return;
        }

        out.push(class_bits | constructed_bit | 0x1F);

        let mut groups = [0u8; 5];
        let mut count = 0;
        let mut remaining = self.number;
        while remaining > 0 {
            groups[count] = (remaining & 0x7F) as u8;
            remaining >>= 7;
            count += 1;
        }

        for i in (0..count).rev() {
            if i > 0 {
                out.push(groups[i] | 0x80);
            } else {
                out.push(groups[i]);
            }
        }
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful
    ///
    /// # Errors
    /// - `Decoding` if the buffer is empty or ends inside a high-tag-number form
    /// - `UnexpectedTag` if the tag number does not fit in 32 bits
    pub fn decode(data: &[u8]) -> DecodeResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(DecodeError::Decoding(
                "Empty buffer for tag decoding".to_string(),
            ));
        };

        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let Some(&byte) = data.get(pos) else {
                return Err(DecodeError::Decoding(
                    "Incomplete high-tag-number encoding".to_string(),
                ));
            };
            if tag_number > (u32::MAX >> 7) {
                return Err(DecodeError::UnexpectedTag(
                    "Tag number does not fit in 32 bits".to_string(),
                ));
            }
            tag_number = (tag_number << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        };
        let form = if self.constructed { "constructed" } else { "primitive" };
        if self.number <= 30 {
            let byte = self.encode()[0];
            write!(f, "[{} {}] {} (0x{:02X})", class, self.number, form, byte)
        } else {
            write!(f, "[{} {}] {}", class, self.number, form)
        }
    }
}

/// BER Length encoding
///
/// Definite form only:
/// - **Short form**: lengths 0-127 in one byte
/// - **Long form**: first byte `0x80 | n`, then `n` big-endian length bytes
///
/// The indefinite form (`0x80`) is not used by LDAP and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form, encoded with length-of-length
    Long(usize),
}

impl BerLength {
    /// Create a new BER length
    ///
    /// Automatically chooses short or long form based on the length value.
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> usize {
        match self {
            BerLength::Short(l) => *l as usize,
            BerLength::Long(l) => *l,
        }
    }

    /// Encode length to bytes (minimal form)
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1);
        self.encode_into(&mut result);
        result
    }

    /// Append the encoded length to a buffer
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let length = self.value();
        if length < 128 {
            out.push(length as u8);
            return;
        }

        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let significant = &bytes[skip..];
        out.push(0x80 | significant.len() as u8);
        out.extend_from_slice(significant);
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful
    ///
    /// # Errors
    /// `MalformedLength` if the buffer is empty, the indefinite form is used,
    /// more than four length octets are declared, or the length octets are
    /// truncated. Non-minimal long forms are accepted.
    pub fn decode(data: &[u8]) -> DecodeResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(DecodeError::MalformedLength(
                "Empty buffer for length decoding".to_string(),
            ));
        };

        if (first_byte & 0x80) == 0 {
            return Ok((BerLength::Short(first_byte), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Err(DecodeError::MalformedLength(
                "Indefinite length encoding not supported".to_string(),
            ));
        }

        if num_bytes > MAX_LENGTH_OCTETS {
            return Err(DecodeError::MalformedLength(format!(
                "Length encoding too large: {} bytes (max {})",
                num_bytes, MAX_LENGTH_OCTETS
            )));
        }

        if data.len() < 1 + num_bytes {
            return Err(DecodeError::MalformedLength(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        }

        let length = data[1..=num_bytes]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);

        Ok((BerLength::Long(length), 1 + num_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldap_core::DecodeErrorKind;

    #[test]
    fn test_ber_tag_short_form() {
        let tag = BerTag::universal(false, universal::INTEGER);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0x02]);
    }

    #[test]
    fn test_ber_tag_constructed() {
        let tag = BerTag::application(true, 23); // ExtendedRequest
        assert_eq!(tag.encode(), vec![0x77]);
    }

    #[test]
    fn test_ber_tag_from_byte() {
        let tag = BerTag::from_byte(0xA0);
        assert_eq!(tag, BerTag::context_specific(true, 0));
        let tag = BerTag::from_byte(0x8A);
        assert_eq!(tag, BerTag::context_specific(false, 10));
    }

    #[test]
    fn test_ber_tag_high_number() {
        let tag = BerTag::context_specific(false, 201);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0x9F, 0x81, 0x49]);
        let (decoded, consumed) = BerTag::decode(&encoded).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_ber_tag_max_number() {
        let tag = BerTag::private(true, u32::MAX);
        let encoded = tag.encode();
        assert_eq!(encoded.len(), 6);
        assert_eq!(BerTag::decode(&encoded).unwrap(), (tag, 6));
    }

    #[test]
    fn test_ber_tag_decode() {
        let data = [0x02];
        let (tag, consumed) = BerTag::decode(&data).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(tag.class(), BerTagClass::Universal);
        assert!(!tag.is_constructed());
        assert_eq!(tag.number(), 2);
    }

    #[test]
    fn test_ber_tag_truncated_high_number() {
        let err = BerTag::decode(&[0x1F, 0x81]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::DecodingError);
        assert!(BerTag::decode(&[]).is_err());
    }

    #[test]
    fn test_ber_tag_overflow() {
        let err = BerTag::decode(&[0x1F, 0x90, 0x80, 0x80, 0x80, 0x80, 0x00]).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedTag);
    }

    #[test]
    fn test_ber_length_short() {
        let length = BerLength::new(100);
        assert_eq!(length.encode(), vec![100]);
    }

    #[test]
    fn test_ber_length_long() {
        assert_eq!(BerLength::new(128).encode(), vec![0x81, 0x80]);
        assert_eq!(BerLength::new(1000).encode(), vec![0x82, 0x03, 0xE8]);
        assert_eq!(BerLength::new(0x01_00_00).encode(), vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_ber_length_decode() {
        let (length, consumed) = BerLength::decode(&[100]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(length.value(), 100);

        let (length, consumed) = BerLength::decode(&[0x82, 0x03, 0xE8]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(length.value(), 1000);
    }

    #[test]
    fn test_ber_length_non_minimal_accepted() {
        let (length, consumed) = BerLength::decode(&[0x82, 0x00, 0x05]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(length.value(), 5);
    }

    #[test]
    fn test_ber_length_rejects_malformed() {
        let cases: [&[u8]; 4] = [&[], &[0x80], &[0x85, 1, 1, 1, 1, 1], &[0x82, 0x01]];
        for data in cases {
            let err = BerLength::decode(data).unwrap_err();
            assert_eq!(err.kind(), DecodeErrorKind::MalformedLength, "{:02X?}", data);
        }
    }
}
