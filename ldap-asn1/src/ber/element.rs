//! BER element tree
//!
//! A [`BerElement`] is a tag plus either raw content bytes (primitive) or an
//! ordered list of child elements (constructed). Typed views (boolean,
//! integer, octet string, ...) are accessors over the same representation.
//!
//! # Tagging
//!
//! LDAP uses implicit tagging heavily: a `[1] LDAPDN` field is an OCTET STRING
//! whose universal tag has been replaced by context tag 1. The accessors
//! therefore check only the primitive/constructed form; callers that need a
//! particular class and number use [`BerElement::expect_tag`].

use crate::ber::decoder::BerDecoder;
use crate::ber::encoder::{integer_content, BerEncoder};
use crate::ber::types::{universal, BerTag, BerTagClass};
use ldap_core::{DecodeError, DecodeResult};
use serde::Serialize;

/// Content of a BER element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BerContent {
    /// Raw content bytes
    Primitive(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Child elements in encoding order
    Constructed(Vec<BerElement>),
}

/// A tagged BER value
///
/// The constructed bit of the tag always agrees with the content variant;
/// constructors normalize it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BerElement {
    tag: BerTag,
    content: BerContent,
}

impl BerElement {
    /// Create a primitive element
    pub fn primitive(tag: BerTag, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            tag: tag.with_constructed(false),
            content: BerContent::Primitive(bytes.into()),
        }
    }

    /// Create a constructed element
    pub fn constructed(tag: BerTag, children: Vec<BerElement>) -> Self {
        Self {
            tag: tag.with_constructed(true),
            content: BerContent::Constructed(children),
        }
    }

    /// BOOLEAN (TRUE encodes as 0xFF)
    pub fn boolean(value: bool) -> Self {
        Self::primitive(
            BerTag::universal(false, universal::BOOLEAN),
            vec![if value { 0xFF } else { 0x00 }],
        )
    }

    /// INTEGER in minimal two's complement form
    pub fn integer(value: i64) -> Self {
        Self::primitive(
            BerTag::universal(false, universal::INTEGER),
            integer_content(value),
        )
    }

    /// ENUMERATED in minimal two's complement form
    pub fn enumerated(value: i64) -> Self {
        Self::primitive(
            BerTag::universal(false, universal::ENUMERATED),
            integer_content(value),
        )
    }

    /// OCTET STRING holding arbitrary bytes
    pub fn octet_string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::primitive(BerTag::universal(false, universal::OCTET_STRING), bytes)
    }

    /// OCTET STRING holding UTF-8 text
    pub fn string(text: &str) -> Self {
        Self::octet_string(text.as_bytes().to_vec())
    }

    /// NULL
    pub fn null() -> Self {
        Self::primitive(BerTag::universal(false, universal::NULL), Vec::new())
    }

    /// SEQUENCE of the given children
    pub fn sequence(children: Vec<BerElement>) -> Self {
        Self::constructed(BerTag::universal(true, universal::SEQUENCE), children)
    }

    /// SET of the given children (order is preserved as given)
    pub fn set(children: Vec<BerElement>) -> Self {
        Self::constructed(BerTag::universal(true, universal::SET), children)
    }

    /// Replace the tag with a context-specific tag of the given number
    ///
    /// The constructed bit follows the content, so `[0] SEQUENCE OF` becomes
    /// `0xA0` and `[1] OCTET STRING` becomes `0x81`.
    pub fn with_context_tag(self, number: u32) -> Self {
        self.with_tag(BerTagClass::ContextSpecific, number)
    }

    /// Replace the tag class and number, keeping the constructed bit
    pub fn with_tag(self, class: BerTagClass, number: u32) -> Self {
        let constructed = self.is_constructed();
        Self {
            tag: BerTag::new(class, constructed, number),
            content: self.content,
        }
    }

    /// Get the tag
    pub fn tag(&self) -> BerTag {
        self.tag
    }

    /// Get the content
    pub fn content(&self) -> &BerContent {
        &self.content
    }

    /// Check if this element is constructed
    pub fn is_constructed(&self) -> bool {
        matches!(self.content, BerContent::Constructed(_))
    }

    /// Check that the tag matches exactly (class, number and form)
    pub fn expect_tag(&self, expected: BerTag) -> DecodeResult<&Self> {
        if self.tag != expected {
            return Err(DecodeError::UnexpectedTag(format!(
                "Expected {}, got {}",
                expected, self.tag
            )));
        }
        Ok(self)
    }

    /// Get the children of a universal SEQUENCE
    pub fn expect_sequence(&self) -> DecodeResult<&[BerElement]> {
        self.expect_tag(BerTag::universal(true, universal::SEQUENCE))?;
        self.as_sequence()
    }

    /// Content bytes of a primitive element
    pub fn as_primitive(&self) -> DecodeResult<&[u8]> {
        match &self.content {
            BerContent::Primitive(bytes) => Ok(bytes),
            BerContent::Constructed(_) => Err(DecodeError::UnexpectedTag(format!(
                "Expected a primitive element, got {}",
                self.tag
            ))),
        }
    }

    /// Children of a constructed element
    pub fn as_sequence(&self) -> DecodeResult<&[BerElement]> {
        match &self.content {
            BerContent::Constructed(children) => Ok(children),
            BerContent::Primitive(_) => Err(DecodeError::UnexpectedTag(format!(
                "Expected a constructed element, got {}",
                self.tag
            ))),
        }
    }

    /// Children of a constructed element (SET view)
    pub fn as_set(&self) -> DecodeResult<&[BerElement]> {
        self.as_sequence()
    }

    /// Decode a BOOLEAN value (0x00 is false, anything else is true)
    pub fn as_boolean(&self) -> DecodeResult<bool> {
        let bytes = self.as_primitive()?;
        if bytes.len() != 1 {
            return Err(DecodeError::MalformedLength(format!(
                "Boolean must have exactly one content byte, got {}",
                bytes.len()
            )));
        }
        Ok(bytes[0] != 0x00)
    }

    /// Decode an INTEGER value
    ///
    /// Redundant leading sign bytes are tolerated, since peers are not
    /// guaranteed to produce minimal encodings.
    ///
    /// # Errors
    /// - `Decoding` for empty content
    /// - `ValueOutOfRange` if the value does not fit in an `i64`
    pub fn as_integer(&self) -> DecodeResult<i64> {
        let bytes = self.as_primitive()?;
        decode_integer_content(bytes)
    }

    /// Decode an INTEGER value, rejecting non-minimal encodings
    ///
    /// For verifying data this library produced itself.
    pub fn as_integer_strict(&self) -> DecodeResult<i64> {
        let bytes = self.as_primitive()?;
        let value = decode_integer_content(bytes)?;
        if integer_content(value).len() != bytes.len() {
            return Err(DecodeError::Decoding(format!(
                "Non-minimal integer encoding ({} bytes for value {})",
                bytes.len(),
                value
            )));
        }
        Ok(value)
    }

    /// Decode an INTEGER that must fit in an `i32`
    pub fn as_i32(&self) -> DecodeResult<i32> {
        let value = self.as_integer()?;
        i32::try_from(value).map_err(|_| {
            DecodeError::ValueOutOfRange(format!("Integer {} does not fit in 32 bits", value))
        })
    }

    /// Decode an ENUMERATED value
    pub fn as_enumerated(&self) -> DecodeResult<i64> {
        self.as_integer()
    }

    /// Raw OCTET STRING bytes
    pub fn as_octet_string(&self) -> DecodeResult<&[u8]> {
        self.as_primitive()
    }

    /// OCTET STRING holding UTF-8 text
    pub fn as_string(&self) -> DecodeResult<String> {
        let bytes = self.as_primitive()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            DecodeError::Decoding(format!("Octet string is not valid UTF-8: {}", e))
        })
    }

    /// Check a NULL value (zero-length content)
    pub fn as_null(&self) -> DecodeResult<()> {
        let bytes = self.as_primitive()?;
        if !bytes.is_empty() {
            return Err(DecodeError::MalformedLength(format!(
                "Null must have empty content, got {} bytes",
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Encode to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = BerEncoder::new();
        encoder.encode_element(self);
        encoder.into_bytes()
    }

    /// Decode exactly one element from the start of a buffer
    ///
    /// # Returns
    /// Returns `Ok((element, bytes_consumed))`
    pub fn decode(data: &[u8]) -> DecodeResult<(Self, usize)> {
        let mut decoder = BerDecoder::new(data);
        let element = decoder.read_element()?;
        Ok((element, decoder.position()))
    }

    /// Decode one element that must span the whole buffer
    pub fn decode_exact(data: &[u8]) -> DecodeResult<Self> {
        let (element, consumed) = Self::decode(data)?;
        if consumed != data.len() {
            return Err(DecodeError::Decoding(format!(
                "{} trailing bytes after element",
                data.len() - consumed
            )));
        }
        Ok(element)
    }
}

/// Decode two's complement content bytes, tolerating redundant sign bytes
pub fn decode_integer_content(bytes: &[u8]) -> DecodeResult<i64> {
    if bytes.is_empty() {
        return Err(DecodeError::Decoding("Empty integer encoding".to_string()));
    }

    let mut start = 0;
    while start + 1 < bytes.len() {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }

    let significant = &bytes[start..];
    if significant.len() > 8 {
        return Err(DecodeError::ValueOutOfRange(format!(
            "Integer too large: {} significant bytes (max 8)",
            significant.len()
        )));
    }

    let fill = if significant[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut buf = [fill; 8];
    buf[8 - significant.len()..].copy_from_slice(significant);
    Ok(i64::from_be_bytes(buf))
}

/// Check that a sequence has between `min` and `max` children
///
/// # Errors
/// `InvalidElementCount` naming `context`
pub fn check_element_count(
    elements: &[BerElement],
    min: usize,
    max: usize,
    context: &str,
) -> DecodeResult<()> {
    if elements.len() < min || elements.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(DecodeError::InvalidElementCount(format!(
            "{} must have {} elements, got {}",
            context,
            expected,
            elements.len()
        )));
    }
    Ok(())
}
