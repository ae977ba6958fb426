//! LDAP extended operation requests
//!
//! ```text
//! ExtendedRequest ::= [APPLICATION 23] SEQUENCE {
//!      requestName      [0] LDAPOID,
//!      requestValue     [1] OCTET STRING OPTIONAL }
//! ```

use crate::envelope::Envelope;
use bytes::Bytes;
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};

/// Application tag number of ExtendedRequest
pub const EXTENDED_REQUEST_TAG: u32 = 23;

const REQUEST_NAME_TAG: BerTag = BerTag::context_specific(false, 0);
const REQUEST_VALUE_TAG: BerTag = BerTag::context_specific(false, 1);

/// Generic extended request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedRequest {
    oid: String,
    value: Option<Bytes>,
}

impl ExtendedRequest {
    /// Create an extended request
    ///
    /// # Panics
    /// Panics if `oid` is empty.
    pub fn new(oid: impl Into<String>, value: Option<Bytes>) -> Self {
        let oid = oid.into();
        assert!(!oid.is_empty(), "extended request OID must not be empty");
        Self { oid, value }
    }

    /// Get the request name OID
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Get the encoded request value
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Build the `[APPLICATION 23]` protocol op
    pub fn to_element(&self) -> BerElement {
        let mut children = vec![BerElement::string(&self.oid).with_context_tag(0)];
        if let Some(value) = &self.value {
            children.push(BerElement::octet_string(value.to_vec()).with_context_tag(1));
        }
        BerElement::constructed(BerTag::application(true, EXTENDED_REQUEST_TAG), children)
    }

    /// Decode from the `[APPLICATION 23]` protocol op
    ///
    /// # Errors
    /// - `UnexpectedTag` if the element is not `[APPLICATION 23]`
    /// - `InvalidElementCount` if it has no request name or more than two children
    /// - `InvalidElementType` for a child with an unexpected tag
    pub fn from_element(element: &BerElement) -> DecodeResult<Self> {
        element.expect_tag(BerTag::application(true, EXTENDED_REQUEST_TAG))?;
        let children = element.as_sequence()?;
        check_element_count(children, 1, 2, "Extended request")?;

        if children[0].tag() != REQUEST_NAME_TAG {
            return Err(DecodeError::InvalidElementType(format!(
                "Extended request name must be [0], got {}",
                children[0].tag()
            )));
        }
        let oid = children[0].as_string().map_err(|e| e.context("Extended request name"))?;
        if oid.is_empty() {
            return Err(DecodeError::Decoding("Extended request name is empty".to_string()));
        }

        let value = match children.get(1) {
            Some(child) if child.tag() == REQUEST_VALUE_TAG => {
                Some(Bytes::copy_from_slice(child.as_octet_string()?))
            }
            Some(child) => {
                return Err(DecodeError::InvalidElementType(format!(
                    "Unexpected element {} in extended request {}",
                    child.tag(),
                    oid
                )));
            }
            None => None,
        };

        Ok(Self { oid, value })
    }

    /// Encode to bytes
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.to_element().encode()
    }

    /// Decode from bytes holding exactly one protocol op
    pub fn decode_from_bytes(data: &[u8]) -> DecodeResult<Self> {
        Self::from_element(&BerElement::decode_exact(data)?)
    }
}

impl Envelope for ExtendedRequest {
    const KIND: &'static str = "extended request";

    fn oid(&self) -> Option<&str> {
        Some(&self.oid)
    }

    fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    fn with_value(&self, value: Option<Bytes>) -> Self {
        Self {
            oid: self.oid.clone(),
            value,
        }
    }
}
