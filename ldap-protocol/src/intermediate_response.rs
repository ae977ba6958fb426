//! LDAP intermediate responses
//!
//! ```text
//! IntermediateResponse ::= [APPLICATION 25] SEQUENCE {
//!      responseName     [0] LDAPOID OPTIONAL,
//!      responseValue    [1] OCTET STRING OPTIONAL }
//! ```

use crate::envelope::Envelope;
use bytes::Bytes;
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};

/// Application tag number of IntermediateResponse
pub const INTERMEDIATE_RESPONSE_TAG: u32 = 25;

const RESPONSE_NAME_TAG: BerTag = BerTag::context_specific(false, 0);
const RESPONSE_VALUE_TAG: BerTag = BerTag::context_specific(false, 1);

/// Generic intermediate response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntermediateResponse {
    oid: Option<String>,
    value: Option<Bytes>,
}

impl IntermediateResponse {
    pub fn new(oid: Option<String>, value: Option<Bytes>) -> Self {
        Self { oid, value }
    }

    /// Get the response name OID
    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    /// Get the encoded response value
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Build the `[APPLICATION 25]` protocol op
    pub fn to_element(&self) -> BerElement {
        let mut children = Vec::with_capacity(2);
        if let Some(oid) = &self.oid {
            children.push(BerElement::string(oid).with_context_tag(0));
        }
        if let Some(value) = &self.value {
            children.push(BerElement::octet_string(value.to_vec()).with_context_tag(1));
        }
        BerElement::constructed(BerTag::application(true, INTERMEDIATE_RESPONSE_TAG), children)
    }

    /// Decode from the `[APPLICATION 25]` protocol op
    pub fn from_element(element: &BerElement) -> DecodeResult<Self> {
        element.expect_tag(BerTag::application(true, INTERMEDIATE_RESPONSE_TAG))?;
        let children = element.as_sequence()?;
        check_element_count(children, 0, 2, "Intermediate response")?;

        let mut oid = None;
        let mut value = None;
        for child in children {
            match child.tag() {
                RESPONSE_NAME_TAG if oid.is_none() && value.is_none() => {
                    oid = Some(child.as_string().map_err(|e| e.context("Response name"))?);
                }
                RESPONSE_VALUE_TAG if value.is_none() => {
                    value = Some(Bytes::copy_from_slice(child.as_octet_string()?));
                }
                tag => {
                    return Err(DecodeError::InvalidElementType(format!(
                        "Unexpected element {} in intermediate response",
                        tag
                    )));
                }
            }
        }

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

impl Envelope for IntermediateResponse {
    const KIND: &'static str = "intermediate response";

    fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
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
