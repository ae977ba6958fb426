//! LDAP extended operation results
//!
//! ```text
//! ExtendedResponse ::= [APPLICATION 24] SEQUENCE {
//!      COMPONENTS OF LDAPResult,
//!      responseName     [10] LDAPOID OPTIONAL,
//!      responseValue    [11] OCTET STRING OPTIONAL }
//!
//! LDAPResult ::= SEQUENCE {
//!      resultCode         ENUMERATED,
//!      matchedDN          LDAPDN,
//!      diagnosticMessage  LDAPString,
//!      referral           [3] Referral OPTIONAL }
//! ```
//!
//! The LDAPResult fields are passed through without interpretation. An empty
//! matchedDN or diagnosticMessage on the wire is represented as `None`.

use crate::envelope::Envelope;
use crate::result_code::ResultCode;
use bytes::Bytes;
use ldap_asn1::{check_element_count, universal, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};

/// Application tag number of ExtendedResponse
pub const EXTENDED_RESPONSE_TAG: u32 = 24;

const OCTET_STRING_TAG: BerTag = BerTag::universal(false, universal::OCTET_STRING);
const REFERRAL_TAG: BerTag = BerTag::context_specific(true, 3);
const RESPONSE_NAME_TAG: BerTag = BerTag::context_specific(false, 10);
const RESPONSE_VALUE_TAG: BerTag = BerTag::context_specific(false, 11);

/// Pass-through LDAPResult fields
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationResult {
    pub result_code: ResultCode,
    pub matched_dn: Option<String>,
    pub diagnostic_message: Option<String>,
    pub referral_urls: Vec<String>,
}

impl OperationResult {
    /// Result with only a result code
    pub fn new(result_code: ResultCode) -> Self {
        Self {
            result_code,
            matched_dn: None,
            diagnostic_message: None,
            referral_urls: Vec::new(),
        }
    }

    /// Plain `SUCCESS` result
    pub fn success() -> Self {
        Self::new(ResultCode::SUCCESS)
    }

    pub fn with_matched_dn(mut self, matched_dn: impl Into<String>) -> Self {
        self.matched_dn = Some(matched_dn.into());
        self
    }

    pub fn with_diagnostic_message(mut self, message: impl Into<String>) -> Self {
        self.diagnostic_message = Some(message.into());
        self
    }

    pub fn with_referral_urls(mut self, urls: Vec<String>) -> Self {
        self.referral_urls = urls;
        self
    }

    /// Build the LDAPResult components (without an enclosing tag)
    pub fn to_components(&self) -> Vec<BerElement> {
        let mut components = vec![
            BerElement::enumerated(self.result_code.value() as i64),
            BerElement::string(self.matched_dn.as_deref().unwrap_or("")),
            BerElement::string(self.diagnostic_message.as_deref().unwrap_or("")),
        ];
        if !self.referral_urls.is_empty() {
            let urls = self.referral_urls.iter().map(|u| BerElement::string(u)).collect();
            components.push(BerElement::sequence(urls).with_context_tag(3));
        }
        components
    }

    /// Decode the leading LDAPResult components of a protocol op
    ///
    /// # Returns
    /// Returns the result and the number of components consumed
    pub fn from_components(components: &[BerElement]) -> DecodeResult<(Self, usize)> {
        if components.len() < 3 {
            return Err(DecodeError::InvalidElementCount(format!(
                "LDAPResult must have at least 3 elements, got {}",
                components.len()
            )));
        }

        let code = components[0].as_enumerated().map_err(|e| e.context("Result code"))?;
        let code = i32::try_from(code).map_err(|_| {
            DecodeError::ValueOutOfRange(format!("Result code {} out of range", code))
        })?;
        let matched_dn = Self::optional_string(&components[1], "Matched DN")?;
        let diagnostic_message = Self::optional_string(&components[2], "Diagnostic message")?;

        let mut consumed = 3;
        let mut referral_urls = Vec::new();
        if let Some(referral) = components.get(3).filter(|c| c.tag() == REFERRAL_TAG) {
            for url in referral.as_sequence()? {
                referral_urls.push(url.as_string().map_err(|e| e.context("Referral URL"))?);
            }
            consumed += 1;
        }

        Ok((
            Self {
                result_code: ResultCode::new(code),
                matched_dn,
                diagnostic_message,
                referral_urls,
            },
            consumed,
        ))
    }

    fn optional_string(element: &BerElement, what: &str) -> DecodeResult<Option<String>> {
        if element.tag() != OCTET_STRING_TAG {
            return Err(DecodeError::InvalidElementType(format!(
                "{} must be an OCTET STRING, got {}",
                what,
                element.tag()
            )));
        }
        let text = element.as_string().map_err(|e| e.context(what))?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

/// Generic extended result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedResult {
    result: OperationResult,
    oid: Option<String>,
    value: Option<Bytes>,
}

impl ExtendedResult {
    /// Create an extended result
    pub fn new(result: OperationResult, oid: Option<String>, value: Option<Bytes>) -> Self {
        Self { result, oid, value }
    }

    /// Get the LDAPResult fields
    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    pub fn result_code(&self) -> ResultCode {
        self.result.result_code
    }

    pub fn matched_dn(&self) -> Option<&str> {
        self.result.matched_dn.as_deref()
    }

    pub fn diagnostic_message(&self) -> Option<&str> {
        self.result.diagnostic_message.as_deref()
    }

    pub fn referral_urls(&self) -> &[String] {
        &self.result.referral_urls
    }

    /// Get the response name OID
    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    /// Get the encoded response value
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Build the `[APPLICATION 24]` protocol op
    pub fn to_element(&self) -> BerElement {
        let mut children = self.result.to_components();
        if let Some(oid) = &self.oid {
            children.push(BerElement::string(oid).with_context_tag(10));
        }
        if let Some(value) = &self.value {
            children.push(BerElement::octet_string(value.to_vec()).with_context_tag(11));
        }
        BerElement::constructed(BerTag::application(true, EXTENDED_RESPONSE_TAG), children)
    }

    /// Decode from the `[APPLICATION 24]` protocol op
    ///
    /// # Errors
    /// - `UnexpectedTag` if the element is not `[APPLICATION 24]`
    /// - `InvalidElementCount` if it has fewer than 3 or more than 6 children
    /// - `InvalidElementType` for an out-of-place or unknown trailing child
    pub fn from_element(element: &BerElement) -> DecodeResult<Self> {
        element.expect_tag(BerTag::application(true, EXTENDED_RESPONSE_TAG))?;
        let children = element.as_sequence()?;
        check_element_count(children, 3, 6, "Extended result")?;

        let (result, consumed) = OperationResult::from_components(children)?;

        let mut oid = None;
        let mut value = None;
        for child in &children[consumed..] {
            match child.tag() {
                RESPONSE_NAME_TAG if oid.is_none() && value.is_none() => {
                    oid = Some(child.as_string().map_err(|e| e.context("Response name"))?);
                }
                RESPONSE_VALUE_TAG if value.is_none() => {
                    value = Some(Bytes::copy_from_slice(child.as_octet_string()?));
                }
                tag => {
                    return Err(DecodeError::InvalidElementType(format!(
                        "Unexpected element {} in extended result",
                        tag
                    )));
                }
            }
        }

        Ok(Self { result, oid, value })
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

impl Envelope for ExtendedResult {
    const KIND: &'static str = "extended result";

    fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    fn with_value(&self, value: Option<Bytes>) -> Self {
        Self {
            result: self.result.clone(),
            oid: self.oid.clone(),
            value,
        }
    }
}
