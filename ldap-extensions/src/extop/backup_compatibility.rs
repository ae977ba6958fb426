//! Get Backup Compatibility Descriptor extended operation
//!
//! Retrieves an opaque descriptor that a backup tool compares against a
//! backup to decide whether it can be restored into the server.
//!
//! ```text
//! GetBackupCompatibilityDescriptorRequest ::= SEQUENCE {
//!      baseDN     [0] OCTET STRING }
//!
//! GetBackupCompatibilityDescriptorResult ::= SEQUENCE {
//!      descriptor     [0] OCTET STRING,
//!      properties     [1] SEQUENCE OF OCTET STRING OPTIONAL }
//! ```
//!
//! Decoded requests and results convert back to the value bytes they were
//! received with.

use crate::shape::{expect_element, string_element, unexpected_element};
use bytes::Bytes;
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value};
use ldap_protocol::json::payload::{decode_base64, encode_base64, from_payload, to_payload};
use ldap_protocol::{ExtendedRequest, ExtendedResult, OperationResult, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BASE_DN_TAG: BerTag = BerTag::context_specific(false, 0);
const DESCRIPTOR_TAG: BerTag = BerTag::context_specific(false, 0);
const PROPERTIES_TAG: BerTag = BerTag::context_specific(true, 1);

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RequestPayload {
    base_dn: String,
}

const REQUEST_FIELDS: &[&str] = &["base-dn"];

/// Get Backup Compatibility Descriptor extended request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBackupCompatibilityDescriptorExtendedRequest {
    base_dn: String,
    source: SourceValue,
}

impl GetBackupCompatibilityDescriptorExtendedRequest {
    /// Request the descriptor for the backend holding `base_dn`
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            source: SourceValue::none(),
        }
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }
}

impl TypedElement for GetBackupCompatibilityDescriptorExtendedRequest {
    type Envelope = ExtendedRequest;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.6.30";
    const NAME: &'static str = "Get Backup Compatibility Descriptor Extended Request";

    fn decode_envelope(request: &ExtendedRequest) -> DecodeResult<Self> {
        check_oid(request, Self::OID, Self::NAME)?;
        let element = decode_value_element(request, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 1, 1, Self::NAME)?;
        expect_element(&children[0], BASE_DN_TAG, "Backup compatibility base DN")?;
        let base_dn = children[0]
            .as_string()
            .map_err(|e| e.context("Backup compatibility base DN"))?;
        Ok(Self {
            base_dn,
            source: SourceValue::of(request),
        })
    }

    fn to_envelope(&self) -> ExtendedRequest {
        let value = self.source.or_encode(|| {
            let value = BerElement::sequence(vec![BerElement::string(&self.base_dn).with_context_tag(0)]);
            Some(element_value(&value))
        });
        ExtendedRequest::new(Self::OID, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&RequestPayload {
            base_dn: self.base_dn.clone(),
        })
    }

    fn decode_json_value(header: &ExtendedRequest, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: RequestPayload = from_payload(value, REQUEST_FIELDS, strict, Self::NAME)?;
        Ok(Self::new(payload.base_dn))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ResultPayload {
    descriptor_base64: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    properties: Vec<String>,
}

const RESULT_FIELDS: &[&str] = &["descriptor-base64", "properties"];

/// Get Backup Compatibility Descriptor extended result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBackupCompatibilityDescriptorExtendedResult {
    result: OperationResult,
    descriptor: Option<Bytes>,
    properties: Vec<String>,
    source: SourceValue,
}

impl GetBackupCompatibilityDescriptorExtendedResult {
    /// Successful result
    pub fn new(descriptor: impl Into<Bytes>, properties: Vec<String>) -> Self {
        Self {
            result: OperationResult::success(),
            descriptor: Some(descriptor.into()),
            properties,
            source: SourceValue::none(),
        }
    }

    /// Failed result without a value
    ///
    /// # Panics
    /// Panics if `result` is a success.
    pub fn failure(result: OperationResult) -> Self {
        assert!(
            !result.result_code.is_success(),
            "a successful result must carry a descriptor"
        );
        Self {
            result,
            descriptor: None,
            properties: Vec::new(),
            source: SourceValue::none(),
        }
    }

    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    /// Opaque compatibility descriptor
    pub fn descriptor(&self) -> Option<&Bytes> {
        self.descriptor.as_ref()
    }

    /// Human-readable properties of the descriptor
    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

impl TypedElement for GetBackupCompatibilityDescriptorExtendedResult {
    type Envelope = ExtendedResult;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.6.31";
    const NAME: &'static str = "Get Backup Compatibility Descriptor Extended Result";

    fn decode_envelope(result: &ExtendedResult) -> DecodeResult<Self> {
        check_oid(result, Self::OID, Self::NAME)?;
        if result.value().is_none() {
            if result.result_code().is_success() {
                return Err(DecodeError::MissingValue(format!(
                    "Successful {} requires a value",
                    Self::NAME
                )));
            }
            return Ok(Self {
                result: result.result().clone(),
                descriptor: None,
                properties: Vec::new(),
                source: SourceValue::of(result),
            });
        }

        let element = decode_value_element(result, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 1, 2, Self::NAME)?;

        expect_element(&children[0], DESCRIPTOR_TAG, "Backup compatibility descriptor")?;
        let descriptor = Bytes::copy_from_slice(children[0].as_octet_string()?);
        let properties = match children.get(1) {
            Some(list) if list.tag() == PROPERTIES_TAG => list
                .as_sequence()?
                .iter()
                .map(|p| string_element(p, "Backup compatibility property"))
                .collect::<DecodeResult<Vec<_>>>()?,
            Some(other) => return Err(unexpected_element(other, Self::NAME)),
            None => Vec::new(),
        };

        Ok(Self {
            result: result.result().clone(),
            descriptor: Some(descriptor),
            properties,
            source: SourceValue::of(result),
        })
    }

    fn to_envelope(&self) -> ExtendedResult {
        let value = self.source.or_encode(|| {
            self.descriptor.as_ref().map(|descriptor| {
                let mut children = vec![BerElement::octet_string(descriptor.to_vec()).with_context_tag(0)];
                if !self.properties.is_empty() {
                    let properties = self.properties.iter().map(|p| BerElement::string(p)).collect();
                    children.push(BerElement::sequence(properties).with_context_tag(1));
                }
                element_value(&BerElement::sequence(children))
            })
        });
        ExtendedResult::new(self.result.clone(), Some(Self::OID.to_string()), value)
    }

    fn to_json_value(&self) -> Option<Value> {
        let descriptor = self.descriptor.as_ref()?;
        to_payload(&ResultPayload {
            descriptor_base64: encode_base64(descriptor),
            properties: self.properties.clone(),
        })
    }

    fn decode_json_value(header: &ExtendedResult, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: ResultPayload = from_payload(value, RESULT_FIELDS, strict, Self::NAME)?;
        Ok(Self {
            result: header.result().clone(),
            descriptor: Some(Bytes::from(decode_base64(&payload.descriptor_base64, Self::NAME)?)),
            properties: payload.properties,
            source: SourceValue::none(),
        })
    }
}
