//! Missing changelog entries intermediate response
//!
//! Sent during a changelog batch when the server detects that changes the
//! client asked for are no longer available. The value is:
//!
//! ```text
//! MissingChangelogEntries ::= SEQUENCE {
//!      message     [0] OCTET STRING OPTIONAL }
//! ```
//!
//! A decoded response converts back to the value bytes it was received with.

use crate::shape::unexpected_element;
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::DecodeResult;
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value};
use ldap_protocol::json::payload::{from_payload, to_payload};
use ldap_protocol::{IntermediateResponse, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MESSAGE_TAG: BerTag = BerTag::context_specific(false, 0);

#[derive(Serialize, Deserialize)]
struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

const PAYLOAD_FIELDS: &[&str] = &["message"];

/// Missing changelog entries intermediate response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissingChangelogEntriesIntermediateResponse {
    message: Option<String>,
    source: SourceValue,
}

impl MissingChangelogEntriesIntermediateResponse {
    pub fn new(message: Option<String>) -> Self {
        Self {
            message,
            source: SourceValue::none(),
        }
    }

    /// Explanation from the server, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl TypedElement for MissingChangelogEntriesIntermediateResponse {
    type Envelope = IntermediateResponse;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.6.12";
    const NAME: &'static str = "Missing Changelog Entries Intermediate Response";

    fn decode_envelope(response: &IntermediateResponse) -> DecodeResult<Self> {
        check_oid(response, Self::OID, Self::NAME)?;
        let element = decode_value_element(response, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 0, 1, Self::NAME)?;

        let message = match children.first() {
            Some(child) if child.tag() == MESSAGE_TAG => {
                Some(child.as_string().map_err(|e| e.context("Missing changelog message"))?)
            }
            Some(child) => return Err(unexpected_element(child, Self::NAME)),
            None => None,
        };
        Ok(Self {
            message,
            source: SourceValue::of(response),
        })
    }

    fn to_envelope(&self) -> IntermediateResponse {
        let value = self.source.or_encode(|| {
            let children = match &self.message {
                Some(message) => vec![BerElement::string(message).with_context_tag(0)],
                None => Vec::new(),
            };
            Some(element_value(&BerElement::sequence(children)))
        });
        IntermediateResponse::new(Some(Self::OID.to_string()), value)
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&Payload {
            message: self.message.clone(),
        })
    }

    fn decode_json_value(header: &IntermediateResponse, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: Payload = from_payload(value, PAYLOAD_FIELDS, strict, Self::NAME)?;
        Ok(Self::new(payload.message))
    }
}
