//! Exclude Branch request control
//!
//! Asks the server to leave whole subtrees out of a search. The value is:
//!
//! ```text
//! ExcludeBranchRequest ::= SEQUENCE {
//!      baseDNs     [0] SEQUENCE OF LDAPDN }
//! ```
//!
//! At least one base DN is required; order is preserved. A decoded control
//! converts back to the exact value bytes it was received with.

use crate::shape::{expect_element, string_element};
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value};
use ldap_protocol::json::payload::{from_payload, to_payload};
use ldap_protocol::{Control, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BASE_DNS_TAG: BerTag = BerTag::context_specific(true, 0);

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Payload {
    base_dns: Vec<String>,
}

const PAYLOAD_FIELDS: &[&str] = &["base-dns"];

/// Exclude Branch request control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeBranchRequestControl {
    critical: bool,
    base_dns: Vec<String>,
    source: SourceValue,
}

impl ExcludeBranchRequestControl {
    /// Create a critical control excluding the given subtrees
    ///
    /// # Panics
    /// Panics if `base_dns` is empty.
    pub fn new(base_dns: Vec<String>) -> Self {
        Self::with_criticality(true, base_dns)
    }

    /// Create a control with explicit criticality
    ///
    /// # Panics
    /// Panics if `base_dns` is empty.
    pub fn with_criticality(critical: bool, base_dns: Vec<String>) -> Self {
        assert!(!base_dns.is_empty(), "at least one base DN is required");
        Self {
            critical,
            base_dns,
            source: SourceValue::none(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Get the excluded base DNs, in order
    pub fn base_dns(&self) -> &[String] {
        &self.base_dns
    }

    fn check_base_dns(base_dns: &[String]) -> DecodeResult<()> {
        if base_dns.is_empty() {
            return Err(DecodeError::InvalidElementCount(
                "Exclude branch request must name at least one base DN".to_string(),
            ));
        }
        Ok(())
    }
}

impl TypedElement for ExcludeBranchRequestControl {
    type Envelope = Control;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.5.17";
    const NAME: &'static str = "Exclude Branch Request Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        let element = decode_value_element(control, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 1, 1, Self::NAME)?;

        expect_element(&children[0], BASE_DNS_TAG, "Exclude branch base DNs")?;
        let base_dns = children[0]
            .as_sequence()?
            .iter()
            .map(|dn| string_element(dn, "Exclude branch base DN"))
            .collect::<DecodeResult<Vec<_>>>()?;
        Self::check_base_dns(&base_dns)?;

        Ok(Self {
            critical: control.is_critical(),
            base_dns,
            source: SourceValue::of(control),
        })
    }

    fn to_envelope(&self) -> Control {
        let value = self.source.or_encode(|| {
            let dns = self.base_dns.iter().map(|dn| BerElement::string(dn)).collect();
            Some(element_value(&BerElement::sequence(vec![
                BerElement::sequence(dns).with_context_tag(0),
            ])))
        });
        Control::new(Self::OID, self.critical, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&Payload {
            base_dns: self.base_dns.clone(),
        })
    }

    fn decode_json_value(header: &Control, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: Payload = from_payload(value, PAYLOAD_FIELDS, strict, Self::NAME)?;
        Self::check_base_dns(&payload.base_dns)?;
        Ok(Self::with_criticality(header.is_critical(), payload.base_dns))
    }
}
