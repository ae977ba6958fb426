//! LDAP controls
//!
//! A control attaches extra semantics to a request or response. On the wire
//! (RFC 4511 section 4.1.11) it is:
//!
//! ```text
//! Control ::= SEQUENCE {
//!      controlType             LDAPOID,
//!      criticality             BOOLEAN DEFAULT FALSE,
//!      controlValue            OCTET STRING OPTIONAL }
//!
//! Controls ::= SEQUENCE OF control Control
//! ```
//!
//! If a control is critical and the peer does not recognize it, the peer must
//! fail the whole operation. That rule belongs to the operation layer; this
//! module only carries the flag.

use crate::envelope::Envelope;
use bytes::Bytes;
use ldap_asn1::{check_element_count, universal, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};

const BOOLEAN_TAG: BerTag = BerTag::universal(false, universal::BOOLEAN);
const OCTET_STRING_TAG: BerTag = BerTag::universal(false, universal::OCTET_STRING);

/// Generic LDAP control
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Control {
    oid: String,
    critical: bool,
    value: Option<Bytes>,
}

impl Control {
    /// Create a control
    ///
    /// # Arguments
    /// * `oid` - Control type OID
    /// * `critical` - Whether the peer must fail the operation if it does not
    ///   support the control
    /// * `value` - Optional encoded value
    ///
    /// # Panics
    /// Panics if `oid` is empty.
    pub fn new(oid: impl Into<String>, critical: bool, value: Option<Bytes>) -> Self {
        let oid = oid.into();
        assert!(!oid.is_empty(), "control OID must not be empty");
        Self {
            oid,
            critical,
            value,
        }
    }

    /// Get the control type OID
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Check whether the control is critical
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Get the encoded value
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Copy of this control with a different criticality
    pub fn with_criticality(&self, critical: bool) -> Self {
        Self {
            critical,
            ..self.clone()
        }
    }

    /// Build the BER form of the control
    ///
    /// Criticality is omitted when false (DEFAULT FALSE).
    pub fn to_element(&self) -> BerElement {
        let mut children = vec![BerElement::string(&self.oid)];
        if self.critical {
            children.push(BerElement::boolean(true));
        }
        if let Some(value) = &self.value {
            children.push(BerElement::octet_string(value.to_vec()));
        }
        BerElement::sequence(children)
    }

    /// Decode a control from its BER form
    ///
    /// An explicit FALSE criticality is accepted. Elements must appear in
    /// declaration order.
    ///
    /// # Errors
    /// - `UnexpectedTag` if the element is not a SEQUENCE
    /// - `InvalidElementCount` if it has fewer than 1 or more than 3 children
    /// - `InvalidElementType` for a child that is not valid at its position
    /// - `Decoding` for an empty or non-UTF-8 OID
    pub fn from_element(element: &BerElement) -> DecodeResult<Self> {
        let children = element.expect_sequence().map_err(|e| e.context("Control"))?;
        check_element_count(children, 1, 3, "Control")?;

        if children[0].tag() != OCTET_STRING_TAG {
            return Err(DecodeError::InvalidElementType(format!(
                "Control type must be an OCTET STRING, got {}",
                children[0].tag()
            )));
        }
        let oid = children[0].as_string().map_err(|e| e.context("Control type"))?;
        if oid.is_empty() {
            return Err(DecodeError::Decoding("Control type is empty".to_string()));
        }

        let mut critical = false;
        let mut seen_criticality = false;
        let mut value = None;
        for child in &children[1..] {
            match child.tag() {
                BOOLEAN_TAG if !seen_criticality && value.is_none() => {
                    critical = child.as_boolean().map_err(|e| e.context("Control criticality"))?;
                    seen_criticality = true;
                }
                OCTET_STRING_TAG if value.is_none() => {
                    value = Some(Bytes::copy_from_slice(child.as_octet_string()?));
                }
                tag => {
                    return Err(DecodeError::InvalidElementType(format!(
                        "Unexpected element {} in control {}",
                        tag, oid
                    )));
                }
            }
        }

        Ok(Self {
            oid,
            critical,
            value,
        })
    }

    /// Encode to bytes
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.to_element().encode()
    }

    /// Decode from bytes holding exactly one control
    pub fn decode_from_bytes(data: &[u8]) -> DecodeResult<Self> {
        Self::from_element(&BerElement::decode_exact(data)?)
    }

    /// Build the `Controls` SEQUENCE OF
    pub fn encode_list(controls: &[Control]) -> BerElement {
        BerElement::sequence(controls.iter().map(Control::to_element).collect())
    }

    /// Decode every control of a `Controls` list
    ///
    /// The list tag is not checked, since LDAPMessage carries it as `[0]`.
    /// The first malformed control fails the whole list; see
    /// [`crate::embedded::decode_controls`] for policy-driven decoding.
    pub fn decode_list(element: &BerElement) -> DecodeResult<Vec<Control>> {
        element
            .as_sequence()
            .map_err(|e| e.context("Controls"))?
            .iter()
            .map(Control::from_element)
            .collect()
    }
}

impl Envelope for Control {
    const KIND: &'static str = "control";

    fn oid(&self) -> Option<&str> {
        Some(&self.oid)
    }

    fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    fn with_value(&self, value: Option<Bytes>) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }
}
