//! JSON-formatted request and response controls
//!
//! Wrappers that carry other controls as JSON documents, for clients that
//! cannot build BER themselves. The value of both controls is the UTF-8 text
//! of a JSON object:
//!
//! ```text
//! { "controls": [ <control document>, ... ] }
//! ```
//!
//! Each embedded document has the same form as the JSON document codec
//! produces for a control. Decoding the wrapper only checks this outer shape;
//! the embedded documents are decoded on demand with
//! `decode_embedded_controls`, under a caller-supplied [`DecodeBehavior`].
//!
//! A decoded control converts back to the exact text it was received with;
//! a control built from its documents writes canonical JSON text (sorted
//! keys, no whitespace).

use super::control_registry;
use bytes::Bytes;
use ldap_core::{DecodeBehavior, DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, require_value};
use ldap_protocol::json::payload::{from_payload, to_payload};
use ldap_protocol::{decode_json_controls, json, Control, Registry, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize)]
struct Payload {
    controls: Vec<Value>,
}

const PAYLOAD_FIELDS: &[&str] = &["controls"];

fn parse_value(value: &Bytes, what: &str) -> DecodeResult<Vec<Value>> {
    let text: Value = serde_json::from_slice(value).map_err(|e| {
        DecodeError::Decoding(format!("{} value is not valid JSON: {}", what, e))
    })?;
    let payload: Payload = from_payload(&text, PAYLOAD_FIELDS, false, what)?;
    Ok(payload.controls)
}

fn encode_value(controls: &[Value]) -> Bytes {
    let payload = Payload {
        controls: controls.to_vec(),
    };
    let text = to_payload(&payload).map(|v| v.to_string()).unwrap_or_default();
    Bytes::from(text)
}

fn payload_value(controls: &[Value]) -> Option<Value> {
    to_payload(&Payload {
        controls: controls.to_vec(),
    })
}

fn parse_payload(header: &Control, value: &Value, strict: bool, oid: &str, name: &str) -> DecodeResult<Vec<Value>> {
    check_oid(header, oid, name)?;
    let payload: Payload = from_payload(value, PAYLOAD_FIELDS, strict, name)?;
    Ok(payload.controls)
}

fn control_documents(controls: &[Control]) -> Vec<Value> {
    let registry = control_registry();
    controls
        .iter()
        .map(|control| json::encode_generic(control, registry))
        .collect()
}

/// JSON-formatted request control
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFormattedRequestControl {
    critical: bool,
    controls: Vec<Value>,
    source: SourceValue,
}

impl JsonFormattedRequestControl {
    /// Wrap already-encoded control documents (non-critical)
    pub fn new(controls: Vec<Value>) -> Self {
        Self {
            critical: false,
            controls,
            source: SourceValue::none(),
        }
    }

    /// Wrap controls, encoding each one as a JSON document
    pub fn from_controls(controls: &[Control]) -> Self {
        Self::new(control_documents(controls))
    }

    pub fn with_criticality(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Embedded control documents, undecoded
    pub fn controls(&self) -> &[Value] {
        &self.controls
    }

    /// Decode the embedded control documents
    ///
    /// Items the policy allows to be skipped are left out and noted in
    /// `diagnostics`.
    pub fn decode_embedded_controls<T: From<Control>>(
        &self,
        registry: &Registry<Control, T>,
        behavior: &DecodeBehavior,
        diagnostics: &mut Vec<String>,
    ) -> DecodeResult<Vec<T>> {
        decode_json_controls(&self.controls, registry, behavior, diagnostics)
    }
}

impl TypedElement for JsonFormattedRequestControl {
    type Envelope = Control;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.5.64";
    const NAME: &'static str = "JSON-Formatted Request Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        let controls = parse_value(require_value(control, Self::NAME)?, Self::NAME)?;
        Ok(Self {
            critical: control.is_critical(),
            controls,
            source: SourceValue::of(control),
        })
    }

    fn to_envelope(&self) -> Control {
        let value = self.source.or_encode(|| Some(encode_value(&self.controls)));
        Control::new(Self::OID, self.critical, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        payload_value(&self.controls)
    }

    fn decode_json_value(header: &Control, value: &Value, strict: bool) -> DecodeResult<Self> {
        let controls = parse_payload(header, value, strict, Self::OID, Self::NAME)?;
        Ok(Self::new(controls).with_criticality(header.is_critical()))
    }
}

/// JSON-formatted response control
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFormattedResponseControl {
    critical: bool,
    controls: Vec<Value>,
    source: SourceValue,
}

impl JsonFormattedResponseControl {
    /// Wrap already-encoded control documents (non-critical)
    pub fn new(controls: Vec<Value>) -> Self {
        Self {
            critical: false,
            controls,
            source: SourceValue::none(),
        }
    }

    /// Wrap controls, encoding each one as a JSON document
    pub fn from_controls(controls: &[Control]) -> Self {
        Self::new(control_documents(controls))
    }

    pub fn with_criticality(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Embedded control documents, undecoded
    pub fn controls(&self) -> &[Value] {
        &self.controls
    }

    /// Decode the embedded control documents under `behavior`
    pub fn decode_embedded_controls<T: From<Control>>(
        &self,
        registry: &Registry<Control, T>,
        behavior: &DecodeBehavior,
        diagnostics: &mut Vec<String>,
    ) -> DecodeResult<Vec<T>> {
        decode_json_controls(&self.controls, registry, behavior, diagnostics)
    }
}

impl TypedElement for JsonFormattedResponseControl {
    type Envelope = Control;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.5.65";
    const NAME: &'static str = "JSON-Formatted Response Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        let controls = parse_value(require_value(control, Self::NAME)?, Self::NAME)?;
        Ok(Self {
            critical: control.is_critical(),
            controls,
            source: SourceValue::of(control),
        })
    }

    fn to_envelope(&self) -> Control {
        let value = self.source.or_encode(|| Some(encode_value(&self.controls)));
        Control::new(Self::OID, self.critical, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        payload_value(&self.controls)
    }

    fn decode_json_value(header: &Control, value: &Value, strict: bool) -> DecodeResult<Self> {
        let controls = parse_payload(header, value, strict, Self::OID, Self::NAME)?;
        Ok(Self::new(controls).with_criticality(header.is_critical()))
    }
}
