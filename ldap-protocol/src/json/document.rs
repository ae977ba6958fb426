//! JSON documents for the four envelope kinds
//!
//! | kind                  | keys                                                           |
//! |-----------------------|----------------------------------------------------------------|
//! | control               | `oid`, `control-name`, `criticality`, payload                  |
//! | extended request      | `oid`, `request-name`, payload                                 |
//! | extended result       | `result-code`, `matched-dn`, `diagnostic-message`, `referral-urls`, `oid`, `response-name`, payload |
//! | intermediate response | `oid`, `response-name`, payload                                |
//!
//! The payload is at most one of `value-base64` (the BER payload, base64
//! encoded) or `value-json` (the typed element's structured form). A decoder
//! that finds both uses `value-base64`.

use crate::control::Control;
use crate::envelope::Envelope;
use crate::extended_request::ExtendedRequest;
use crate::extended_result::{ExtendedResult, OperationResult};
use crate::intermediate_response::IntermediateResponse;
use crate::json::payload::{decode_base64, encode_base64};
use crate::result_code::ResultCode;
use bytes::Bytes;
use ldap_core::{DecodeError, DecodeResult, Oid};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const OID: &str = "oid";
pub const CONTROL_NAME: &str = "control-name";
pub const CRITICALITY: &str = "criticality";
pub const REQUEST_NAME: &str = "request-name";
pub const RESPONSE_NAME: &str = "response-name";
pub const RESULT_CODE: &str = "result-code";
pub const MATCHED_DN: &str = "matched-dn";
pub const DIAGNOSTIC_MESSAGE: &str = "diagnostic-message";
pub const REFERRAL_URLS: &str = "referral-urls";
pub const VALUE_BASE64: &str = "value-base64";
pub const VALUE_JSON: &str = "value-json";

/// An envelope parsed from a document, before typed dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument<E> {
    /// The envelope; its value is set only if the document had `value-base64`
    pub envelope: E,
    /// Display name, informational only
    pub name: Option<String>,
    /// The structured payload, if the document had `value-json` and no `value-base64`
    pub value_json: Option<Value>,
}

/// Envelopes that have a JSON document form
pub trait JsonEnvelope: Envelope {
    /// Build the document
    ///
    /// # Arguments
    /// * `name` - Display name, omitted if `None`
    /// * `value_json` - Structured payload to emit instead of `value-base64`;
    ///   ignored when the envelope has no value
    fn to_document(&self, name: Option<&str>, value_json: Option<Value>) -> Value;

    /// Parse a document
    ///
    /// # Errors
    /// - `Decoding` if the document is not an object, misses a mandatory key,
    ///   has a key of the wrong JSON type, or has invalid base64
    /// - `UnrecognizedField` for an unknown key when `strict` is set
    /// - `ValueOutOfRange` for a non-numeric OID when `strict` is set
    fn parse_document(document: &Value, strict: bool) -> DecodeResult<ParsedDocument<Self>>;
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ControlDocument {
    oid: String,
    #[serde(default)]
    control_name: Option<String>,
    criticality: bool,
    #[serde(default)]
    value_base64: Option<String>,
    #[serde(default)]
    value_json: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ExtendedRequestDocument {
    oid: String,
    #[serde(default)]
    request_name: Option<String>,
    #[serde(default)]
    value_base64: Option<String>,
    #[serde(default)]
    value_json: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ExtendedResultDocument {
    result_code: i32,
    #[serde(default)]
    matched_dn: Option<String>,
    #[serde(default)]
    diagnostic_message: Option<String>,
    #[serde(default)]
    referral_urls: Vec<String>,
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    response_name: Option<String>,
    #[serde(default)]
    value_base64: Option<String>,
    #[serde(default)]
    value_json: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct IntermediateResponseDocument {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    response_name: Option<String>,
    #[serde(default)]
    value_base64: Option<String>,
    #[serde(default)]
    value_json: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn read_document<D: DeserializeOwned>(document: &Value, kind: &str) -> DecodeResult<D> {
    if !document.is_object() {
        return Err(DecodeError::Decoding(format!(
            "{} document must be a JSON object",
            kind
        )));
    }
    serde_json::from_value(document.clone())
        .map_err(|e| DecodeError::Decoding(format!("Invalid {} document: {}", kind, e)))
}

fn check_unrecognized(extra: &Map<String, Value>, strict: bool, kind: &str) -> DecodeResult<()> {
    match extra.keys().next() {
        Some(key) if strict => Err(DecodeError::UnrecognizedField(format!(
            "Unrecognized field '{}' in {} document",
            key, kind
        ))),
        _ => Ok(()),
    }
}

fn check_oid(oid: &str, strict: bool, kind: &str) -> DecodeResult<()> {
    if oid.is_empty() {
        return Err(DecodeError::Decoding(format!("Empty OID in {} document", kind)));
    }
    if strict {
        Oid::parse(oid).map_err(|e| e.context(kind))?;
    }
    Ok(())
}

fn read_payload(
    value_base64: Option<String>,
    value_json: Option<Value>,
    kind: &str,
) -> DecodeResult<(Option<Bytes>, Option<Value>)> {
    match value_base64 {
        Some(text) => Ok((Some(Bytes::from(decode_base64(&text, kind)?)), None)),
        None => Ok((None, value_json)),
    }
}

fn write_payload(document: &mut Map<String, Value>, value: Option<&Bytes>, value_json: Option<Value>) {
    let Some(value) = value else {
        return;
    };
    match value_json {
        Some(json) => document.insert(VALUE_JSON.to_string(), json),
        None => document.insert(VALUE_BASE64.to_string(), Value::from(encode_base64(value))),
    };
}

fn insert_opt(document: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        document.insert(key.to_string(), Value::from(value));
    }
}

impl JsonEnvelope for Control {
    fn to_document(&self, name: Option<&str>, value_json: Option<Value>) -> Value {
        let mut document = Map::new();
        document.insert(OID.to_string(), Value::from(self.oid()));
        insert_opt(&mut document, CONTROL_NAME, name);
        document.insert(CRITICALITY.to_string(), Value::Bool(self.is_critical()));
        write_payload(&mut document, self.value(), value_json);
        Value::Object(document)
    }

    fn parse_document(document: &Value, strict: bool) -> DecodeResult<ParsedDocument<Self>> {
        let doc: ControlDocument = read_document(document, Self::KIND)?;
        check_unrecognized(&doc.extra, strict, Self::KIND)?;
        check_oid(&doc.oid, strict, Self::KIND)?;
        let (value, value_json) = read_payload(doc.value_base64, doc.value_json, Self::KIND)?;
        Ok(ParsedDocument {
            envelope: Control::new(doc.oid, doc.criticality, value),
            name: doc.control_name,
            value_json,
        })
    }
}

impl JsonEnvelope for ExtendedRequest {
    fn to_document(&self, name: Option<&str>, value_json: Option<Value>) -> Value {
        let mut document = Map::new();
        document.insert(OID.to_string(), Value::from(self.oid()));
        insert_opt(&mut document, REQUEST_NAME, name);
        write_payload(&mut document, self.value(), value_json);
        Value::Object(document)
    }

    fn parse_document(document: &Value, strict: bool) -> DecodeResult<ParsedDocument<Self>> {
        let doc: ExtendedRequestDocument = read_document(document, Self::KIND)?;
        check_unrecognized(&doc.extra, strict, Self::KIND)?;
        check_oid(&doc.oid, strict, Self::KIND)?;
        let (value, value_json) = read_payload(doc.value_base64, doc.value_json, Self::KIND)?;
        Ok(ParsedDocument {
            envelope: ExtendedRequest::new(doc.oid, value),
            name: doc.request_name,
            value_json,
        })
    }
}

impl JsonEnvelope for ExtendedResult {
    fn to_document(&self, name: Option<&str>, value_json: Option<Value>) -> Value {
        let mut document = Map::new();
        document.insert(
            RESULT_CODE.to_string(),
            Value::from(self.result_code().value()),
        );
        insert_opt(&mut document, MATCHED_DN, self.matched_dn());
        insert_opt(&mut document, DIAGNOSTIC_MESSAGE, self.diagnostic_message());
        if !self.referral_urls().is_empty() {
            document.insert(
                REFERRAL_URLS.to_string(),
                Value::from(self.referral_urls().to_vec()),
            );
        }
        insert_opt(&mut document, OID, self.oid());
        insert_opt(&mut document, RESPONSE_NAME, name);
        write_payload(&mut document, self.value(), value_json);
        Value::Object(document)
    }

    fn parse_document(document: &Value, strict: bool) -> DecodeResult<ParsedDocument<Self>> {
        let doc: ExtendedResultDocument = read_document(document, Self::KIND)?;
        check_unrecognized(&doc.extra, strict, Self::KIND)?;
        if let Some(oid) = &doc.oid {
            check_oid(oid, strict, Self::KIND)?;
        }
        let (value, value_json) = read_payload(doc.value_base64, doc.value_json, Self::KIND)?;
        let result = OperationResult {
            result_code: ResultCode::new(doc.result_code),
            matched_dn: doc.matched_dn.filter(|s| !s.is_empty()),
            diagnostic_message: doc.diagnostic_message.filter(|s| !s.is_empty()),
            referral_urls: doc.referral_urls,
        };
        Ok(ParsedDocument {
            envelope: ExtendedResult::new(result, doc.oid, value),
            name: doc.response_name,
            value_json,
        })
    }
}

impl JsonEnvelope for IntermediateResponse {
    fn to_document(&self, name: Option<&str>, value_json: Option<Value>) -> Value {
        let mut document = Map::new();
        insert_opt(&mut document, OID, self.oid());
        insert_opt(&mut document, RESPONSE_NAME, name);
        write_payload(&mut document, self.value(), value_json);
        Value::Object(document)
    }

    fn parse_document(document: &Value, strict: bool) -> DecodeResult<ParsedDocument<Self>> {
        let doc: IntermediateResponseDocument = read_document(document, Self::KIND)?;
        check_unrecognized(&doc.extra, strict, Self::KIND)?;
        if let Some(oid) = &doc.oid {
            check_oid(oid, strict, Self::KIND)?;
        }
        let (value, value_json) = read_payload(doc.value_base64, doc.value_json, Self::KIND)?;
        Ok(ParsedDocument {
            envelope: IntermediateResponse::new(doc.oid, value),
            name: doc.response_name,
            value_json,
        })
    }
}
