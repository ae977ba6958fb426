//! Transaction specification request control (RFC 5805)
//!
//! Attached to each update that belongs to a transaction. The value is the
//! raw transaction identifier returned by the Start Transaction operation.

use bytes::Bytes;
use ldap_core::DecodeResult;
use ldap_protocol::envelope::{check_oid, require_value};
use ldap_protocol::json::payload::{decode_base64, encode_base64, from_payload, to_payload};
use ldap_protocol::{Control, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Payload {
    transaction_id_base64: String,
}

const PAYLOAD_FIELDS: &[&str] = &["transaction-id-base64"];

/// Transaction specification request control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSpecificationRequestControl {
    critical: bool,
    transaction_id: Bytes,
}

impl TransactionSpecificationRequestControl {
    /// Create a critical control for the given transaction
    pub fn new(transaction_id: impl Into<Bytes>) -> Self {
        Self {
            critical: true,
            transaction_id: transaction_id.into(),
        }
    }

    pub fn with_criticality(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn transaction_id(&self) -> &Bytes {
        &self.transaction_id
    }
}

impl TypedElement for TransactionSpecificationRequestControl {
    type Envelope = Control;
    const OID: &'static str = "1.3.6.1.1.21.2";
    const NAME: &'static str = "Transaction Specification Request Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        let transaction_id = require_value(control, Self::NAME)?.clone();
        Ok(Self {
            critical: control.is_critical(),
            transaction_id,
        })
    }

    fn to_envelope(&self) -> Control {
        Control::new(Self::OID, self.critical, Some(self.transaction_id.clone()))
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&Payload {
            transaction_id_base64: encode_base64(&self.transaction_id),
        })
    }

    fn decode_json_value(header: &Control, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: Payload = from_payload(value, PAYLOAD_FIELDS, strict, Self::NAME)?;
        let transaction_id = decode_base64(&payload.transaction_id_base64, Self::NAME)?;
        Ok(Self {
            critical: header.is_critical(),
            transaction_id: Bytes::from(transaction_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldap_core::DecodeErrorKind;
    use ldap_protocol::json;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let control = TransactionSpecificationRequestControl::new(Bytes::from_static(b"\x00txn-1\xFF"));
        assert!(control.is_critical());
        let envelope = control.to_envelope();
        assert_eq!(envelope.value().unwrap().as_ref(), b"\x00txn-1\xFF");
        let decoded = TransactionSpecificationRequestControl::decode_envelope(
            &Control::decode_from_bytes(&envelope.encode_to_bytes()).unwrap(),
        )
        .unwrap();
        assert_eq!(decoded, control);
    }

    #[test]
    fn test_empty_identifier_is_a_value() {
        let control = TransactionSpecificationRequestControl::new(Bytes::new());
        let decoded = TransactionSpecificationRequestControl::decode_envelope(&control.to_envelope()).unwrap();
        assert!(decoded.transaction_id().is_empty());
    }

    #[test]
    fn test_missing_value() {
        let control = Control::new(TransactionSpecificationRequestControl::OID, true, None);
        assert_eq!(
            TransactionSpecificationRequestControl::decode_envelope(&control)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::MissingValue
        );
    }

    #[test]
    fn test_json_round_trip() {
        let control = TransactionSpecificationRequestControl::new(Bytes::from_static(b"abc"))
            .with_criticality(false);
        let document = json::encode_typed(&control);
        assert_eq!(document["value-json"], json!({ "transaction-id-base64": "YWJj" }));
        assert_eq!(
            json::decode_typed::<TransactionSpecificationRequestControl>(&document, true).unwrap(),
            control
        );

        let bad = json!({
            "oid": TransactionSpecificationRequestControl::OID,
            "criticality": true,
            "value-json": { "transaction-id-base64": "*" }
        });
        assert_eq!(
            json::decode_typed::<TransactionSpecificationRequestControl>(&bad, false)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::DecodingError
        );
    }
}
