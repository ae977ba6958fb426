//! LDAP transactions (RFC 5805)
//!
//! ```text
//! txnStartReq  ::= [APPLICATION 23] SEQUENCE {
//!      requestName  [0] "1.3.6.1.1.21.1" }
//!
//! txnStartRes  ::= [APPLICATION 24] SEQUENCE {
//!      COMPONENTS OF LDAPResult,
//!      responseValue [11] OCTET STRING }   -- transaction identifier
//!
//! txnEndReq ::= SEQUENCE {
//!      commit         BOOLEAN DEFAULT TRUE,
//!      identifier     OCTET STRING }
//!
//! txnEndRes ::= SEQUENCE {
//!      messageID      MessageID OPTIONAL,
//!      updatesControls SEQUENCE OF updateControls SEQUENCE {
//!           messageID   MessageID,
//!           controls    Controls } OPTIONAL }
//! ```
//!
//! The transaction results carry no response name, so they cannot be found by
//! OID dispatch. They are decoded explicitly from a generic [`ExtendedResult`]
//! once the caller knows which request it sent.
//!
//! A decoded End Transaction request or result converts back to the value
//! bytes it was received with.

use crate::shape::{expect_element, non_negative, unexpected_element, BOOLEAN, INTEGER, OCTET_STRING, SEQUENCE};
use bytes::Bytes;
use ldap_asn1::{check_element_count, BerElement};
use ldap_core::{DecodeBehavior, DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value, forbid_value};
use ldap_protocol::json::payload::{decode_base64, encode_base64, from_payload, to_payload};
use ldap_protocol::{
    decode_controls, Control, ExtendedRequest, ExtendedResult, OperationResult, Registry, SourceValue,
    TypedElement,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Start Transaction extended request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartTransactionExtendedRequest;

impl StartTransactionExtendedRequest {
    pub fn new() -> Self {
        Self
    }
}

impl TypedElement for StartTransactionExtendedRequest {
    type Envelope = ExtendedRequest;
    const OID: &'static str = "1.3.6.1.1.21.1";
    const NAME: &'static str = "Start Transaction Extended Request";

    fn decode_envelope(request: &ExtendedRequest) -> DecodeResult<Self> {
        check_oid(request, Self::OID, Self::NAME)?;
        forbid_value(request, Self::NAME)?;
        Ok(Self)
    }

    fn to_envelope(&self) -> ExtendedRequest {
        ExtendedRequest::new(Self::OID, None)
    }
}

/// Start Transaction extended result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTransactionExtendedResult {
    result: OperationResult,
    transaction_id: Option<Bytes>,
}

impl StartTransactionExtendedResult {
    const NAME: &'static str = "Start Transaction Extended Result";

    /// Successful result
    pub fn new(transaction_id: impl Into<Bytes>) -> Self {
        Self {
            result: OperationResult::success(),
            transaction_id: Some(transaction_id.into()),
        }
    }

    /// Failed result without an identifier
    ///
    /// # Panics
    /// Panics if `result` is a success.
    pub fn failure(result: OperationResult) -> Self {
        assert!(
            !result.result_code.is_success(),
            "a successful result must carry a transaction identifier"
        );
        Self {
            result,
            transaction_id: None,
        }
    }

    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    pub fn transaction_id(&self) -> Option<&Bytes> {
        self.transaction_id.as_ref()
    }

    /// Decode from the generic result of a Start Transaction request
    ///
    /// # Errors
    /// `MissingValue` if a successful result has no identifier
    pub fn from_extended_result(result: &ExtendedResult) -> DecodeResult<Self> {
        let transaction_id = result.value().cloned();
        if transaction_id.is_none() && result.result_code().is_success() {
            return Err(DecodeError::MissingValue(format!(
                "Successful {} requires a transaction identifier",
                Self::NAME
            )));
        }
        Ok(Self {
            result: result.result().clone(),
            transaction_id,
        })
    }

    pub fn to_extended_result(&self) -> ExtendedResult {
        ExtendedResult::new(self.result.clone(), None, self.transaction_id.clone())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct EndRequestPayload {
    transaction_id_base64: String,
    #[serde(default = "default_commit")]
    commit: bool,
}

fn default_commit() -> bool {
    true
}

const END_REQUEST_FIELDS: &[&str] = &["transaction-id-base64", "commit"];

/// End Transaction extended request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTransactionExtendedRequest {
    commit: bool,
    transaction_id: Bytes,
    source: SourceValue,
}

impl EndTransactionExtendedRequest {
    pub fn new(transaction_id: impl Into<Bytes>, commit: bool) -> Self {
        Self {
            commit,
            transaction_id: transaction_id.into(),
            source: SourceValue::none(),
        }
    }

    /// Request to commit the transaction
    pub fn commit(transaction_id: impl Into<Bytes>) -> Self {
        Self::new(transaction_id, true)
    }

    /// Request to abort the transaction
    pub fn abort(transaction_id: impl Into<Bytes>) -> Self {
        Self::new(transaction_id, false)
    }

    pub fn is_commit(&self) -> bool {
        self.commit
    }

    pub fn transaction_id(&self) -> &Bytes {
        &self.transaction_id
    }
}

impl TypedElement for EndTransactionExtendedRequest {
    type Envelope = ExtendedRequest;
    const OID: &'static str = "1.3.6.1.1.21.3";
    const NAME: &'static str = "End Transaction Extended Request";

    fn decode_envelope(request: &ExtendedRequest) -> DecodeResult<Self> {
        check_oid(request, Self::OID, Self::NAME)?;
        let element = decode_value_element(request, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 1, 2, Self::NAME)?;

        let commit = match children.len() {
            2 => {
                expect_element(&children[0], BOOLEAN, "Transaction commit flag")?;
                children[0].as_boolean()?
            }
            _ => true,
        };
        let identifier = &children[children.len() - 1];
        expect_element(identifier, OCTET_STRING, "Transaction identifier")?;

        Ok(Self {
            commit,
            transaction_id: Bytes::copy_from_slice(identifier.as_octet_string()?),
            source: SourceValue::of(request),
        })
    }

    fn to_envelope(&self) -> ExtendedRequest {
        let value = self.source.or_encode(|| {
            let mut children = Vec::with_capacity(2);
            if !self.commit {
                children.push(BerElement::boolean(false));
            }
            children.push(BerElement::octet_string(self.transaction_id.to_vec()));
            Some(element_value(&BerElement::sequence(children)))
        });
        ExtendedRequest::new(Self::OID, value)
    }

    fn to_json_value(&self) -> Option<Value> {
        to_payload(&EndRequestPayload {
            transaction_id_base64: encode_base64(&self.transaction_id),
            commit: self.commit,
        })
    }

    fn decode_json_value(header: &ExtendedRequest, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: EndRequestPayload = from_payload(value, END_REQUEST_FIELDS, strict, Self::NAME)?;
        let transaction_id = decode_base64(&payload.transaction_id_base64, Self::NAME)?;
        Ok(Self::new(transaction_id, payload.commit))
    }
}

/// Controls returned for one operation of a committed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateControls {
    message_id: i32,
    controls: BerElement,
}

impl UpdateControls {
    pub fn new(message_id: i32, controls: &[Control]) -> Self {
        Self {
            message_id,
            controls: Control::encode_list(controls),
        }
    }

    /// Message ID of the operation the controls belong to
    pub fn message_id(&self) -> i32 {
        self.message_id
    }

    /// Controls as generic envelopes
    ///
    /// # Errors
    /// The first control that does not parse
    pub fn controls(&self) -> DecodeResult<Vec<Control>> {
        Control::decode_list(&self.controls)
    }

    /// Controls decoded through `registry` under `behavior`
    pub fn decode_controls<T: From<Control>>(
        &self,
        registry: &Registry<Control, T>,
        behavior: &DecodeBehavior,
        diagnostics: &mut Vec<String>,
    ) -> DecodeResult<Vec<T>> {
        decode_controls(&self.controls, registry, behavior, diagnostics)
    }

    fn to_element(&self) -> BerElement {
        BerElement::sequence(vec![
            BerElement::integer(i64::from(self.message_id)),
            self.controls.clone(),
        ])
    }

    fn from_element(element: &BerElement) -> DecodeResult<Self> {
        const WHAT: &str = "Update controls";
        expect_element(element, SEQUENCE, WHAT)?;
        let children = element.as_sequence()?;
        check_element_count(children, 2, 2, WHAT)?;
        expect_element(&children[0], INTEGER, "Update message ID")?;
        let message_id = non_negative(&children[0], "Update message ID")?;
        expect_element(&children[1], SEQUENCE, "Update controls list")?;
        Ok(Self {
            message_id,
            controls: children[1].clone(),
        })
    }
}

/// End Transaction extended result
///
/// The per-operation controls are kept as received. Reading them through
/// [`UpdateControls::decode_controls`] applies a [`DecodeBehavior`], so one
/// malformed non-critical control does not have to fail the whole result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTransactionExtendedResult {
    result: OperationResult,
    failed_message_id: Option<i32>,
    update_controls: Vec<UpdateControls>,
    source: SourceValue,
}

impl EndTransactionExtendedResult {
    const NAME: &'static str = "End Transaction Extended Result";

    pub fn new(
        result: OperationResult,
        failed_message_id: Option<i32>,
        update_controls: Vec<UpdateControls>,
    ) -> Self {
        Self {
            result,
            failed_message_id,
            update_controls,
            source: SourceValue::none(),
        }
    }

    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    /// Message ID of the operation that caused the transaction to fail
    pub fn failed_message_id(&self) -> Option<i32> {
        self.failed_message_id
    }

    pub fn update_controls(&self) -> &[UpdateControls] {
        &self.update_controls
    }

    /// Decode from the generic result of an End Transaction request
    ///
    /// Only the outer structure is checked here; embedded controls are
    /// decoded on demand.
    pub fn from_extended_result(result: &ExtendedResult) -> DecodeResult<Self> {
        let mut decoded = Self::new(result.result().clone(), None, Vec::new());
        decoded.source = SourceValue::of(result);
        if result.value().is_none() {
            return Ok(decoded);
        }

        let element = decode_value_element(result, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 0, 2, Self::NAME)?;

        let mut next_slot = 0;
        for child in children {
            let slot = match child.tag() {
                INTEGER => {
                    decoded.failed_message_id = Some(non_negative(child, "Failed message ID")?);
                    0
                }
                SEQUENCE => {
                    decoded.update_controls = child
                        .as_sequence()?
                        .iter()
                        .map(UpdateControls::from_element)
                        .collect::<DecodeResult<Vec<_>>>()?;
                    1
                }
                _ => return Err(unexpected_element(child, Self::NAME)),
            };
            if slot < next_slot {
                return Err(DecodeError::InvalidElementType(format!(
                    "{} element {} is out of order or repeated",
                    Self::NAME,
                    child.tag()
                )));
            }
            next_slot = slot + 1;
        }

        Ok(decoded)
    }

    pub fn to_extended_result(&self) -> ExtendedResult {
        let value = self.source.or_encode(|| {
            let mut children = Vec::with_capacity(2);
            if let Some(id) = self.failed_message_id {
                children.push(BerElement::integer(i64::from(id)));
            }
            if !self.update_controls.is_empty() {
                children.push(BerElement::sequence(
                    self.update_controls.iter().map(UpdateControls::to_element).collect(),
                ));
            }
            if children.is_empty() {
                None
            } else {
                Some(element_value(&BerElement::sequence(children)))
            }
        });
        ExtendedResult::new(self.result.clone(), None, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{control_registry, KnownControl, ManageDsaItRequestControl};
    use ldap_core::DecodeErrorKind;
    use ldap_protocol::json;
    use ldap_protocol::ResultCode;
    use serde_json::json;

    #[test]
    fn test_start_request() {
        let envelope = StartTransactionExtendedRequest::new().to_envelope();
        assert!(envelope.value().is_none());
        assert_eq!(
            StartTransactionExtendedRequest::decode_envelope(&envelope).unwrap(),
            StartTransactionExtendedRequest
        );

        let with_value = ExtendedRequest::new(StartTransactionExtendedRequest::OID, Some(Bytes::new()));
        assert_eq!(
            StartTransactionExtendedRequest::decode_envelope(&with_value)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::DecodingError
        );
    }

    #[test]
    fn test_start_result() {
        let result = StartTransactionExtendedResult::new(Bytes::from_static(b"txn-42"));
        let generic = ExtendedResult::decode_from_bytes(&result.to_extended_result().encode_to_bytes()).unwrap();
        assert_eq!(generic.oid(), None);
        assert_eq!(
            StartTransactionExtendedResult::from_extended_result(&generic).unwrap(),
            result
        );

        let missing = ExtendedResult::new(OperationResult::success(), None, None);
        assert_eq!(
            StartTransactionExtendedResult::from_extended_result(&missing)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::MissingValue
        );

        let failed = StartTransactionExtendedResult::failure(OperationResult::new(ResultCode::BUSY));
        assert_eq!(
            StartTransactionExtendedResult::from_extended_result(&failed.to_extended_result()).unwrap(),
            failed
        );
    }

    #[test]
    fn test_end_request_round_trip() {
        let commit = EndTransactionExtendedRequest::commit(Bytes::from_static(b"t"));
        assert_eq!(
            commit.to_envelope().value().unwrap().as_ref(),
            &[0x30, 0x03, 0x04, 0x01, b't']
        );
        let abort = EndTransactionExtendedRequest::abort(Bytes::from_static(b"t"));
        assert_eq!(
            abort.to_envelope().value().unwrap().as_ref(),
            &[0x30, 0x06, 0x01, 0x01, 0x00, 0x04, 0x01, b't']
        );
        for request in [commit, abort] {
            let bytes = request.to_envelope().encode_to_bytes();
            let decoded = EndTransactionExtendedRequest::decode_envelope(
                &ExtendedRequest::decode_from_bytes(&bytes).unwrap(),
            )
            .unwrap();
            assert_eq!(decoded, request);
        }
    }

    #[test]
    fn test_end_request_explicit_commit_kept() {
        let value = BerElement::sequence(vec![
            BerElement::boolean(true),
            BerElement::octet_string(b"t".to_vec()),
        ]);
        let received = ExtendedRequest::new(EndTransactionExtendedRequest::OID, Some(element_value(&value)));
        let decoded = EndTransactionExtendedRequest::decode_envelope(&received).unwrap();
        assert_eq!(decoded, EndTransactionExtendedRequest::commit(Bytes::from_static(b"t")));
        assert_eq!(decoded.to_envelope(), received);
        assert_eq!(
            EndTransactionExtendedRequest::commit(Bytes::from_static(b"t"))
                .to_envelope()
                .value()
                .unwrap()
                .as_ref(),
            &[0x30, 0x03, 0x04, 0x01, b't']
        );
    }

    #[test]
    fn test_end_request_malformed() {
        let with_value = |value: BerElement| {
            ExtendedRequest::new(EndTransactionExtendedRequest::OID, Some(element_value(&value)))
        };

        let missing = ExtendedRequest::new(EndTransactionExtendedRequest::OID, None);
        assert_eq!(
            EndTransactionExtendedRequest::decode_envelope(&missing).unwrap_err().kind(),
            DecodeErrorKind::MissingValue
        );

        let empty = with_value(BerElement::sequence(vec![]));
        assert_eq!(
            EndTransactionExtendedRequest::decode_envelope(&empty).unwrap_err().kind(),
            DecodeErrorKind::InvalidElementCount
        );

        let swapped = with_value(BerElement::sequence(vec![
            BerElement::octet_string(b"t".to_vec()),
            BerElement::boolean(false),
        ]));
        assert_eq!(
            EndTransactionExtendedRequest::decode_envelope(&swapped).unwrap_err().kind(),
            DecodeErrorKind::InvalidElementType
        );
    }

    #[test]
    fn test_end_request_json() {
        let request = EndTransactionExtendedRequest::abort(Bytes::from_static(b"abc"));
        let document = json::encode_typed(&request);
        assert_eq!(
            document["value-json"],
            json!({ "transaction-id-base64": "YWJj", "commit": false })
        );
        assert_eq!(
            json::decode_typed::<EndTransactionExtendedRequest>(&document, true).unwrap(),
            request
        );

        let implicit_commit = json!({
            "oid": EndTransactionExtendedRequest::OID,
            "value-json": { "transaction-id-base64": "YWJj" }
        });
        assert!(json::decode_typed::<EndTransactionExtendedRequest>(&implicit_commit, true)
            .unwrap()
            .is_commit());
    }

    #[test]
    fn test_end_result_round_trip() {
        let result = EndTransactionExtendedResult::new(
            OperationResult::success(),
            None,
            vec![
                UpdateControls::new(3, &[ManageDsaItRequestControl::new().to_envelope()]),
                UpdateControls::new(4, &[]),
            ],
        );
        let generic = ExtendedResult::decode_from_bytes(&result.to_extended_result().encode_to_bytes()).unwrap();
        let decoded = EndTransactionExtendedResult::from_extended_result(&generic).unwrap();
        assert_eq!(decoded, result);
        assert_eq!(decoded.update_controls()[0].message_id(), 3);
        assert_eq!(
            decoded.update_controls()[0].controls().unwrap(),
            vec![ManageDsaItRequestControl::new().to_envelope()]
        );

        let failed = EndTransactionExtendedResult::new(OperationResult::new(ResultCode::OTHER), Some(7), vec![]);
        let decoded = EndTransactionExtendedResult::from_extended_result(&failed.to_extended_result()).unwrap();
        assert_eq!(decoded.failed_message_id(), Some(7));

        let empty = EndTransactionExtendedResult::new(OperationResult::success(), None, vec![]);
        assert!(empty.to_extended_result().value().is_none());
    }

    #[test]
    fn test_end_result_empty_sequence_kept() {
        let received = ExtendedResult::new(
            OperationResult::success(),
            None,
            Some(Bytes::from_static(&[0x30, 0x00])),
        );
        let decoded = EndTransactionExtendedResult::from_extended_result(&received).unwrap();
        assert_eq!(
            decoded,
            EndTransactionExtendedResult::new(OperationResult::success(), None, vec![])
        );
        assert_eq!(decoded.to_extended_result(), received);
    }

    #[test]
    fn test_end_result_guarded_controls() {
        let bad = Control::new(ManageDsaItRequestControl::OID, false, Some(Bytes::from_static(b"x")));
        let good = ManageDsaItRequestControl::with_criticality(true).to_envelope();
        let update = UpdateControls::new(9, &[bad, good]);
        let result = EndTransactionExtendedResult::new(OperationResult::success(), None, vec![update]);
        let decoded = EndTransactionExtendedResult::from_extended_result(&result.to_extended_result()).unwrap();
        let update = &decoded.update_controls()[0];

        let mut diagnostics = Vec::new();
        let controls = update
            .decode_controls(control_registry(), &DecodeBehavior::lenient(), &mut diagnostics)
            .unwrap();
        assert_eq!(
            controls,
            vec![KnownControl::ManageDsaIt(ManageDsaItRequestControl::with_criticality(true))]
        );
        assert_eq!(diagnostics.len(), 1);

        let err = update
            .decode_controls(control_registry(), &DecodeBehavior::strict(), &mut diagnostics)
            .unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::DecodingError);
    }

    #[test]
    fn test_end_result_malformed() {
        let with_value = |value: BerElement| {
            ExtendedResult::new(OperationResult::success(), None, Some(element_value(&value)))
        };

        let reversed = with_value(BerElement::sequence(vec![
            BerElement::sequence(vec![]),
            BerElement::integer(1),
        ]));
        assert_eq!(
            EndTransactionExtendedResult::from_extended_result(&reversed)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::InvalidElementType
        );

        let negative_id = with_value(BerElement::sequence(vec![BerElement::integer(-1)]));
        assert_eq!(
            EndTransactionExtendedResult::from_extended_result(&negative_id)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::ValueOutOfRange
        );

        let short_update = with_value(BerElement::sequence(vec![BerElement::sequence(vec![
            BerElement::sequence(vec![BerElement::integer(1)]),
        ])]));
        assert_eq!(
            EndTransactionExtendedResult::from_extended_result(&short_update)
                .unwrap_err()
                .kind(),
            DecodeErrorKind::InvalidElementCount
        );
    }
}
