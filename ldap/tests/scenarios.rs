//! End-to-end scenarios across the BER codec, envelopes, registries and the
//! JSON document codec.

use bytes::Bytes;
use ldap::ber::{BerElement, BerStreamReader, StreamReaderConfig};
use ldap::extensions::{
    control_registry, extended_request_registry, extended_result_registry,
    intermediate_response_registry, EndTransactionExtendedResult, ExcludeBranchRequestControl,
    GeneratePasswordExtendedRequest, GeneratePasswordExtendedResult, GeneratedPassword,
    GetBackupCompatibilityDescriptorExtendedRequest, JsonFormattedRequestControl,
    JsonFormattedResponseControl, KnownControl,
    KnownExtendedRequest, ManageDsaItRequestControl, MissingChangelogEntriesIntermediateResponse,
    PasswordPolicyErrorType, PasswordPolicyResponseControl, PasswordPolicySelection,
    PasswordPolicyWarning, TransactionSpecificationRequestControl,
};
use ldap::json;
use ldap::protocol::{
    Control, ExtendedRequest, ExtendedResult, IntermediateResponse, OperationResult, TypedElement,
};
use ldap::{DecodeBehavior, DecodeErrorKind, LdapError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

#[test]
fn test_generate_password_five_and_ten() {
    let request = GeneratePasswordExtendedRequest::for_default_policy(5, 10);

    let bytes = request.to_envelope().encode_to_bytes();
    let generic = ExtendedRequest::decode_from_bytes(&bytes).unwrap();
    let decoded = match extended_request_registry().decode(&generic).unwrap() {
        KnownExtendedRequest::GeneratePassword(decoded) => decoded,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(decoded.selection(), &PasswordPolicySelection::Default);
    assert_eq!(decoded.number_of_passwords(), 5);
    assert_eq!(decoded.validation_attempts(), 10);

    let document = json::encode_typed(&request);
    let text = document.to_string();
    let reparsed = json::parse_text(&text).unwrap();
    assert_eq!(
        json::decode_typed::<GeneratePasswordExtendedRequest>(&reparsed, true).unwrap(),
        request
    );
}

#[test]
fn test_generate_password_zero_rejected() {
    let value = BerElement::sequence(vec![BerElement::integer(0).with_context_tag(3)]);
    let generic = ExtendedRequest::new(
        GeneratePasswordExtendedRequest::OID,
        Some(Bytes::from(value.encode())),
    );
    assert_eq!(
        extended_request_registry().decode(&generic).unwrap_err().kind(),
        DecodeErrorKind::ValueOutOfRange
    );

    let document = json!({
        "oid": GeneratePasswordExtendedRequest::OID,
        "value-json": { "number-of-passwords": 0 }
    });
    assert_eq!(
        json::decode_registered(&document, extended_request_registry(), false)
            .unwrap_err()
            .kind(),
        DecodeErrorKind::ValueOutOfRange
    );
}

#[test]
fn test_third_party_json_formatted_text_kept() {
    let received = Control::new(
        JsonFormattedRequestControl::OID,
        false,
        Some(Bytes::from_static(b"{ \"controls\" : [] }")),
    );
    let typed = control_registry().decode(&received).unwrap();
    match &typed {
        KnownControl::JsonFormattedRequest(control) => assert!(control.controls().is_empty()),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(typed.to_envelope(), received);
    assert_eq!(
        typed.to_envelope().value().unwrap().as_ref(),
        b"{ \"controls\" : [] }"
    );

    let built = JsonFormattedRequestControl::new(Vec::new()).to_envelope();
    assert_eq!(built.value().unwrap().as_ref(), b"{\"controls\":[]}");
}

#[test]
fn test_third_party_generate_password_values_kept() {
    let explicit_default = ExtendedRequest::new(
        GeneratePasswordExtendedRequest::OID,
        Some(Bytes::from_static(b"\x30\x02\x80\x00")),
    );
    let typed = extended_request_registry().decode(&explicit_default).unwrap();
    assert_eq!(
        typed,
        KnownExtendedRequest::GeneratePassword(GeneratePasswordExtendedRequest::new())
    );
    assert_eq!(typed.to_envelope(), explicit_default);

    let non_minimal_count = ExtendedRequest::new(
        GeneratePasswordExtendedRequest::OID,
        Some(Bytes::from_static(b"\x30\x04\x83\x02\x00\x05")),
    );
    let typed = extended_request_registry().decode(&non_minimal_count).unwrap();
    match &typed {
        KnownExtendedRequest::GeneratePassword(request) => {
            assert_eq!(request.number_of_passwords(), 5);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(typed.to_envelope(), non_minimal_count);

    // Through the wire and back, the received bytes are unchanged.
    let bytes = non_minimal_count.encode_to_bytes();
    let generic = ExtendedRequest::decode_from_bytes(&bytes).unwrap();
    let typed = extended_request_registry().decode(&generic).unwrap();
    assert_eq!(typed.to_envelope().encode_to_bytes(), bytes);
}

#[test]
fn test_exclude_branch_scenarios() {
    let empty_list = BerElement::sequence(vec![BerElement::sequence(vec![]).with_context_tag(0)]);
    let generic = Control::new(
        ExcludeBranchRequestControl::OID,
        true,
        Some(Bytes::from(empty_list.encode())),
    );
    assert_eq!(
        control_registry().decode(&generic).unwrap_err().kind(),
        DecodeErrorKind::InvalidElementCount
    );

    let control = ExcludeBranchRequestControl::new(vec![
        "ou=second,dc=example,dc=com".to_string(),
        "ou=first,dc=example,dc=com".to_string(),
    ]);
    let generic = Control::decode_from_bytes(&control.to_envelope().encode_to_bytes()).unwrap();
    match control_registry().decode(&generic).unwrap() {
        KnownControl::ExcludeBranch(decoded) => {
            assert_eq!(decoded.base_dns(), control.base_dns());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_generic_control_without_value() {
    let control = Control::new("1.2.3.4", false, None);
    let document = json::encode_generic(&control, control_registry());
    assert_eq!(
        document,
        json!({ "oid": "1.2.3.4", "control-name": "1.2.3.4", "criticality": false })
    );
    assert_eq!(
        json::decode_generic(&document, control_registry(), true).unwrap(),
        control
    );
    assert_eq!(
        json::decode_registered(&document, control_registry(), true).unwrap(),
        KnownControl::Generic(control)
    );
}

fn typed_controls() -> Vec<Control> {
    vec![
        ExcludeBranchRequestControl::with_criticality(false, vec!["ou=x".to_string()]).to_envelope(),
        ManageDsaItRequestControl::with_criticality(true).to_envelope(),
        PasswordPolicyResponseControl::new(
            Some(PasswordPolicyWarning::time_before_expiration(3600)),
            Some(PasswordPolicyErrorType::PasswordTooShort),
        )
        .to_envelope(),
        TransactionSpecificationRequestControl::new(Bytes::from_static(b"\x00\x01")).to_envelope(),
        JsonFormattedResponseControl::from_controls(&[Control::new("1.2.3.4", true, None)])
            .to_envelope(),
    ]
}

#[test]
fn test_typed_controls_round_trip_through_generic() {
    for envelope in typed_controls() {
        let generic = Control::decode_from_bytes(&envelope.encode_to_bytes()).unwrap();
        let typed = control_registry().decode(&generic).unwrap();
        assert!(!typed.is_generic(), "{} was not dispatched", envelope.oid());
        assert_eq!(typed.to_envelope(), envelope);
    }
}

#[test]
fn test_structured_and_base64_documents_agree() {
    for envelope in typed_controls() {
        let Some(value) = envelope.value() else {
            continue;
        };
        let structured = json::encode_generic(&envelope, control_registry());
        assert!(structured.get("value-json").is_some(), "{}", envelope.oid());
        let binary = json!({
            "oid": envelope.oid(),
            "criticality": envelope.is_critical(),
            "value-base64": json::payload::encode_base64(value)
        });

        let from_structured = json::decode_registered(&structured, control_registry(), true).unwrap();
        let from_binary = json::decode_registered(&binary, control_registry(), true).unwrap();
        assert_eq!(from_structured, from_binary);
        assert_eq!(
            json::decode_generic(&structured, control_registry(), true).unwrap(),
            envelope
        );
    }
}

#[test]
fn test_extended_operations_round_trip_through_generic() {
    let requests = vec![
        GeneratePasswordExtendedRequest::for_policy("cn=p", 2, 0).to_envelope(),
        GetBackupCompatibilityDescriptorExtendedRequest::new("dc=example,dc=com").to_envelope(),
    ];
    for envelope in requests {
        let generic = ExtendedRequest::decode_from_bytes(&envelope.encode_to_bytes()).unwrap();
        let typed = extended_request_registry().decode(&generic).unwrap();
        assert_eq!(typed.to_envelope(), envelope);
        let document = json::encode_generic(&envelope, extended_request_registry());
        assert_eq!(
            json::decode_registered(&document, extended_request_registry(), true).unwrap(),
            typed
        );
    }

    let result = GeneratePasswordExtendedResult::new(
        "cn=p",
        vec![GeneratedPassword::new("secret", false, Vec::new())],
    );
    let envelope = result.to_envelope();
    let generic = ExtendedResult::decode_from_bytes(&envelope.encode_to_bytes()).unwrap();
    let typed = extended_result_registry().decode(&generic).unwrap();
    assert_eq!(typed.to_envelope(), envelope);

    let response = MissingChangelogEntriesIntermediateResponse::new(Some("gap".to_string()));
    let envelope = response.to_envelope();
    let generic = IntermediateResponse::decode_from_bytes(&envelope.encode_to_bytes()).unwrap();
    assert_eq!(
        intermediate_response_registry().decode(&generic).unwrap().to_envelope(),
        envelope
    );
}

#[test]
fn test_strict_and_lenient_documents() {
    let request = GetBackupCompatibilityDescriptorExtendedRequest::new("dc=x");
    let mut document = json::encode_typed(&request);
    document["value-json"]["scope"] = json!("sub");

    assert_eq!(
        json::decode_registered(&document, extended_request_registry(), true)
            .unwrap_err()
            .kind(),
        DecodeErrorKind::UnrecognizedField
    );
    assert_eq!(
        json::decode_registered(&document, extended_request_registry(), false).unwrap(),
        KnownExtendedRequest::GetBackupCompatibilityDescriptor(request.clone())
    );

    let mut document = json::encode_typed(&request);
    document["comment"] = json!("hello");
    assert_eq!(
        json::decode_registered(&document, extended_request_registry(), true)
            .unwrap_err()
            .kind(),
        DecodeErrorKind::UnrecognizedField
    );
    assert!(json::decode_registered(&document, extended_request_registry(), false).is_ok());
}

/// Controls list with, in order: an unparsable item, an invalid critical
/// control, an invalid non-critical control and a valid control
fn mixed_controls_list() -> BerElement {
    let invalid_critical = Control::new(ManageDsaItRequestControl::OID, true, Some(Bytes::new()));
    let invalid_non_critical = Control::new(
        ExcludeBranchRequestControl::OID,
        false,
        Some(Bytes::from_static(b"\x30\x00")),
    );
    BerElement::sequence(vec![
        BerElement::integer(1),
        invalid_critical.to_element(),
        invalid_non_critical.to_element(),
        ManageDsaItRequestControl::new().to_envelope().to_element(),
    ])
}

fn end_transaction_result() -> EndTransactionExtendedResult {
    let value = BerElement::sequence(vec![BerElement::sequence(vec![BerElement::sequence(
        vec![BerElement::integer(2), mixed_controls_list()],
    )])]);
    let generic = ExtendedResult::new(OperationResult::success(), None, Some(Bytes::from(value.encode())));
    EndTransactionExtendedResult::from_extended_result(&generic).unwrap()
}

fn expected_outcome(behavior: &DecodeBehavior) -> Result<usize, DecodeErrorKind> {
    if behavior.throw_on_unparsable_object {
        Err(DecodeErrorKind::UnexpectedTag)
    } else if behavior.throw_on_invalid_critical_element {
        Err(DecodeErrorKind::DecodingError)
    } else if behavior.throw_on_invalid_non_critical_element {
        Err(DecodeErrorKind::InvalidElementCount)
    } else {
        Ok(3)
    }
}

fn all_behaviors() -> Vec<DecodeBehavior> {
    let mut behaviors = Vec::new();
    for unparsable in [false, true] {
        for critical in [false, true] {
            for non_critical in [false, true] {
                behaviors.push(
                    DecodeBehavior::permissive()
                        .with_throw_on_unparsable_object(unparsable)
                        .with_throw_on_invalid_critical_element(critical)
                        .with_throw_on_invalid_non_critical_element(non_critical),
                );
            }
        }
    }
    behaviors
}

#[test]
fn test_policy_matrix_binary() {
    let result = end_transaction_result();
    let update = &result.update_controls()[0];
    assert_eq!(update.message_id(), 2);

    for behavior in all_behaviors() {
        let mut diagnostics = Vec::new();
        let outcome = update.decode_controls(control_registry(), &behavior, &mut diagnostics);
        match expected_outcome(&behavior) {
            Ok(skipped) => {
                assert_eq!(
                    outcome.unwrap(),
                    vec![KnownControl::ManageDsaIt(ManageDsaItRequestControl::new())],
                    "{:?}",
                    behavior
                );
                assert_eq!(diagnostics.len(), skipped);
            }
            Err(kind) => assert_eq!(outcome.unwrap_err().kind(), kind, "{:?}", behavior),
        }
    }
}

#[test]
fn test_policy_matrix_json() {
    let wrapper = JsonFormattedResponseControl::new(vec![
        json!({ "oid": ManageDsaItRequestControl::OID }),
        json!({ "oid": ManageDsaItRequestControl::OID, "criticality": true, "value-base64": "" }),
        json!({
            "oid": ExcludeBranchRequestControl::OID,
            "criticality": false,
            "value-json": { "base-dns": [] }
        }),
        json!({ "oid": ManageDsaItRequestControl::OID, "criticality": false }),
    ]);
    let envelope = Control::decode_from_bytes(&wrapper.to_envelope().encode_to_bytes()).unwrap();
    let wrapper = match control_registry().decode(&envelope).unwrap() {
        KnownControl::JsonFormattedResponse(wrapper) => wrapper,
        other => panic!("unexpected {:?}", other),
    };

    for behavior in all_behaviors() {
        let mut diagnostics = Vec::new();
        let outcome = wrapper.decode_embedded_controls(control_registry(), &behavior, &mut diagnostics);
        let expected = match expected_outcome(&behavior) {
            // A document missing `criticality` fails the generic parse with `Decoding`.
            Err(DecodeErrorKind::UnexpectedTag) => Err(DecodeErrorKind::DecodingError),
            other => other,
        };
        match expected {
            Ok(skipped) => {
                assert_eq!(
                    outcome.unwrap(),
                    vec![KnownControl::ManageDsaIt(ManageDsaItRequestControl::new())],
                    "{:?}",
                    behavior
                );
                assert_eq!(diagnostics.len(), skipped);
            }
            Err(kind) => assert_eq!(outcome.unwrap_err().kind(), kind, "{:?}", behavior),
        }
    }
}

#[test]
fn test_default_behavior_is_lenient() {
    let behavior = DecodeBehavior::default();
    assert!(!behavior.strict);
    assert!(behavior.throw_on_unparsable_object);
    assert!(behavior.throw_on_invalid_critical_element);
    assert!(!behavior.throw_on_invalid_non_critical_element);
}

#[test]
fn test_random_input_never_panics() {
    let mut rng = StdRng::seed_from_u64(0x1da9);
    for _ in 0..2000 {
        let len = rng.gen_range(0..48);
        let mut data: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        // Bias towards plausible envelope headers.
        if let Some(first) = data.first_mut() {
            *first = [0x30, 0x77, 0x78, 0x79, *first][rng.gen_range(0..5)];
        }

        if let Ok(control) = Control::decode_from_bytes(&data) {
            let _ = control_registry().decode(&control);
        }
        if let Ok(request) = ExtendedRequest::decode_from_bytes(&data) {
            let _ = extended_request_registry().decode(&request);
        }
        if let Ok(result) = ExtendedResult::decode_from_bytes(&data) {
            let _ = extended_result_registry().decode(&result);
            let _ = EndTransactionExtendedResult::from_extended_result(&result);
        }
        if let Ok(response) = IntermediateResponse::decode_from_bytes(&data) {
            let _ = intermediate_response_registry().decode(&response);
        }

        // Same bytes as a typed payload.
        let control = Control::new(PasswordPolicyResponseControl::OID, false, Some(Bytes::from(data.clone())));
        let _ = control_registry().decode(&control);
        let request = ExtendedRequest::new(GeneratePasswordExtendedRequest::OID, Some(Bytes::from(data)));
        let _ = extended_request_registry().decode(&request);
    }
}

#[tokio::test]
async fn test_stream_of_requests() {
    let first = GeneratePasswordExtendedRequest::for_default_policy(5, 10).to_envelope();
    let second = ExtendedRequest::new("1.3.6.1.4.1.4203.1.11.3", None);
    let first_bytes = first.encode_to_bytes();
    let second_bytes = second.encode_to_bytes();

    let mock = tokio_test::io::Builder::new()
        .read(&first_bytes[..3])
        .read(&first_bytes[3..])
        .read(&second_bytes)
        .build();
    let mut reader = BerStreamReader::new(mock);

    let element = reader.read_element().await.unwrap().unwrap();
    let typed = extended_request_registry()
        .decode(&ExtendedRequest::from_element(&element).unwrap())
        .unwrap();
    assert!(matches!(typed, KnownExtendedRequest::GeneratePassword(_)));

    let element = reader.read_element().await.unwrap().unwrap();
    assert_eq!(
        extended_request_registry()
            .decode(&ExtendedRequest::from_element(&element).unwrap())
            .unwrap(),
        KnownExtendedRequest::Generic(second)
    );

    assert!(reader.read_element().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_rejects_oversized_element() {
    let mock = tokio_test::io::Builder::new()
        .read(&[0x77, 0x84, 0x00, 0x10, 0x00, 0x00])
        .build();
    let mut reader = BerStreamReader::with_config(mock, StreamReaderConfig::new(1024));
    match reader.read_element().await {
        Err(LdapError::ElementTooLarge { length, max }) => {
            assert_eq!(length, 0x0010_0000);
            assert_eq!(max, 1024);
        }
        other => panic!("unexpected {:?}", other),
    }
}
