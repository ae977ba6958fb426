//! Generate Password extended operation
//!
//! Asks the server to generate one or more passwords that satisfy a password
//! policy, optionally checking each candidate against the policy's validators.
//!
//! ```text
//! GeneratePasswordRequest ::= SEQUENCE {
//!      passwordPolicySelection     CHOICE {
//!           defaultPolicy  [0] NULL,
//!           passwordPolicyDN [1] LDAPDN,
//!           targetEntryDN  [2] LDAPDN } DEFAULT defaultPolicy,
//!      numberOfPasswords           [3] INTEGER (1..MAX) DEFAULT 1,
//!      numberOfValidationAttempts  [4] INTEGER (0..MAX) DEFAULT 5 }
//!
//! GeneratePasswordResponse ::= SEQUENCE {
//!      passwordPolicyDN    LDAPDN,
//!      generatedPasswords  SEQUENCE OF SEQUENCE {
//!           generatedPassword   OCTET STRING,
//!           validationAttempted BOOLEAN,
//!           validationErrors    [0] SEQUENCE OF OCTET STRING OPTIONAL } }
//! ```
//!
//! Fields equal to their default are left out of a request built from its
//! fields, and a request with every field defaulted has no value at all.
//! Decoded requests and results convert back to the value bytes they were
//! received with.

use crate::shape::{expect_element, string_element, unexpected_element, BOOLEAN, SEQUENCE};
use bytes::Bytes;
use ldap_asn1::{check_element_count, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};
use ldap_protocol::envelope::{check_oid, decode_value_element, element_value};
use ldap_protocol::json::payload::{check_fields, from_payload, to_payload};
use ldap_protocol::{ExtendedRequest, ExtendedResult, OperationResult, SourceValue, TypedElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of passwords generated when the request does not say
pub const DEFAULT_NUMBER_OF_PASSWORDS: i32 = 1;

/// Validation attempts per password when the request does not say
pub const DEFAULT_VALIDATION_ATTEMPTS: i32 = 5;

const DEFAULT_POLICY_TAG: BerTag = BerTag::context_specific(false, 0);
const POLICY_DN_TAG: BerTag = BerTag::context_specific(false, 1);
const TARGET_ENTRY_DN_TAG: BerTag = BerTag::context_specific(false, 2);
const NUMBER_OF_PASSWORDS_TAG: BerTag = BerTag::context_specific(false, 3);
const VALIDATION_ATTEMPTS_TAG: BerTag = BerTag::context_specific(false, 4);
const VALIDATION_ERRORS_TAG: BerTag = BerTag::context_specific(true, 0);

/// Which password policy the server should generate passwords for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PasswordPolicySelection {
    /// The server's default password policy
    #[default]
    Default,
    /// The policy defined in the entry with this DN
    PolicyDn(String),
    /// The policy that governs the entry with this DN
    TargetEntryDn(String),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RequestPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_policy_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_entry_dn: Option<String>,
    #[serde(default)]
    number_of_passwords: Option<i64>,
    #[serde(default)]
    number_of_validation_attempts: Option<i64>,
}

const REQUEST_FIELDS: &[&str] = &[
    "password-policy-dn",
    "target-entry-dn",
    "number-of-passwords",
    "number-of-validation-attempts",
];

/// Generate Password extended request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratePasswordExtendedRequest {
    selection: PasswordPolicySelection,
    number_of_passwords: i32,
    validation_attempts: i32,
    source: SourceValue,
}

impl GeneratePasswordExtendedRequest {
    /// Request one password from the default policy, with default validation
    pub fn new() -> Self {
        Self::for_default_policy(DEFAULT_NUMBER_OF_PASSWORDS, DEFAULT_VALIDATION_ATTEMPTS)
    }

    /// # Panics
    /// Panics if `number_of_passwords` < 1 or `validation_attempts` < 0.
    pub fn for_default_policy(number_of_passwords: i32, validation_attempts: i32) -> Self {
        Self::with_selection(
            PasswordPolicySelection::Default,
            number_of_passwords,
            validation_attempts,
        )
    }

    /// # Panics
    /// Panics if `number_of_passwords` < 1 or `validation_attempts` < 0.
    pub fn for_policy(
        policy_dn: impl Into<String>,
        number_of_passwords: i32,
        validation_attempts: i32,
    ) -> Self {
        Self::with_selection(
            PasswordPolicySelection::PolicyDn(policy_dn.into()),
            number_of_passwords,
            validation_attempts,
        )
    }

    /// # Panics
    /// Panics if `number_of_passwords` < 1 or `validation_attempts` < 0.
    pub fn for_target_entry(
        entry_dn: impl Into<String>,
        number_of_passwords: i32,
        validation_attempts: i32,
    ) -> Self {
        Self::with_selection(
            PasswordPolicySelection::TargetEntryDn(entry_dn.into()),
            number_of_passwords,
            validation_attempts,
        )
    }

    fn with_selection(
        selection: PasswordPolicySelection,
        number_of_passwords: i32,
        validation_attempts: i32,
    ) -> Self {
        assert!(number_of_passwords >= 1, "number of passwords must be at least 1");
        assert!(validation_attempts >= 0, "number of validation attempts must not be negative");
        Self {
            selection,
            number_of_passwords,
            validation_attempts,
            source: SourceValue::none(),
        }
    }

    pub fn selection(&self) -> &PasswordPolicySelection {
        &self.selection
    }

    pub fn number_of_passwords(&self) -> i32 {
        self.number_of_passwords
    }

    pub fn validation_attempts(&self) -> i32 {
        self.validation_attempts
    }

    fn check_number_of_passwords(value: i64) -> DecodeResult<i32> {
        i32::try_from(value).ok().filter(|n| *n >= 1).ok_or_else(|| {
            DecodeError::ValueOutOfRange(format!("Number of passwords must be at least 1, got {}", value))
        })
    }

    fn check_validation_attempts(value: i64) -> DecodeResult<i32> {
        i32::try_from(value).ok().filter(|n| *n >= 0).ok_or_else(|| {
            DecodeError::ValueOutOfRange(format!(
                "Number of validation attempts must not be negative, got {}",
                value
            ))
        })
    }

    fn encode_value(&self) -> Option<Bytes> {
        let mut children = Vec::with_capacity(3);
        match &self.selection {
            PasswordPolicySelection::Default => {}
            PasswordPolicySelection::PolicyDn(dn) => {
                children.push(BerElement::string(dn).with_context_tag(1));
            }
            PasswordPolicySelection::TargetEntryDn(dn) => {
                children.push(BerElement::string(dn).with_context_tag(2));
            }
        }
        if self.number_of_passwords != DEFAULT_NUMBER_OF_PASSWORDS {
            children.push(BerElement::integer(i64::from(self.number_of_passwords)).with_context_tag(3));
        }
        if self.validation_attempts != DEFAULT_VALIDATION_ATTEMPTS {
            children.push(BerElement::integer(i64::from(self.validation_attempts)).with_context_tag(4));
        }

        if children.is_empty() {
            None
        } else {
            Some(element_value(&BerElement::sequence(children)))
        }
    }

    fn decode_fields(children: &[BerElement]) -> DecodeResult<Self> {
        check_element_count(children, 0, 3, Self::NAME)?;

        let mut request = Self::new();
        // Fields must appear in declaration order, each at most once.
        let mut next_slot = 0;
        for child in children {
            let slot = match child.tag() {
                DEFAULT_POLICY_TAG => {
                    child.as_null().map_err(|e| e.context("Default policy selection"))?;
                    request.selection = PasswordPolicySelection::Default;
                    0
                }
                POLICY_DN_TAG => {
                    let dn = child.as_string().map_err(|e| e.context("Password policy DN"))?;
                    request.selection = PasswordPolicySelection::PolicyDn(dn);
                    0
                }
                TARGET_ENTRY_DN_TAG => {
                    let dn = child.as_string().map_err(|e| e.context("Target entry DN"))?;
                    request.selection = PasswordPolicySelection::TargetEntryDn(dn);
                    0
                }
                NUMBER_OF_PASSWORDS_TAG => {
                    let n = child.as_integer().map_err(|e| e.context("Number of passwords"))?;
                    request.number_of_passwords = Self::check_number_of_passwords(n)?;
                    1
                }
                VALIDATION_ATTEMPTS_TAG => {
                    let m = child
                        .as_integer()
                        .map_err(|e| e.context("Number of validation attempts"))?;
                    request.validation_attempts = Self::check_validation_attempts(m)?;
                    2
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
        Ok(request)
    }
}

impl Default for GeneratePasswordExtendedRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedElement for GeneratePasswordExtendedRequest {
    type Envelope = ExtendedRequest;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.6.62";
    const NAME: &'static str = "Generate Password Extended Request";

    fn decode_envelope(request: &ExtendedRequest) -> DecodeResult<Self> {
        check_oid(request, Self::OID, Self::NAME)?;
        let mut decoded = match request.value() {
            None => Self::new(),
            Some(_) => {
                let element = decode_value_element(request, Self::NAME)?;
                let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
                Self::decode_fields(children)?
            }
        };
        decoded.source = SourceValue::of(request);
        Ok(decoded)
    }

    fn to_envelope(&self) -> ExtendedRequest {
        ExtendedRequest::new(Self::OID, self.source.or_encode(|| self.encode_value()))
    }

    fn to_json_value(&self) -> Option<Value> {
        let (policy_dn, target_dn) = match &self.selection {
            PasswordPolicySelection::Default => (None, None),
            PasswordPolicySelection::PolicyDn(dn) => (Some(dn.clone()), None),
            PasswordPolicySelection::TargetEntryDn(dn) => (None, Some(dn.clone())),
        };
        to_payload(&RequestPayload {
            password_policy_dn: policy_dn,
            target_entry_dn: target_dn,
            number_of_passwords: Some(i64::from(self.number_of_passwords)),
            number_of_validation_attempts: Some(i64::from(self.validation_attempts)),
        })
    }

    fn decode_json_value(header: &ExtendedRequest, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let payload: RequestPayload = from_payload(value, REQUEST_FIELDS, strict, Self::NAME)?;
        let selection = match (payload.password_policy_dn, payload.target_entry_dn) {
            (None, None) => PasswordPolicySelection::Default,
            (Some(dn), None) => PasswordPolicySelection::PolicyDn(dn),
            (None, Some(dn)) => PasswordPolicySelection::TargetEntryDn(dn),
            (Some(_), Some(_)) => {
                return Err(DecodeError::Decoding(format!(
                    "{} cannot name both a policy DN and a target entry DN",
                    Self::NAME
                )));
            }
        };
        let number_of_passwords = match payload.number_of_passwords {
            Some(n) => Self::check_number_of_passwords(n)?,
            None => DEFAULT_NUMBER_OF_PASSWORDS,
        };
        let validation_attempts = match payload.number_of_validation_attempts {
            Some(m) => Self::check_validation_attempts(m)?,
            None => DEFAULT_VALIDATION_ATTEMPTS,
        };
        Ok(Self::with_selection(selection, number_of_passwords, validation_attempts))
    }
}

/// One password returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneratedPassword {
    password: String,
    validation_attempted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    validation_errors: Vec<String>,
}

const PASSWORD_FIELDS: &[&str] = &["password", "validation-attempted", "validation-errors"];

impl GeneratedPassword {
    pub fn new(
        password: impl Into<String>,
        validation_attempted: bool,
        validation_errors: Vec<String>,
    ) -> Self {
        Self {
            password: password.into(),
            validation_attempted,
            validation_errors,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn validation_attempted(&self) -> bool {
        self.validation_attempted
    }

    /// Reasons the last candidate failed validation, if any were reported
    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    fn to_element(&self) -> BerElement {
        let mut children = vec![
            BerElement::string(&self.password),
            BerElement::boolean(self.validation_attempted),
        ];
        if !self.validation_errors.is_empty() {
            let errors = self.validation_errors.iter().map(|e| BerElement::string(e)).collect();
            children.push(BerElement::sequence(errors).with_context_tag(0));
        }
        BerElement::sequence(children)
    }

    fn from_element(element: &BerElement) -> DecodeResult<Self> {
        const WHAT: &str = "Generated password";
        expect_element(element, SEQUENCE, WHAT)?;
        let children = element.as_sequence()?;
        check_element_count(children, 2, 3, WHAT)?;

        let password = string_element(&children[0], "Generated password value")?;
        expect_element(&children[1], BOOLEAN, "Validation attempted flag")?;
        let validation_attempted = children[1].as_boolean()?;
        let validation_errors = match children.get(2) {
            Some(errors) => {
                expect_element(errors, VALIDATION_ERRORS_TAG, "Validation errors")?;
                errors
                    .as_sequence()?
                    .iter()
                    .map(|e| string_element(e, "Validation error"))
                    .collect::<DecodeResult<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        Ok(Self {
            password,
            validation_attempted,
            validation_errors,
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ResultPayload {
    password_policy_dn: String,
    generated_passwords: Vec<GeneratedPassword>,
}

const RESULT_FIELDS: &[&str] = &["password-policy-dn", "generated-passwords"];

/// Generate Password extended result
///
/// A successful result always names the policy and carries at least one
/// password. Failed results usually carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratePasswordExtendedResult {
    result: OperationResult,
    policy_dn: Option<String>,
    passwords: Vec<GeneratedPassword>,
    source: SourceValue,
}

impl GeneratePasswordExtendedResult {
    /// Successful result
    ///
    /// # Panics
    /// Panics if `passwords` is empty.
    pub fn new(policy_dn: impl Into<String>, passwords: Vec<GeneratedPassword>) -> Self {
        assert!(!passwords.is_empty(), "at least one generated password is required");
        Self {
            result: OperationResult::success(),
            policy_dn: Some(policy_dn.into()),
            passwords,
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
            "a successful result must carry generated passwords"
        );
        Self {
            result,
            policy_dn: None,
            passwords: Vec::new(),
            source: SourceValue::none(),
        }
    }

    pub fn result(&self) -> &OperationResult {
        &self.result
    }

    pub fn policy_dn(&self) -> Option<&str> {
        self.policy_dn.as_deref()
    }

    pub fn passwords(&self) -> &[GeneratedPassword] {
        &self.passwords
    }

    fn check_passwords(passwords: &[GeneratedPassword]) -> DecodeResult<()> {
        if passwords.is_empty() {
            return Err(DecodeError::InvalidElementCount(format!(
                "{} must contain at least one generated password",
                Self::NAME
            )));
        }
        Ok(())
    }
}

impl TypedElement for GeneratePasswordExtendedResult {
    type Envelope = ExtendedResult;
    const OID: &'static str = "1.3.6.1.4.1.30221.2.6.63";
    const NAME: &'static str = "Generate Password Extended Result";

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
                policy_dn: None,
                passwords: Vec::new(),
                source: SourceValue::of(result),
            });
        }

        let element = decode_value_element(result, Self::NAME)?;
        let children = element.expect_sequence().map_err(|e| e.context(Self::NAME))?;
        check_element_count(children, 2, 2, Self::NAME)?;

        let policy_dn = string_element(&children[0], "Password policy DN")?;
        expect_element(&children[1], SEQUENCE, "Generated passwords")?;
        let passwords = children[1]
            .as_sequence()?
            .iter()
            .map(GeneratedPassword::from_element)
            .collect::<DecodeResult<Vec<_>>>()?;
        Self::check_passwords(&passwords)?;

        Ok(Self {
            result: result.result().clone(),
            policy_dn: Some(policy_dn),
            passwords,
            source: SourceValue::of(result),
        })
    }

    fn to_envelope(&self) -> ExtendedResult {
        let value = self.source.or_encode(|| {
            self.policy_dn.as_ref().map(|dn| {
                let passwords = self.passwords.iter().map(GeneratedPassword::to_element).collect();
                element_value(&BerElement::sequence(vec![
                    BerElement::string(dn),
                    BerElement::sequence(passwords),
                ]))
            })
        });
        ExtendedResult::new(self.result.clone(), Some(Self::OID.to_string()), value)
    }

    fn to_json_value(&self) -> Option<Value> {
        let policy_dn = self.policy_dn.clone()?;
        to_payload(&ResultPayload {
            password_policy_dn: policy_dn,
            generated_passwords: self.passwords.clone(),
        })
    }

    fn decode_json_value(header: &ExtendedResult, value: &Value, strict: bool) -> DecodeResult<Self> {
        check_oid(header, Self::OID, Self::NAME)?;
        let object = check_fields(value, RESULT_FIELDS, strict, Self::NAME)?;
        if let Some(Value::Array(items)) = object.get("generated-passwords") {
            for item in items {
                check_fields(item, PASSWORD_FIELDS, strict, "Generated password")?;
            }
        }
        let payload: ResultPayload = from_payload(value, RESULT_FIELDS, strict, Self::NAME)?;
        Self::check_passwords(&payload.generated_passwords)?;
        Ok(Self {
            result: header.result().clone(),
            policy_dn: Some(payload.password_policy_dn),
            passwords: payload.generated_passwords,
            source: SourceValue::none(),
        })
    }
}
