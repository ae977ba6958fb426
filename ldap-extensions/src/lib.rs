//! Typed LDAP protocol elements
//!
//! This crate provides strongly-typed controls, extended operations and
//! intermediate responses built on the generic envelopes of `ldap-protocol`,
//! plus ready-made registries that dispatch a generic envelope to its typed
//! form by OID.
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_extensions::controls::{control_registry, KnownControl};
//! use ldap_extensions::ExcludeBranchRequestControl;
//! use ldap_protocol::{Control, TypedElement};
//!
//! let control = ExcludeBranchRequestControl::new(vec!["ou=archive,dc=example,dc=com".to_string()]);
//! let bytes = control.to_envelope().encode_to_bytes();
//!
//! let generic = Control::decode_from_bytes(&bytes)?;
//! match control_registry().decode(&generic)? {
//!     KnownControl::ExcludeBranch(decoded) => assert_eq!(decoded, control),
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), ldap_core::DecodeError>(())
//! ```

mod shape;

pub mod controls;
pub mod extop;
pub mod intermediate;

pub use controls::{
    control_registry, ExcludeBranchRequestControl, JsonFormattedRequestControl,
    JsonFormattedResponseControl, KnownControl, ManageDsaItRequestControl,
    PasswordPolicyErrorType, PasswordPolicyResponseControl, PasswordPolicyWarning,
    PasswordPolicyWarningType, TransactionSpecificationRequestControl,
};
pub use extop::{
    extended_request_registry, extended_result_registry, EndTransactionExtendedRequest,
    EndTransactionExtendedResult, GeneratePasswordExtendedRequest, GeneratePasswordExtendedResult,
    GeneratedPassword, GetBackupCompatibilityDescriptorExtendedRequest,
    GetBackupCompatibilityDescriptorExtendedResult, KnownExtendedRequest, KnownExtendedResult,
    PasswordPolicySelection, StartTransactionExtendedRequest, StartTransactionExtendedResult,
    UpdateControls,
};
pub use intermediate::{
    intermediate_response_registry, KnownIntermediateResponse,
    MissingChangelogEntriesIntermediateResponse,
};
