//! Typed request and response controls
//!
//! | control                          | OID                          |
//! |----------------------------------|------------------------------|
//! | Exclude Branch request           | 1.3.6.1.4.1.30221.2.5.17     |
//! | ManageDsaIT request              | 2.16.840.1.113730.3.4.2      |
//! | Password policy response         | 1.3.6.1.4.1.42.2.27.8.5.1    |
//! | Transaction specification        | 1.3.6.1.1.21.2               |
//! | JSON-formatted request           | 1.3.6.1.4.1.30221.2.5.64     |
//! | JSON-formatted response          | 1.3.6.1.4.1.30221.2.5.65     |

pub mod exclude_branch;
pub mod json_formatted;
pub mod manage_dsa_it;
pub mod password_policy;
pub mod transaction_specification;

pub use exclude_branch::ExcludeBranchRequestControl;
pub use json_formatted::{JsonFormattedRequestControl, JsonFormattedResponseControl};
pub use manage_dsa_it::ManageDsaItRequestControl;
pub use password_policy::{
    PasswordPolicyErrorType, PasswordPolicyResponseControl, PasswordPolicyWarning,
    PasswordPolicyWarningType,
};
pub use transaction_specification::TransactionSpecificationRequestControl;

use ldap_protocol::{Control, Registry, TypedElement};
use once_cell::sync::Lazy;

/// A control, decoded to its typed form when its OID is known
#[derive(Debug, Clone, PartialEq)]
pub enum KnownControl {
    ExcludeBranch(ExcludeBranchRequestControl),
    ManageDsaIt(ManageDsaItRequestControl),
    PasswordPolicy(PasswordPolicyResponseControl),
    TransactionSpecification(TransactionSpecificationRequestControl),
    JsonFormattedRequest(JsonFormattedRequestControl),
    JsonFormattedResponse(JsonFormattedResponseControl),
    /// Any control without a typed decoder
    Generic(Control),
}

impl KnownControl {
    /// Convert back to a generic control
    pub fn to_envelope(&self) -> Control {
        match self {
            KnownControl::ExcludeBranch(c) => c.to_envelope(),
            KnownControl::ManageDsaIt(c) => c.to_envelope(),
            KnownControl::PasswordPolicy(c) => c.to_envelope(),
            KnownControl::TransactionSpecification(c) => c.to_envelope(),
            KnownControl::JsonFormattedRequest(c) => c.to_envelope(),
            KnownControl::JsonFormattedResponse(c) => c.to_envelope(),
            KnownControl::Generic(c) => c.clone(),
        }
    }

    /// Check if this control has no typed decoder
    pub fn is_generic(&self) -> bool {
        matches!(self, KnownControl::Generic(_))
    }
}

impl From<Control> for KnownControl {
    fn from(control: Control) -> Self {
        KnownControl::Generic(control)
    }
}

impl From<ExcludeBranchRequestControl> for KnownControl {
    fn from(control: ExcludeBranchRequestControl) -> Self {
        KnownControl::ExcludeBranch(control)
    }
}

impl From<ManageDsaItRequestControl> for KnownControl {
    fn from(control: ManageDsaItRequestControl) -> Self {
        KnownControl::ManageDsaIt(control)
    }
}

impl From<PasswordPolicyResponseControl> for KnownControl {
    fn from(control: PasswordPolicyResponseControl) -> Self {
        KnownControl::PasswordPolicy(control)
    }
}

impl From<TransactionSpecificationRequestControl> for KnownControl {
    fn from(control: TransactionSpecificationRequestControl) -> Self {
        KnownControl::TransactionSpecification(control)
    }
}

impl From<JsonFormattedRequestControl> for KnownControl {
    fn from(control: JsonFormattedRequestControl) -> Self {
        KnownControl::JsonFormattedRequest(control)
    }
}

impl From<JsonFormattedResponseControl> for KnownControl {
    fn from(control: JsonFormattedResponseControl) -> Self {
        KnownControl::JsonFormattedResponse(control)
    }
}

static CONTROL_REGISTRY: Lazy<Registry<Control, KnownControl>> = Lazy::new(|| {
    Registry::new()
        .with::<ExcludeBranchRequestControl>()
        .with::<ManageDsaItRequestControl>()
        .with::<PasswordPolicyResponseControl>()
        .with::<TransactionSpecificationRequestControl>()
        .with::<JsonFormattedRequestControl>()
        .with::<JsonFormattedResponseControl>()
});

/// Registry of all typed controls in this crate
pub fn control_registry() -> &'static Registry<Control, KnownControl> {
    &CONTROL_REGISTRY
}
