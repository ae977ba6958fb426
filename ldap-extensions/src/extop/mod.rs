//! Typed extended operation requests and results
//!
//! | operation                              | request OID                 | result OID                  |
//! |----------------------------------------|-----------------------------|-----------------------------|
//! | Generate Password                      | 1.3.6.1.4.1.30221.2.6.62    | 1.3.6.1.4.1.30221.2.6.63    |
//! | Get Backup Compatibility Descriptor    | 1.3.6.1.4.1.30221.2.6.30    | 1.3.6.1.4.1.30221.2.6.31    |
//! | Start Transaction                      | 1.3.6.1.1.21.1              | (none)                      |
//! | End Transaction                        | 1.3.6.1.1.21.3              | (none)                      |
//!
//! Results without a response name are decoded explicitly, see [`transaction`].

pub mod backup_compatibility;
pub mod generate_password;
pub mod transaction;

pub use backup_compatibility::{
    GetBackupCompatibilityDescriptorExtendedRequest, GetBackupCompatibilityDescriptorExtendedResult,
};
pub use generate_password::{
    GeneratePasswordExtendedRequest, GeneratePasswordExtendedResult, GeneratedPassword,
    PasswordPolicySelection,
};
pub use transaction::{
    EndTransactionExtendedRequest, EndTransactionExtendedResult, StartTransactionExtendedRequest,
    StartTransactionExtendedResult, UpdateControls,
};

use ldap_protocol::{ExtendedRequest, ExtendedResult, Registry, TypedElement};
use once_cell::sync::Lazy;

/// An extended request, decoded to its typed form when its OID is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownExtendedRequest {
    GeneratePassword(GeneratePasswordExtendedRequest),
    GetBackupCompatibilityDescriptor(GetBackupCompatibilityDescriptorExtendedRequest),
    StartTransaction(StartTransactionExtendedRequest),
    EndTransaction(EndTransactionExtendedRequest),
    /// Any request without a typed decoder
    Generic(ExtendedRequest),
}

impl KnownExtendedRequest {
    /// Convert back to a generic request
    pub fn to_envelope(&self) -> ExtendedRequest {
        match self {
            KnownExtendedRequest::GeneratePassword(r) => r.to_envelope(),
            KnownExtendedRequest::GetBackupCompatibilityDescriptor(r) => r.to_envelope(),
            KnownExtendedRequest::StartTransaction(r) => r.to_envelope(),
            KnownExtendedRequest::EndTransaction(r) => r.to_envelope(),
            KnownExtendedRequest::Generic(r) => r.clone(),
        }
    }
}

impl From<ExtendedRequest> for KnownExtendedRequest {
    fn from(request: ExtendedRequest) -> Self {
        KnownExtendedRequest::Generic(request)
    }
}

impl From<GeneratePasswordExtendedRequest> for KnownExtendedRequest {
    fn from(request: GeneratePasswordExtendedRequest) -> Self {
        KnownExtendedRequest::GeneratePassword(request)
    }
}

impl From<GetBackupCompatibilityDescriptorExtendedRequest> for KnownExtendedRequest {
    fn from(request: GetBackupCompatibilityDescriptorExtendedRequest) -> Self {
        KnownExtendedRequest::GetBackupCompatibilityDescriptor(request)
    }
}

impl From<StartTransactionExtendedRequest> for KnownExtendedRequest {
    fn from(request: StartTransactionExtendedRequest) -> Self {
        KnownExtendedRequest::StartTransaction(request)
    }
}

impl From<EndTransactionExtendedRequest> for KnownExtendedRequest {
    fn from(request: EndTransactionExtendedRequest) -> Self {
        KnownExtendedRequest::EndTransaction(request)
    }
}

/// An extended result, decoded to its typed form when its OID is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownExtendedResult {
    GeneratePassword(GeneratePasswordExtendedResult),
    GetBackupCompatibilityDescriptor(GetBackupCompatibilityDescriptorExtendedResult),
    /// Any result without a typed decoder, including results with no OID
    Generic(ExtendedResult),
}

impl KnownExtendedResult {
    /// Convert back to a generic result
    pub fn to_envelope(&self) -> ExtendedResult {
        match self {
            KnownExtendedResult::GeneratePassword(r) => r.to_envelope(),
            KnownExtendedResult::GetBackupCompatibilityDescriptor(r) => r.to_envelope(),
            KnownExtendedResult::Generic(r) => r.clone(),
        }
    }
}

impl From<ExtendedResult> for KnownExtendedResult {
    fn from(result: ExtendedResult) -> Self {
        KnownExtendedResult::Generic(result)
    }
}

impl From<GeneratePasswordExtendedResult> for KnownExtendedResult {
    fn from(result: GeneratePasswordExtendedResult) -> Self {
        KnownExtendedResult::GeneratePassword(result)
    }
}

impl From<GetBackupCompatibilityDescriptorExtendedResult> for KnownExtendedResult {
    fn from(result: GetBackupCompatibilityDescriptorExtendedResult) -> Self {
        KnownExtendedResult::GetBackupCompatibilityDescriptor(result)
    }
}

static EXTENDED_REQUEST_REGISTRY: Lazy<Registry<ExtendedRequest, KnownExtendedRequest>> =
    Lazy::new(|| {
        Registry::new()
            .with::<GeneratePasswordExtendedRequest>()
            .with::<GetBackupCompatibilityDescriptorExtendedRequest>()
            .with::<StartTransactionExtendedRequest>()
            .with::<EndTransactionExtendedRequest>()
    });

static EXTENDED_RESULT_REGISTRY: Lazy<Registry<ExtendedResult, KnownExtendedResult>> =
    Lazy::new(|| {
        Registry::new()
            .with::<GeneratePasswordExtendedResult>()
            .with::<GetBackupCompatibilityDescriptorExtendedResult>()
    });

/// Registry of all typed extended requests in this crate
pub fn extended_request_registry() -> &'static Registry<ExtendedRequest, KnownExtendedRequest> {
    &EXTENDED_REQUEST_REGISTRY
}

/// Registry of all typed extended results in this crate
pub fn extended_result_registry() -> &'static Registry<ExtendedResult, KnownExtendedResult> {
    &EXTENDED_RESULT_REGISTRY
}
