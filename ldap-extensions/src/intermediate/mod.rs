//! Typed intermediate responses

pub mod missing_changelog_entries;

pub use missing_changelog_entries::MissingChangelogEntriesIntermediateResponse;

use ldap_protocol::{IntermediateResponse, Registry, TypedElement};
use once_cell::sync::Lazy;

/// An intermediate response, decoded to its typed form when its OID is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownIntermediateResponse {
    MissingChangelogEntries(MissingChangelogEntriesIntermediateResponse),
    /// Any response without a typed decoder, including responses with no OID
    Generic(IntermediateResponse),
}

impl KnownIntermediateResponse {
    /// Convert back to a generic response
    pub fn to_envelope(&self) -> IntermediateResponse {
        match self {
            KnownIntermediateResponse::MissingChangelogEntries(r) => r.to_envelope(),
            KnownIntermediateResponse::Generic(r) => r.clone(),
        }
    }
}

impl From<IntermediateResponse> for KnownIntermediateResponse {
    fn from(response: IntermediateResponse) -> Self {
        KnownIntermediateResponse::Generic(response)
    }
}

impl From<MissingChangelogEntriesIntermediateResponse> for KnownIntermediateResponse {
    fn from(response: MissingChangelogEntriesIntermediateResponse) -> Self {
        KnownIntermediateResponse::MissingChangelogEntries(response)
    }
}

static INTERMEDIATE_RESPONSE_REGISTRY: Lazy<Registry<IntermediateResponse, KnownIntermediateResponse>> =
    Lazy::new(|| Registry::new().with::<MissingChangelogEntriesIntermediateResponse>());

/// Registry of all typed intermediate responses in this crate
pub fn intermediate_response_registry() -> &'static Registry<IntermediateResponse, KnownIntermediateResponse> {
    &INTERMEDIATE_RESPONSE_REGISTRY
}
