//! Protocol element layer for LDAP
//!
//! This crate provides the generic envelopes (controls, extended requests,
//! extended results, intermediate responses), the OID registry that upgrades
//! them to typed elements, policy-driven decoding of embedded controls, and
//! the JSON document codec.

pub mod control;
pub mod embedded;
pub mod envelope;
pub mod extended_request;
pub mod extended_result;
pub mod intermediate_response;
pub mod json;
pub mod registry;
pub mod result_code;

pub use control::Control;
pub use embedded::{decode_controls, decode_json_controls};
pub use envelope::{Envelope, SourceValue};
pub use extended_request::ExtendedRequest;
pub use extended_result::{ExtendedResult, OperationResult};
pub use intermediate_response::IntermediateResponse;
pub use json::{JsonEnvelope, ParsedDocument};
pub use registry::{Registry, TypedElement};
pub use result_code::ResultCode;
