//! Core types for the LDAP protocol encoding layer
//!
//! This crate provides the error taxonomy, the caller-supplied decode policy,
//! and the numeric OID type used throughout the workspace.

pub mod behavior;
pub mod error;
pub mod oid;

pub use behavior::DecodeBehavior;
pub use error::{DecodeError, DecodeErrorKind, DecodeResult, LdapError, LdapResult};
pub use oid::Oid;
