//! ManageDsaIT request control (RFC 3296)
//!
//! Tells the server to treat referral and other special objects as normal
//! entries. The control has no value.

use ldap_core::DecodeResult;
use ldap_protocol::envelope::{check_oid, forbid_value};
use ldap_protocol::{Control, TypedElement};

/// ManageDsaIT request control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManageDsaItRequestControl {
    critical: bool,
}

impl ManageDsaItRequestControl {
    /// Create a non-critical control
    pub fn new() -> Self {
        Self::with_criticality(false)
    }

    pub fn with_criticality(critical: bool) -> Self {
        Self { critical }
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }
}

impl Default for ManageDsaItRequestControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedElement for ManageDsaItRequestControl {
    type Envelope = Control;
    const OID: &'static str = "2.16.840.1.113730.3.4.2";
    const NAME: &'static str = "ManageDsaIT Request Control";

    fn decode_envelope(control: &Control) -> DecodeResult<Self> {
        check_oid(control, Self::OID, Self::NAME)?;
        forbid_value(control, Self::NAME)?;
        Ok(Self::with_criticality(control.is_critical()))
    }

    fn to_envelope(&self) -> Control {
        Control::new(Self::OID, self.critical, None)
    }
}
