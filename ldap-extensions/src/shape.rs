//! Shape checks shared by the typed decoders

use ldap_asn1::{universal, BerElement, BerTag};
use ldap_core::{DecodeError, DecodeResult};

pub(crate) const OCTET_STRING: BerTag = BerTag::universal(false, universal::OCTET_STRING);
pub(crate) const BOOLEAN: BerTag = BerTag::universal(false, universal::BOOLEAN);
pub(crate) const INTEGER: BerTag = BerTag::universal(false, universal::INTEGER);
pub(crate) const SEQUENCE: BerTag = BerTag::universal(true, universal::SEQUENCE);

/// Check the tag of a child element
///
/// # Errors
/// `InvalidElementType` naming `what`
pub(crate) fn expect_element(element: &BerElement, tag: BerTag, what: &str) -> DecodeResult<()> {
    if element.tag() != tag {
        return Err(DecodeError::InvalidElementType(format!(
            "{} must be {}, got {}",
            what,
            tag,
            element.tag()
        )));
    }
    Ok(())
}

/// Read a child that must be an OCTET STRING holding UTF-8 text
pub(crate) fn string_element(element: &BerElement, what: &str) -> DecodeResult<String> {
    expect_element(element, OCTET_STRING, what)?;
    element.as_string().map_err(|e| e.context(what))
}

/// Read a non-negative INTEGER that fits in an `i32`
///
/// # Errors
/// `ValueOutOfRange` for negative or oversized values
pub(crate) fn non_negative(element: &BerElement, what: &str) -> DecodeResult<i32> {
    let value = element.as_i32().map_err(|e| e.context(what))?;
    if value < 0 {
        return Err(DecodeError::ValueOutOfRange(format!(
            "{} must not be negative, got {}",
            what, value
        )));
    }
    Ok(value)
}

/// Error for an unexpected child in a typed value
pub(crate) fn unexpected_element(element: &BerElement, what: &str) -> DecodeError {
    DecodeError::InvalidElementType(format!(
        "Unexpected element {} in {}",
        element.tag(),
        what
    ))
}
