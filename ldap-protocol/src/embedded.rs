//! Policy-driven decoding of controls embedded in another element
//!
//! Some elements carry a list of controls inside their own payload (for
//! example the per-operation controls of an End Transaction result, or the
//! controls wrapped in a JSON-formatted control). Each embedded control is
//! decoded in two stages, and [`DecodeBehavior`] decides what happens when a
//! stage fails:
//!
//! 1. Generic parse (BER `Control` or JSON control document). On failure the
//!    whole decode fails if `throw_on_unparsable_object` is set; otherwise the
//!    item is skipped and a diagnostic is recorded.
//! 2. Typed validation through the registry. On failure the whole decode fails
//!    if the matching criticality switch is set; otherwise the item is skipped
//!    and a diagnostic is recorded.
//!
//! Items that pass both stages are returned in their original order.

use crate::control::Control;
use crate::json::JsonEnvelope;
use crate::registry::Registry;
use ldap_asn1::BerElement;
use ldap_core::{DecodeBehavior, DecodeError, DecodeResult};
use serde_json::Value;

/// Decode the embedded `Controls` list of an element
///
/// # Arguments
/// * `list` - The SEQUENCE OF Control (any constructed tag)
/// * `registry` - Typed decoders for the embedded controls
/// * `behavior` - Raise-or-skip policy
/// * `diagnostics` - Receives one message per skipped item
///
/// # Errors
/// - `UnexpectedTag` if `list` is not constructed (the outer shape is always enforced)
/// - the stage error of the first item the policy says to raise on
pub fn decode_controls<T: From<Control>>(
    list: &BerElement,
    registry: &Registry<Control, T>,
    behavior: &DecodeBehavior,
    diagnostics: &mut Vec<String>,
) -> DecodeResult<Vec<T>> {
    let items = list.as_sequence().map_err(|e| e.context("Embedded controls"))?;
    let mut decoded = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let control = match Control::from_element(item) {
            Ok(control) => control,
            Err(e) => {
                unparsable(index, e, behavior, diagnostics)?;
                continue;
            }
        };

        match registry.decode(&control) {
            Ok(typed) => decoded.push(typed),
            Err(e) => invalid(index, &control, e, behavior, diagnostics)?,
        }
    }

    Ok(decoded)
}

/// Decode a list of embedded JSON control documents
///
/// Same policy as [`decode_controls`]; documents are parsed with
/// `behavior.strict`.
pub fn decode_json_controls<T: From<Control>>(
    items: &[Value],
    registry: &Registry<Control, T>,
    behavior: &DecodeBehavior,
    diagnostics: &mut Vec<String>,
) -> DecodeResult<Vec<T>> {
    let mut decoded = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let parsed = match Control::parse_document(item, behavior.strict) {
            Ok(parsed) => parsed,
            Err(e) => {
                unparsable(index, e, behavior, diagnostics)?;
                continue;
            }
        };

        let result = match &parsed.value_json {
            Some(value) => registry.decode_json_value(&parsed.envelope, value, behavior.strict),
            None => registry.decode(&parsed.envelope),
        };
        match result {
            Ok(typed) => decoded.push(typed),
            Err(e) => invalid(index, &parsed.envelope, e, behavior, diagnostics)?,
        }
    }

    Ok(decoded)
}

fn unparsable(
    index: usize,
    error: DecodeError,
    behavior: &DecodeBehavior,
    diagnostics: &mut Vec<String>,
) -> DecodeResult<()> {
    if behavior.throw_on_unparsable_object {
        return Err(error.context(&format!("Embedded control {}", index)));
    }
    let message = format!("Skipped unparsable embedded control {}: {}", index, error);
    log::warn!("{}", message);
    diagnostics.push(message);
    Ok(())
}

fn invalid(
    index: usize,
    control: &Control,
    error: DecodeError,
    behavior: &DecodeBehavior,
    diagnostics: &mut Vec<String>,
) -> DecodeResult<()> {
    let critical = control.is_critical();
    if behavior.throw_on_invalid_element(critical) {
        return Err(error.context(&format!("Embedded control {} ({})", index, control.oid())));
    }
    let message = format!(
        "Skipped invalid {} embedded control {} ({}): {}",
        if critical { "critical" } else { "non-critical" },
        index,
        control.oid(),
        error
    );
    log::warn!("{}", message);
    diagnostics.push(message);
    Ok(())
}
