//! Decode behavior configuration
//!
//! A `DecodeBehavior` is a small, caller-owned policy value that is threaded
//! explicitly through decode calls. It controls two independent things:
//!
//! - **Structured-document strictness**: whether fields that the decoder does
//!   not know about cause the decode to fail (`strict`) or are ignored.
//! - **Embedded element handling**: when an element embeds other envelopes
//!   (a list of controls, for example), whether a bad embedded item fails the
//!   whole decode or is skipped and reported as a diagnostic.
//!
//! # Usage Example
//!
//! ```rust
//! use ldap_core::DecodeBehavior;
//!
//! let behavior = DecodeBehavior::lenient()
//!     .with_throw_on_unparsable_object(false)
//!     .with_throw_on_invalid_critical_element(false);
//! assert!(!behavior.strict);
//! ```

use serde::{Deserialize, Serialize};

/// Policy flags for decoding untrusted or partially-unknown data
///
/// The four switches are independent of one another:
///
/// | flag | applies to |
/// |------|------------|
/// | `strict` | unknown fields in structured documents |
/// | `throw_on_unparsable_object` | an embedded item that cannot even be parsed generically |
/// | `throw_on_invalid_critical_element` | a critical embedded item that parsed generically but failed its typed validation |
/// | `throw_on_invalid_non_critical_element` | the same for a non-critical item |
///
/// When a throw flag is `false` the offending item is dropped from the result
/// and a human-readable message is appended to the caller's diagnostics list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DecodeBehavior {
    /// Reject unrecognized structured-document fields
    pub strict: bool,
    /// Fail on an embedded item that cannot be parsed at all
    pub throw_on_unparsable_object: bool,
    /// Fail on a critical embedded item that fails typed validation
    pub throw_on_invalid_critical_element: bool,
    /// Fail on a non-critical embedded item that fails typed validation
    pub throw_on_invalid_non_critical_element: bool,
}

impl DecodeBehavior {
    /// Create a behavior with every switch given explicitly
    pub fn new(
        strict: bool,
        throw_on_unparsable_object: bool,
        throw_on_invalid_critical_element: bool,
        throw_on_invalid_non_critical_element: bool,
    ) -> Self {
        Self {
            strict,
            throw_on_unparsable_object,
            throw_on_invalid_critical_element,
            throw_on_invalid_non_critical_element,
        }
    }

    /// Strict structured decode, every embedded failure is fatal
    pub fn strict() -> Self {
        Self::new(true, true, true, true)
    }

    /// Lenient structured decode with the default embedded-element handling
    ///
    /// Unparsable items and invalid critical items are fatal, invalid
    /// non-critical items are skipped with a diagnostic.
    pub fn lenient() -> Self {
        Self::new(false, true, true, false)
    }

    /// Skip and report every embedded failure, never fail the outer decode
    pub fn permissive() -> Self {
        Self::new(false, false, false, false)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_throw_on_unparsable_object(mut self, throw: bool) -> Self {
        self.throw_on_unparsable_object = throw;
        self
    }

    pub fn with_throw_on_invalid_critical_element(mut self, throw: bool) -> Self {
        self.throw_on_invalid_critical_element = throw;
        self
    }

    pub fn with_throw_on_invalid_non_critical_element(mut self, throw: bool) -> Self {
        self.throw_on_invalid_non_critical_element = throw;
        self
    }

    /// Whether a typed-validation failure of an item with the given
    /// criticality must fail the outer decode
    pub fn throw_on_invalid_element(&self, critical: bool) -> bool {
        if critical {
            self.throw_on_invalid_critical_element
        } else {
            self.throw_on_invalid_non_critical_element
        }
    }
}

impl Default for DecodeBehavior {
    fn default() -> Self {
        Self::lenient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        let behavior = DecodeBehavior::default();
        assert!(!behavior.strict);
        assert!(behavior.throw_on_unparsable_object);
        assert!(behavior.throw_on_invalid_critical_element);
        assert!(!behavior.throw_on_invalid_non_critical_element);
    }

    #[test]
    fn test_builder_switches_are_independent() {
        let behavior = DecodeBehavior::strict().with_throw_on_invalid_critical_element(false);
        assert!(behavior.strict);
        assert!(behavior.throw_on_unparsable_object);
        assert!(!behavior.throw_on_invalid_element(true));
        assert!(behavior.throw_on_invalid_element(false));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let behavior: DecodeBehavior =
            serde_json::from_str(r#"{"strict": true, "throw-on-unparsable-object": false}"#)
                .unwrap();
        assert!(behavior.strict);
        assert!(!behavior.throw_on_unparsable_object);
        // Unspecified fields keep their defaults.
        assert!(behavior.throw_on_invalid_critical_element);
        assert!(!behavior.throw_on_invalid_non_critical_element);
    }
}
