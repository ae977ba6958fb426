use std::fmt;
use thiserror::Error;

/// Discriminant of a [`DecodeError`]
///
/// Callers that need to branch on the cause of a decode failure (or tests that
/// assert on it) compare kinds instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// Length octets invalid or inconsistent with the remaining buffer
    MalformedLength,
    /// Tag class, number or primitive/constructed flag not what the context expects
    UnexpectedTag,
    /// A payload was required but the envelope carried none
    MissingValue,
    /// A sequence had too few or too many children
    InvalidElementCount,
    /// A specific child had a tag that is not valid at its position
    InvalidElementType,
    /// A decoded number or enumeration is outside the permitted range
    ValueOutOfRange,
    /// Strict structured-document decode found a field it does not know
    UnrecognizedField,
    /// Any other decoding failure
    DecodingError,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeErrorKind::MalformedLength => "MalformedLength",
            DecodeErrorKind::UnexpectedTag => "UnexpectedTag",
            DecodeErrorKind::MissingValue => "MissingValue",
            DecodeErrorKind::InvalidElementCount => "InvalidElementCount",
            DecodeErrorKind::InvalidElementType => "InvalidElementType",
            DecodeErrorKind::ValueOutOfRange => "ValueOutOfRange",
            DecodeErrorKind::UnrecognizedField => "UnrecognizedField",
            DecodeErrorKind::DecodingError => "DecodingError",
        };
        f.write_str(name)
    }
}

/// Error raised while decoding BER data, envelopes, typed elements or
/// structured documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed length: {0}")]
    MalformedLength(String),

    #[error("Unexpected tag: {0}")]
    UnexpectedTag(String),

    #[error("Missing value: {0}")]
    MissingValue(String),

    #[error("Invalid element count: {0}")]
    InvalidElementCount(String),

    #[error("Invalid element type: {0}")]
    InvalidElementType(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Unrecognized field: {0}")]
    UnrecognizedField(String),

    #[error("Decoding error: {0}")]
    Decoding(String),
}

impl DecodeError {
    /// Get the taxonomy kind of this error
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::MalformedLength(_) => DecodeErrorKind::MalformedLength,
            DecodeError::UnexpectedTag(_) => DecodeErrorKind::UnexpectedTag,
            DecodeError::MissingValue(_) => DecodeErrorKind::MissingValue,
            DecodeError::InvalidElementCount(_) => DecodeErrorKind::InvalidElementCount,
            DecodeError::InvalidElementType(_) => DecodeErrorKind::InvalidElementType,
            DecodeError::ValueOutOfRange(_) => DecodeErrorKind::ValueOutOfRange,
            DecodeError::UnrecognizedField(_) => DecodeErrorKind::UnrecognizedField,
            DecodeError::Decoding(_) => DecodeErrorKind::DecodingError,
        }
    }

    /// Get the human-readable message
    pub fn message(&self) -> &str {
        match self {
            DecodeError::MalformedLength(m)
            | DecodeError::UnexpectedTag(m)
            | DecodeError::MissingValue(m)
            | DecodeError::InvalidElementCount(m)
            | DecodeError::InvalidElementType(m)
            | DecodeError::ValueOutOfRange(m)
            | DecodeError::UnrecognizedField(m)
            | DecodeError::Decoding(m) => m,
        }
    }

    /// Prefix the message with the element being decoded
    ///
    /// The kind is preserved, so a nested failure still reports its real cause.
    pub fn context(self, what: &str) -> Self {
        let wrap = |m: String| format!("{}: {}", what, m);
        match self {
            DecodeError::MalformedLength(m) => DecodeError::MalformedLength(wrap(m)),
            DecodeError::UnexpectedTag(m) => DecodeError::UnexpectedTag(wrap(m)),
            DecodeError::MissingValue(m) => DecodeError::MissingValue(wrap(m)),
            DecodeError::InvalidElementCount(m) => DecodeError::InvalidElementCount(wrap(m)),
            DecodeError::InvalidElementType(m) => DecodeError::InvalidElementType(wrap(m)),
            DecodeError::ValueOutOfRange(m) => DecodeError::ValueOutOfRange(wrap(m)),
            DecodeError::UnrecognizedField(m) => DecodeError::UnrecognizedField(wrap(m)),
            DecodeError::Decoding(m) => DecodeError::Decoding(wrap(m)),
        }
    }
}

/// Main error type at the I/O boundary of the encoding layer
#[derive(Error, Debug)]
pub enum LdapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Element too large: {length} bytes (max {max})")]
    ElementTooLarge { length: usize, max: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type alias for operations that may also fail on I/O
pub type LdapResult<T> = Result<T, LdapError>;
