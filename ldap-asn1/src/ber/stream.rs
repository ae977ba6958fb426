//! Async reader for BER elements arriving on a byte stream
//!
//! A transport hands the reader any `AsyncRead` (a TCP stream, a TLS stream,
//! an in-memory buffer) and gets back one complete top-level element per call.
//! The reader owns no socket state; connection lifecycle stays with the caller.

use crate::ber::element::BerElement;
use crate::ber::types::MAX_LENGTH_OCTETS;
use ldap_core::{DecodeError, LdapError, LdapResult};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default maximum element size (16 MiB)
pub const DEFAULT_MAX_ELEMENT_SIZE: usize = 16 * 1024 * 1024;

/// Maximum number of bytes in a high-tag-number form accepted from a stream
const MAX_TAG_BYTES: usize = 6;

/// Configuration for [`BerStreamReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReaderConfig {
    /// Largest content length accepted before allocating a buffer
    pub max_element_size: usize,
}

impl StreamReaderConfig {
    pub fn new(max_element_size: usize) -> Self {
        Self { max_element_size }
    }
}

impl Default for StreamReaderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ELEMENT_SIZE)
    }
}

/// Reads complete BER elements from an async byte stream
pub struct BerStreamReader<R> {
    reader: R,
    config: StreamReaderConfig,
}

impl<R: AsyncRead + Unpin> BerStreamReader<R> {
    /// Create a reader with the default configuration
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, StreamReaderConfig::default())
    }

    /// Create a reader with an explicit configuration
    pub fn with_config(reader: R, config: StreamReaderConfig) -> Self {
        Self { reader, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &StreamReaderConfig {
        &self.config
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the next element
    ///
    /// # Returns
    /// - `Ok(Some(element))` for a complete element
    /// - `Ok(None)` if the stream ended cleanly before the next tag
    ///
    /// # Errors
    /// - `LdapError::Io` (`UnexpectedEof`) if the stream ends inside an element
    /// - `LdapError::ElementTooLarge` if the declared length exceeds
    ///   `max_element_size`; nothing is allocated for the content in that case
    /// - `LdapError::Decode` if the header or content is malformed
    pub async fn read_element(&mut self) -> LdapResult<Option<BerElement>> {
        let mut first = [0u8; 1];
        if self.reader.read(&mut first).await? == 0 {
            log::debug!("BER stream ended at element boundary");
            return Ok(None);
        }

        let mut raw = Vec::with_capacity(8);
        raw.push(first[0]);

        if first[0] & 0x1F == 0x1F {
            loop {
                let byte = self.reader.read_u8().await?;
                raw.push(byte);
                if byte & 0x80 == 0 {
                    break;
                }
                if raw.len() >= MAX_TAG_BYTES {
                    return Err(DecodeError::UnexpectedTag(
                        "Tag number does not fit in 32 bits".to_string(),
                    )
                    .into());
                }
            }
        }

        let length_byte = self.reader.read_u8().await?;
        raw.push(length_byte);
        let length = if length_byte & 0x80 == 0 {
            length_byte as usize
        } else {
            let num_bytes = (length_byte & 0x7F) as usize;
            if num_bytes == 0 || num_bytes > MAX_LENGTH_OCTETS {
                return Err(DecodeError::MalformedLength(format!(
                    "Unsupported length form 0x{:02X}",
                    length_byte
                ))
                .into());
            }
            let mut length = 0usize;
            for _ in 0..num_bytes {
                let byte = self.reader.read_u8().await?;
                raw.push(byte);
                length = (length << 8) | byte as usize;
            }
            length
        };

        if length > self.config.max_element_size {
            return Err(LdapError::ElementTooLarge {
                length,
                max: self.config.max_element_size,
            });
        }

        let header_len = raw.len();
        raw.resize(header_len + length, 0);
        self.reader.read_exact(&mut raw[header_len..]).await?;

        log::debug!("Read BER element of {} bytes from stream", raw.len());
        Ok(Some(BerElement::decode_exact(&raw)?))
    }
}
