//! ASN.1 BER processing for the LDAP protocol
//!
//! This crate provides the BER value tree ([`BerElement`]), a TLV encoder and
//! decoder, and (with the `tokio` feature) an async reader that frames
//! elements arriving on a byte stream.

pub mod ber;

pub use ber::{
    check_element_count, universal, BerContent, BerDecoder, BerElement, BerEncoder, BerLength,
    BerTag, BerTagClass,
};
#[cfg(feature = "tokio")]
pub use ber::{BerStreamReader, StreamReaderConfig};

#[cfg(test)]
mod interop_tests {
    //! Cross-check encodings against an independent BER implementation.

    use super::*;

    #[test]
    fn test_integer_encoding_matches_rasn() {
        for value in [0i64, 1, -1, 127, 128, -128, -129, 256, 65_535, -65_536, i64::MAX, i64::MIN] {
            let ours = BerElement::integer(value).encode();
            let theirs = rasn::ber::encode(&value).unwrap();
            assert_eq!(ours, theirs, "value {}", value);
            assert_eq!(rasn::ber::decode::<i64>(&ours).unwrap(), value);
        }
    }

    #[test]
    fn test_octet_string_encoding_matches_rasn() {
        let payload = vec![0x5Au8; 200];
        let ours = BerElement::octet_string(payload.clone()).encode();
        let theirs = rasn::ber::encode(&rasn::types::OctetString::from(payload.clone())).unwrap();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn test_boolean_decodes_with_rasn() {
        assert!(rasn::ber::decode::<bool>(&BerElement::boolean(true).encode()).unwrap());
        assert!(!rasn::ber::decode::<bool>(&BerElement::boolean(false).encode()).unwrap());
    }
}
