//! Strict hexadecimal field decoding
//!
//! Every numeric field in `/proc/net/{tcp,udp}` is a packed hex token. The
//! table parser isolates each token first; this module then converts the
//! whole token or rejects it. There is no scanf-style width truncation.

use crate::error::{Error, Result};

/// Hex digits in an IPv4 address token
pub const IPV4_DIGITS: usize = 8;
/// Hex digits in an IPv6 address token
pub const IPV6_DIGITS: usize = 32;
/// Hex digits in a port token
pub const PORT_DIGITS: usize = 4;
/// Hex digits in a state token
pub const STATE_DIGITS: usize = 2;

/// Decode `token` as an unsigned hex integer of at most `max_digits` digits.
///
/// The token must be non-empty and made only of ASCII hex digits. Signs,
/// `0x` prefixes and whitespace are rejected, as is any token longer than
/// `max_digits`. `max_digits` is capped at 32 (128 bits).
pub fn decode_hex(token: &str, max_digits: usize) -> Result<u128> {
    if token.is_empty() {
        return Err(Error::field(token, "empty token"));
    }
    let max_digits = max_digits.min(IPV6_DIGITS);
    if token.len() > max_digits {
        return Err(Error::field(
            token,
            format!("{} digits, at most {} allowed", token.len(), max_digits),
        ));
    }
    if let Some(bad) = token.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(Error::field(token, format!("non-hex character {:?}", bad)));
    }

    // from_str_radix alone would accept a leading '+'
    u128::from_str_radix(token, 16).map_err(|e| Error::field(token, e.to_string()))
}

/// Decode a hex token into a `u8` (at most 2 digits)
pub fn decode_u8(token: &str) -> Result<u8> {
    decode_hex(token, 2).map(|v| v as u8)
}

/// Decode a hex token into a `u16` (at most 4 digits)
pub fn decode_u16(token: &str) -> Result<u16> {
    decode_hex(token, 4).map(|v| v as u16)
}

/// Decode a hex token into a `u32` (at most 8 digits)
pub fn decode_u32(token: &str) -> Result<u32> {
    decode_hex(token, 8).map(|v| v as u32)
}

/// Decode a hex token into a `u128` (at most 32 digits)
pub fn decode_u128(token: &str) -> Result<u128> {
    decode_hex(token, IPV6_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_whole_token() {
        assert_eq!(decode_hex("1F90", PORT_DIGITS).unwrap(), 0x1F90);
        assert_eq!(decode_hex("0a", STATE_DIGITS).unwrap(), 10);
        assert_eq!(decode_u16("0016").unwrap(), 22);
        assert_eq!(decode_u32("0100007F").unwrap(), 0x0100_007F);
        assert_eq!(decode_u8("FF").unwrap(), 255);
        assert_eq!(
            decode_u128("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF").unwrap(),
            u128::MAX
        );
    }

    #[test]
    fn test_short_tokens_are_fine() {
        assert_eq!(decode_u16("5").unwrap(), 5);
        assert_eq!(decode_u32("0").unwrap(), 0);
    }

    #[test]
    fn test_rejects_non_hex() {
        for token in ["1G", "+1F", "0x1F", "-1", " 1F", "1F ", "12:34"] {
            let err = decode_hex(token, 8).unwrap_err();
            assert!(
                matches!(err, Error::MalformedField { .. }),
                "{:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            decode_hex("", 4),
            Err(Error::MalformedField { .. })
        ));
    }

    #[test]
    fn test_rejects_overlong() {
        // five digits where a port allows four
        assert!(matches!(
            decode_u16("1F900"),
            Err(Error::MalformedField { .. })
        ));
        assert!(matches!(
            decode_u32("0100007F0"),
            Err(Error::MalformedField { .. })
        ));
        assert!(matches!(
            decode_u8("00A"),
            Err(Error::MalformedField { .. })
        ));
    }
}
