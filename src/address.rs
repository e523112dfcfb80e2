//! Kernel address encoding
//!
//! `/proc/net/tcp` stores an IPv4 address as the raw 32-bit word in host
//! (little-endian) order, so `0100007F` is `127.0.0.1`. `/proc/net/tcp6`
//! stores the 128-bit address as four such words; word order is kept and
//! bytes are reversed inside each word. Ports are printed in network byte
//! order and need no flip.

use crate::error::{Error, Result};
use crate::hex::{self, IPV4_DIGITS, IPV6_DIGITS, PORT_DIGITS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address family of a connection table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Width of the address token in hex digits
    pub fn hex_width(self) -> usize {
        match self {
            AddressFamily::Ipv4 => IPV4_DIGITS,
            AddressFamily::Ipv6 => IPV6_DIGITS,
        }
    }

    /// Address width in bits
    pub fn bits(self) -> u32 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }

    /// Guess the family from an address token width
    pub fn from_hex_width(width: usize) -> Option<Self> {
        match width {
            IPV4_DIGITS => Some(AddressFamily::Ipv4),
            IPV6_DIGITS => Some(AddressFamily::Ipv6),
            _ => None,
        }
    }

    /// Family of a decoded address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "IPv4"),
            AddressFamily::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// One side of a connection: address plus port
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.ip)
    }

    /// `0.0.0.0` or `::`
    pub fn is_unspecified(&self) -> bool {
        self.ip.is_unspecified()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

/// Turn a raw IPv4 word as read from the table into an address
pub fn decode_ipv4(raw: u32) -> Ipv4Addr {
    // first byte pair of the token is the least significant octet
    Ipv4Addr::from(raw.swap_bytes())
}

/// Turn a raw 128-bit value as read from the table into an address
pub fn decode_ipv6(raw: u128) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    for word in 0..4 {
        let shift = 96 - 32 * word;
        let value = ((raw >> shift) as u32).swap_bytes();
        octets[word * 4..word * 4 + 4].copy_from_slice(&value.to_be_bytes());
    }
    Ipv6Addr::from(octets)
}

/// Decode an address integer of the given bit width
pub fn decode_address(raw: u128, bits: u32) -> Result<IpAddr> {
    match bits {
        32 if raw <= u32::MAX as u128 => Ok(IpAddr::V4(decode_ipv4(raw as u32))),
        128 => Ok(IpAddr::V6(decode_ipv6(raw))),
        _ => Err(Error::address(
            &format!("{:X}", raw),
            format!("unsupported address width {} bits", bits),
        )),
    }
}

/// Decode an `HEXADDR:HEXPORT` token for the given family.
///
/// The port is split off at the last colon.
pub fn decode_endpoint(token: &str, family: AddressFamily) -> Result<Endpoint> {
    let (addr_hex, port_hex) = token
        .rsplit_once(':')
        .ok_or_else(|| Error::address(token, "missing ':' separator"))?;

    if addr_hex.len() != family.hex_width() {
        return Err(Error::address(
            token,
            format!(
                "{} address needs {} hex digits, got {}",
                family,
                family.hex_width(),
                addr_hex.len()
            ),
        ));
    }

    let raw = hex::decode_hex(addr_hex, family.hex_width())?;
    let ip = decode_address(raw, family.bits())?;
    let port = hex::decode_hex(port_hex, PORT_DIGITS)? as u16;

    Ok(Endpoint { ip, port })
}

/// Decode an `HEXADDR:HEXPORT` token, inferring the family from its width
pub fn decode_endpoint_any(token: &str) -> Result<Endpoint> {
    let (addr_hex, _) = token
        .rsplit_once(':')
        .ok_or_else(|| Error::address(token, "missing ':' separator"))?;
    let family = AddressFamily::from_hex_width(addr_hex.len()).ok_or_else(|| {
        Error::address(
            token,
            format!("{} hex digits is neither IPv4 nor IPv6", addr_hex.len()),
        )
    })?;
    decode_endpoint(token, family)
}

/// Encode an endpoint back into the kernel's `HEXADDR:HEXPORT` form
pub fn encode_endpoint(endpoint: &Endpoint) -> String {
    match endpoint.ip {
        IpAddr::V4(ip) => format!(
            "{:08X}:{:04X}",
            u32::from(ip).swap_bytes(),
            endpoint.port
        ),
        IpAddr::V6(ip) => {
            let octets = ip.octets();
            let mut out = String::with_capacity(IPV6_DIGITS + 1 + PORT_DIGITS);
            for chunk in octets.chunks_exact(4) {
                let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                out.push_str(&format!("{:08X}", word.swap_bytes()));
            }
            out.push_str(&format!(":{:04X}", endpoint.port));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_byte_order() {
        let ep = decode_endpoint("0100007F:1F90", AddressFamily::Ipv4).unwrap();
        assert_eq!(ep.ip.to_string(), "127.0.0.1");
        assert_eq!(ep.port, 8080);

        // AABBCCDD -> DD.CC.BB.AA
        assert_eq!(decode_ipv4(0xAABBCCDD).to_string(), "221.204.187.170");
        assert_eq!(decode_ipv4(0x0101A8C0).to_string(), "192.168.1.1");
    }

    #[test]
    fn test_port_is_big_endian() {
        let ep = decode_endpoint("00000000:0016", AddressFamily::Ipv4).unwrap();
        assert_eq!(ep.port, 22);
        assert!(ep.is_unspecified());
        let ep = decode_endpoint("00000000:FFFF", AddressFamily::Ipv4).unwrap();
        assert_eq!(ep.port, 65535);
    }

    #[test]
    fn test_ipv6_loopback() {
        let ep = decode_endpoint(
            "00000000000000000000000001000000:0277",
            AddressFamily::Ipv6,
        )
        .unwrap();
        assert_eq!(ep.ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(ep.port, 631);
        assert_eq!(ep.to_string(), "[::1]:631");
    }

    #[test]
    fn test_ipv6_all_groups_kept() {
        // fe80::1:2:3:4, words stored little-endian
        let ep = decode_endpoint(
            "000080FE000000000200010004000300:0035",
            AddressFamily::Ipv6,
        )
        .unwrap();
        let IpAddr::V6(ip) = ep.ip else {
            panic!("expected IPv6");
        };
        assert_eq!(ip.segments(), [0xfe80, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_ipv4_mapped() {
        let ep = decode_endpoint(
            "0000000000000000FFFF00000100007F:1F90",
            AddressFamily::Ipv6,
        )
        .unwrap();
        assert_eq!(ep.ip.to_string(), "::ffff:127.0.0.1");
    }

    #[test]
    fn test_missing_separator() {
        assert!(matches!(
            decode_endpoint("0100007F1F90", AddressFamily::Ipv4),
            Err(Error::MalformedAddress { .. })
        ));
    }

    #[test]
    fn test_width_mismatch() {
        assert!(matches!(
            decode_endpoint("100007F:1F90", AddressFamily::Ipv4),
            Err(Error::MalformedAddress { .. })
        ));
        assert!(matches!(
            decode_endpoint("0100007F:1F90", AddressFamily::Ipv6),
            Err(Error::MalformedAddress { .. })
        ));
    }

    #[test]
    fn test_bad_port_is_field_error() {
        assert!(matches!(
            decode_endpoint("0100007F:1F900", AddressFamily::Ipv4),
            Err(Error::MalformedField { .. })
        ));
        assert!(matches!(
            decode_endpoint("0100007F:", AddressFamily::Ipv4),
            Err(Error::MalformedField { .. })
        ));
    }

    #[test]
    fn test_infer_family() {
        assert_eq!(
            decode_endpoint_any("0100007F:0050").unwrap().family(),
            AddressFamily::Ipv4
        );
        assert_eq!(
            decode_endpoint_any("00000000000000000000000000000000:0050")
                .unwrap()
                .family(),
            AddressFamily::Ipv6
        );
        assert!(decode_endpoint_any("0000:0050").is_err());
    }

    #[test]
    fn test_encode_then_decode() {
        let samples = [
            "10.0.2.15:55012",
            "192.168.1.254:443",
            "[2001:db8::8a2e:370:7334]:8443",
            "[::]:0",
        ];
        for text in samples {
            let addr: std::net::SocketAddr = text.parse().unwrap();
            let ep = Endpoint::new(addr.ip(), addr.port());
            let token = encode_endpoint(&ep);
            let back = decode_endpoint(&token, ep.family()).unwrap();
            assert_eq!(back, ep, "token {}", token);
            assert_eq!(back.to_string(), text);
        }
    }

    #[test]
    fn test_encode_matches_kernel_layout() {
        let ep = Endpoint::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
        assert_eq!(encode_endpoint(&ep), "0100007F:1F90");
        let ep = Endpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 80);
        assert_eq!(
            encode_endpoint(&ep),
            "00000000000000000000000001000000:0050"
        );
    }
}
