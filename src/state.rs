//! Socket state codes
//!
//! TCP codes follow `include/net/tcp_states.h`. UDP sockets reuse a couple
//! of them (`TCP_CLOSE` for unconnected, `TCP_LISTEN`); anything else on a
//! UDP table is reported as unknown.

use crate::record::Protocol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic socket state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    NewSynRecv,
    /// UDP socket without a peer
    Unconn,
    #[default]
    Unknown,
}

impl SocketState {
    /// Name as printed by netstat
    pub fn name(self) -> &'static str {
        match self {
            SocketState::Established => "ESTABLISHED",
            SocketState::SynSent => "SYN_SENT",
            SocketState::SynRecv => "SYN_RECV",
            SocketState::FinWait1 => "FIN_WAIT1",
            SocketState::FinWait2 => "FIN_WAIT2",
            SocketState::TimeWait => "TIME_WAIT",
            SocketState::Close => "CLOSE",
            SocketState::CloseWait => "CLOSE_WAIT",
            SocketState::LastAck => "LAST_ACK",
            SocketState::Listen => "LISTEN",
            SocketState::Closing => "CLOSING",
            SocketState::NewSynRecv => "NEW_SYN_RECV",
            SocketState::Unconn => "UNCONN",
            SocketState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Map a raw state code to a state for the given protocol
pub fn resolve(protocol: Protocol, code: u8) -> SocketState {
    match protocol {
        Protocol::Tcp => tcp_state(code),
        Protocol::Udp => udp_state(code),
    }
}

fn tcp_state(code: u8) -> SocketState {
    match code {
        0x01 => SocketState::Established,
        0x02 => SocketState::SynSent,
        0x03 => SocketState::SynRecv,
        0x04 => SocketState::FinWait1,
        0x05 => SocketState::FinWait2,
        0x06 => SocketState::TimeWait,
        0x07 => SocketState::Close,
        0x08 => SocketState::CloseWait,
        0x09 => SocketState::LastAck,
        0x0A => SocketState::Listen,
        0x0B => SocketState::Closing,
        0x0C => SocketState::NewSynRecv,
        _ => SocketState::Unknown,
    }
}

fn udp_state(code: u8) -> SocketState {
    match code {
        0x07 => SocketState::Unconn,
        0x0A => SocketState::Listen,
        _ => SocketState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_codes_in_order() {
        let expected = [
            "ESTABLISHED",
            "SYN_SENT",
            "SYN_RECV",
            "FIN_WAIT1",
            "FIN_WAIT2",
            "TIME_WAIT",
            "CLOSE",
            "CLOSE_WAIT",
            "LAST_ACK",
            "LISTEN",
            "CLOSING",
        ];
        for (i, name) in expected.iter().enumerate() {
            assert_eq!(resolve(Protocol::Tcp, i as u8 + 1).name(), *name);
        }
    }

    #[test]
    fn test_tcp_unknown_codes() {
        assert_eq!(resolve(Protocol::Tcp, 0), SocketState::Unknown);
        assert_eq!(resolve(Protocol::Tcp, 13), SocketState::Unknown);
        assert_eq!(resolve(Protocol::Tcp, 0xFF), SocketState::Unknown);
        assert_eq!(resolve(Protocol::Tcp, 12), SocketState::NewSynRecv);
    }

    #[test]
    fn test_udp_codes() {
        assert_eq!(resolve(Protocol::Udp, 0x07), SocketState::Unconn);
        assert_eq!(resolve(Protocol::Udp, 0x0A), SocketState::Listen);
        assert_eq!(resolve(Protocol::Udp, 0x01), SocketState::Unknown);
        assert_eq!(resolve(Protocol::Udp, 0x00), SocketState::Unknown);
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(SocketState::default().to_string(), "UNKNOWN");
        assert_eq!(
            serde_json::to_string(&SocketState::FinWait1).unwrap(),
            "\"FIN_WAIT1\""
        );
    }
}
