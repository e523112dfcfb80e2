//! Connection records

use crate::address::{AddressFamily, Endpoint};
use crate::state::SocketState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport protocol of a connection table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Lower-case name, as netstat prints it
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    /// Name including the family suffix (`tcp6`, `udp6`)
    pub fn label(self, family: AddressFamily) -> &'static str {
        match (self, family) {
            (Protocol::Tcp, AddressFamily::Ipv4) => "tcp",
            (Protocol::Tcp, AddressFamily::Ipv6) => "tcp6",
            (Protocol::Udp, AddressFamily::Ipv4) => "udp",
            (Protocol::Udp, AddressFamily::Ipv6) => "udp6",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// One socket entry from a connection table
///
/// Built only by the record parser; never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub protocol: Protocol,
    pub family: AddressFamily,
    pub local: Endpoint,
    pub remote: Endpoint,
    pub state: SocketState,
    /// Owning user, when the uid column was present
    pub uid: Option<u32>,
    /// Socket inode, when the inode column was present
    pub inode: Option<u64>,
    /// Send queue size
    pub tx_queue: Option<u32>,
    /// Receive queue size
    pub rx_queue: Option<u32>,
}

impl ConnectionRecord {
    /// `tcp`, `udp6`, ...
    pub fn label(&self) -> &'static str {
        self.protocol.label(self.family)
    }

    pub fn is_listening(&self) -> bool {
        self.state == SocketState::Listen
    }

    pub fn is_established(&self) -> bool {
        self.state == SocketState::Established
    }
}

impl fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {}",
            self.label(),
            self.local,
            self.remote,
            self.state
        )
    }
}
