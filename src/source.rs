//! Connection table files under `/proc/net`

use crate::address::AddressFamily;
use crate::error::{Error, Result};
use crate::parser::{self, TableRecords};
use crate::record::Protocol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default procfs mount point
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// One of the four kernel connection tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Tcp,
    Udp,
    Tcp6,
    Udp6,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [TableKind::Tcp, TableKind::Udp, TableKind::Tcp6, TableKind::Udp6];

    pub fn new(protocol: Protocol, family: AddressFamily) -> Self {
        match (protocol, family) {
            (Protocol::Tcp, AddressFamily::Ipv4) => TableKind::Tcp,
            (Protocol::Udp, AddressFamily::Ipv4) => TableKind::Udp,
            (Protocol::Tcp, AddressFamily::Ipv6) => TableKind::Tcp6,
            (Protocol::Udp, AddressFamily::Ipv6) => TableKind::Udp6,
        }
    }

    pub fn protocol(self) -> Protocol {
        match self {
            TableKind::Tcp | TableKind::Tcp6 => Protocol::Tcp,
            TableKind::Udp | TableKind::Udp6 => Protocol::Udp,
        }
    }

    pub fn family(self) -> AddressFamily {
        match self {
            TableKind::Tcp | TableKind::Udp => AddressFamily::Ipv4,
            TableKind::Tcp6 | TableKind::Udp6 => AddressFamily::Ipv6,
        }
    }

    /// File name under `<proc>/net`
    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Tcp => "tcp",
            TableKind::Udp => "udp",
            TableKind::Tcp6 => "tcp6",
            TableKind::Udp6 => "udp6",
        }
    }

    /// Path of this table below a procfs root
    pub fn path_under(self, proc_root: &Path) -> PathBuf {
        proc_root.join("net").join(self.file_name())
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.file_name())
    }
}

/// A table file to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub kind: TableKind,
    pub path: PathBuf,
}

impl TableSource {
    /// The table at its usual place under `/proc`
    pub fn system(kind: TableKind) -> Self {
        Self::under(kind, Path::new(DEFAULT_PROC_ROOT))
    }

    /// The table below another procfs root (containers, fixtures)
    pub fn under(kind: TableKind, proc_root: &Path) -> Self {
        Self {
            kind,
            path: kind.path_under(proc_root),
        }
    }

    /// A table at an arbitrary path
    pub fn at(kind: TableKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Open the file as a line reader
    pub fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).map_err(|source| Error::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        Ok(BufReader::new(file))
    }

    /// Open the file and parse it lazily
    pub fn records(&self) -> Result<TableRecords<BufReader<File>>> {
        let reader = self.open()?;
        Ok(parser::parse_table(
            reader,
            self.kind.protocol(),
            self.kind.family(),
        ))
    }
}
