//! # Socket Monitor (sockmon)
//!
//! A read-only connection inspector in the spirit of `netstat`/`ss`. It reads
//! the kernel's textual connection tables (`/proc/net/tcp`, `/proc/net/udp`,
//! and optionally their IPv6 counterparts), decodes the packed hexadecimal
//! fields, and returns one deterministically sorted snapshot.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sockmon::{ConnectionMonitor, Filter, NumericResolver, TableOptions};
//!
//! let snapshot = ConnectionMonitor::with_ipv6().snapshot();
//! for report in snapshot.unavailable_sources() {
//!     eprintln!("skipped {}: {:?}", report.kind, report.error);
//! }
//! print!(
//!     "{}",
//!     sockmon::presenter::render_table(
//!         &snapshot.records,
//!         &Filter::default(),
//!         &TableOptions { numeric: true, ..TableOptions::default() },
//!         &NumericResolver,
//!     )
//! );
//! ```
//!
//! ## Decoding a single line
//!
//! ```
//! use sockmon::{parse_line, Protocol, SocketState};
//!
//! let line = "0: 0100007F:1F90 0100007F:0050 01 00000000:00000000 00:00000000 00000000 1000 0 12345";
//! let record = parse_line(line, Protocol::Tcp).unwrap();
//! assert_eq!(record.local.to_string(), "127.0.0.1:8080");
//! assert_eq!(record.remote.to_string(), "127.0.0.1:80");
//! assert_eq!(record.state, SocketState::Established);
//! ```
//!
//! ## Pipeline
//!
//! - [`hex`] - strict whole-token hex decoding
//! - [`address`] - kernel address/port layout
//! - [`state`] - numeric state codes
//! - [`parser`] - one table line to one record
//! - [`store`] - record collection, sort order, snapshot
//! - [`source`] - the table files
//! - [`connections`] - runs the above for a set of tables
//! - [`presenter`] - filters and text table

pub mod address;
pub mod config; // Configuration management with TOML persistence
pub mod connections; // Connection table scanning (netstat-like)
pub mod error;
pub mod hex;
pub mod parser;
pub mod presenter;
pub mod record;
pub mod source;
pub mod state;
pub mod store;

pub use address::{AddressFamily, Endpoint};
pub use config::{Config, DisplayConfig, SourceConfig};
pub use connections::ConnectionMonitor;
pub use error::{Error, Result};
pub use parser::{parse_line, parse_table, RecordParser};
pub use presenter::{Filter, NameResolver, NumericResolver, SystemResolver, TableOptions};
pub use record::{ConnectionRecord, Protocol};
pub use source::{TableKind, TableSource};
pub use state::SocketState;
pub use store::{compare_records, ConnectionSnapshot, ConnectionStore, SourceReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
