//! Network Connection Monitoring (netstat-like)
//!
//! Reads the kernel connection tables, parses every line into a
//! [`ConnectionRecord`], and returns one sorted [`ConnectionSnapshot`].
//!
//! Errors are recovered where they happen: a malformed line is counted and
//! skipped, an unreadable table is reported and the other tables are still
//! read.
//!
//! # Examples
//!
//! ```no_run
//! use sockmon::connections::ConnectionMonitor;
//!
//! let snapshot = ConnectionMonitor::new().snapshot();
//! for conn in &snapshot.records {
//!     println!("{} -> {} ({})", conn.local, conn.remote, conn.state);
//! }
//! ```

use crate::config::SourceConfig;
use crate::error::Error;
use crate::parser::TableRecords;
use crate::record::ConnectionRecord;
use crate::source::{TableKind, TableSource};
use crate::store::{ConnectionSnapshot, ConnectionStore, SourceReport};
use std::error::Error as StdError;
use std::io::BufRead;

/// Connection monitor over a fixed set of tables
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    sources: Vec<TableSource>,
}

impl ConnectionMonitor {
    /// Monitor `/proc/net/tcp` and `/proc/net/udp`
    pub fn new() -> Self {
        Self::with_sources(vec![
            TableSource::system(TableKind::Tcp),
            TableSource::system(TableKind::Udp),
        ])
    }

    /// Monitor all four tables, IPv6 included
    pub fn with_ipv6() -> Self {
        Self::with_sources(TableKind::ALL.into_iter().map(TableSource::system).collect())
    }

    /// Monitor the tables selected by a configuration
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::with_sources(
            config
                .tables()
                .into_iter()
                .map(|kind| TableSource::under(kind, &config.proc_root))
                .collect(),
        )
    }

    /// Monitor an explicit list of tables
    pub fn with_sources(sources: Vec<TableSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[TableSource] {
        &self.sources
    }

    /// Read every table once and return the sorted result
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let mut store = ConnectionStore::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            reports.push(scan_source(source, &mut store));
        }

        let snapshot = store.into_snapshot(reports);
        log::info!(
            "Scanned {} table(s): {} connection(s), {} malformed line(s)",
            snapshot.sources.len(),
            snapshot.len(),
            snapshot.malformed_lines()
        );
        snapshot
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn scan_source(source: &TableSource, store: &mut ConnectionStore) -> SourceReport {
    let mut report = SourceReport {
        kind: source.kind,
        path: source.path.clone(),
        parsed: 0,
        malformed: 0,
        error: None,
    };

    match source.records() {
        Ok(records) => {
            let (parsed, malformed) = drain_records(records, source, store);
            report.parsed = parsed;
            report.malformed = malformed;
        }
        Err(e) => {
            log::warn!("Skipping {} table: {}", source.kind, e);
            report.error = Some(e.to_string());
        }
    }

    report
}

fn drain_records<R: BufRead>(
    mut records: TableRecords<R>,
    source: &TableSource,
    store: &mut ConnectionStore,
) -> (usize, usize) {
    let mut parsed = 0;
    let mut malformed = 0;

    while let Some(result) = records.next() {
        match result {
            Ok(record) => {
                store.append(record);
                parsed += 1;
            }
            Err(Error::Io(e)) => {
                log::warn!(
                    "Read error in {} after line {}: {}",
                    source.path.display(),
                    records.line_number(),
                    e
                );
            }
            Err(e) => {
                malformed += 1;
                log::debug!(
                    "{}:{}: {}",
                    source.path.display(),
                    records.line_number(),
                    error_chain(&e)
                );
            }
        }
    }

    (parsed, malformed)
}

/// Parse an already opened table into a store of its own.
///
/// Returns the store and the number of malformed lines.
pub fn scan_reader<R: BufRead>(reader: R, kind: TableKind) -> (ConnectionStore, usize) {
    let mut store = ConnectionStore::new();
    let mut malformed = 0;
    for result in crate::parser::parse_table(reader, kind.protocol(), kind.family()) {
        match result {
            Ok(record) => store.append(record),
            Err(Error::Io(e)) => log::warn!("Read error in {} table: {}", kind, e),
            Err(e) => {
                malformed += 1;
                log::debug!("{} table: {}", kind, error_chain(&e));
            }
        }
    }
    (store, malformed)
}

fn error_chain(err: &Error) -> String {
    let mut msg = err.to_string();
    let mut cause = StdError::source(err);
    while let Some(inner) = cause {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        cause = inner.source();
    }
    msg
}

/// Only the listening sockets of a record set
pub fn listening(records: &[ConnectionRecord]) -> impl Iterator<Item = &ConnectionRecord> {
    records.iter().filter(|r| r.is_listening())
}

/// Only the established connections of a record set
pub fn established(records: &[ConnectionRecord]) -> impl Iterator<Item = &ConnectionRecord> {
    records.iter().filter(|r| r.is_established())
}
