//! Connection store and snapshot
//!
//! Records are appended as they are parsed and sorted once, right before
//! they are handed to the presenter. Nothing is deduplicated: two identical
//! table lines stay two records.

use crate::record::ConnectionRecord;
use crate::source::TableKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Total order over connection records.
///
/// protocol (TCP first), family (IPv4 first), local address, local port,
/// remote address, remote port, state name, then the optional columns.
/// Addresses compare byte-wise on the decoded value.
pub fn compare_records(a: &ConnectionRecord, b: &ConnectionRecord) -> Ordering {
    a.protocol
        .cmp(&b.protocol)
        .then_with(|| a.family.cmp(&b.family))
        .then_with(|| a.local.ip.cmp(&b.local.ip))
        .then_with(|| a.local.port.cmp(&b.local.port))
        .then_with(|| a.remote.ip.cmp(&b.remote.ip))
        .then_with(|| a.remote.port.cmp(&b.remote.port))
        .then_with(|| a.state.name().cmp(b.state.name()))
        .then_with(|| a.uid.cmp(&b.uid))
        .then_with(|| a.inode.cmp(&b.inode))
        .then_with(|| a.tx_queue.cmp(&b.tx_queue))
        .then_with(|| a.rx_queue.cmp(&b.rx_queue))
}

/// Append-only collection of parsed records
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    records: Vec<ConnectionRecord>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, record: ConnectionRecord) {
        self.records.push(record);
    }

    /// Move every record of `other` into this store
    pub fn merge(&mut self, other: ConnectionStore) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConnectionRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ConnectionRecord] {
        &self.records
    }

    /// Sort in place with [`compare_records`]
    pub fn sort(&mut self) {
        self.records.sort_by(compare_records);
    }

    /// All records in [`compare_records`] order, without reordering the store
    pub fn sorted_view(&self) -> Vec<&ConnectionRecord> {
        self.sorted_view_by(compare_records)
    }

    /// All records ordered by `cmp` (stable), without reordering the store
    pub fn sorted_view_by<F>(&self, mut cmp: F) -> Vec<&ConnectionRecord>
    where
        F: FnMut(&ConnectionRecord, &ConnectionRecord) -> Ordering,
    {
        let mut view: Vec<&ConnectionRecord> = self.records.iter().collect();
        view.sort_by(|a, b| cmp(a, b));
        view
    }

    /// Sort and freeze into a snapshot
    pub fn into_snapshot(mut self, sources: Vec<SourceReport>) -> ConnectionSnapshot {
        self.sort();
        ConnectionSnapshot {
            captured_at: Utc::now(),
            records: self.records,
            sources,
        }
    }
}

impl Extend<ConnectionRecord> for ConnectionStore {
    fn extend<I: IntoIterator<Item = ConnectionRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl FromIterator<ConnectionRecord> for ConnectionStore {
    fn from_iter<I: IntoIterator<Item = ConnectionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConnectionStore {
    type Item = &'a ConnectionRecord;
    type IntoIter = std::slice::Iter<'a, ConnectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Outcome of reading one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub kind: TableKind,
    pub path: PathBuf,
    /// Records that made it into the store
    pub parsed: usize,
    /// Lines rejected as malformed
    pub malformed: usize,
    /// Why the table could not be read, if it could not
    pub error: Option<String>,
}

impl SourceReport {
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// Sorted connection set produced by one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub captured_at: DateTime<Utc>,
    pub records: Vec<ConnectionRecord>,
    pub sources: Vec<SourceReport>,
}

impl ConnectionSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total malformed lines across all tables
    pub fn malformed_lines(&self) -> usize {
        self.sources.iter().map(|s| s.malformed).sum()
    }

    /// Tables that could not be opened
    pub fn unavailable_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.is_available())
    }

    /// True when at least one table was read
    pub fn any_source_available(&self) -> bool {
        self.sources.iter().any(SourceReport::is_available)
    }
}
