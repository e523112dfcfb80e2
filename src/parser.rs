//! `/proc/net/{tcp,udp}[6]` line parser
//!
//! Table layout (one socket per line, after a header line):
//!
//! ```text
//!   sl  local_address rem_address   st tx_queue:rx_queue tr:tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 12345
//! ```
//!
//! The line is split into whitespace-delimited fields first; each field is
//! then decoded on its own. A line that fails any step is rejected whole.

use crate::address::{self, AddressFamily};
use crate::error::{Error, Result};
use crate::hex::{self, STATE_DIGITS};
use crate::record::{ConnectionRecord, Protocol};
use crate::state;
use std::io::BufRead;

const FIELD_LOCAL: usize = 1;
const FIELD_REMOTE: usize = 2;
const FIELD_STATE: usize = 3;
const FIELD_QUEUES: usize = 4;
const FIELD_UID: usize = 7;
const FIELD_INODE: usize = 9;

/// `sl`, local, remote and state are required
pub const MIN_FIELDS: usize = 4;

/// Parser for the lines of one table (fixed protocol and family)
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    protocol: Protocol,
    family: AddressFamily,
}

impl RecordParser {
    pub fn new(protocol: Protocol, family: AddressFamily) -> Self {
        Self { protocol, family }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Parse one data line (never the header)
    pub fn parse(&self, line: &str) -> Result<ConnectionRecord> {
        parse_fields(line, self.protocol, Some(self.family))
    }
}

/// Parse one data line, taking the family from the local address width
pub fn parse_line(line: &str, protocol: Protocol) -> Result<ConnectionRecord> {
    parse_fields(line, protocol, None)
}

fn parse_fields(
    line: &str,
    protocol: Protocol,
    family: Option<AddressFamily>,
) -> Result<ConnectionRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(Error::line(format!(
            "{} fields, expected at least {}",
            fields.len(),
            MIN_FIELDS
        )));
    }

    let local = match family {
        Some(family) => address::decode_endpoint(fields[FIELD_LOCAL], family),
        None => address::decode_endpoint_any(fields[FIELD_LOCAL]),
    }
    .map_err(|e| e.in_line("local address"))?;
    let family = local.family();

    let remote = address::decode_endpoint(fields[FIELD_REMOTE], family)
        .map_err(|e| e.in_line("remote address"))?;

    let code = hex::decode_hex(fields[FIELD_STATE], STATE_DIGITS)
        .map_err(|e| e.in_line("state"))? as u8;
    let state = state::resolve(protocol, code);

    let (tx_queue, rx_queue) = match fields.get(FIELD_QUEUES) {
        Some(token) => {
            let (tx, rx) = parse_queues(token).map_err(|e| e.in_line("queues"))?;
            (Some(tx), Some(rx))
        }
        None => (None, None),
    };

    let uid = fields
        .get(FIELD_UID)
        .map(|token| parse_decimal::<u32>(token))
        .transpose()
        .map_err(|e| e.in_line("uid"))?;

    let inode = fields
        .get(FIELD_INODE)
        .map(|token| parse_decimal::<u64>(token))
        .transpose()
        .map_err(|e| e.in_line("inode"))?;

    Ok(ConnectionRecord {
        protocol,
        family,
        local,
        remote,
        state,
        uid,
        inode,
        tx_queue,
        rx_queue,
    })
}

fn parse_queues(token: &str) -> Result<(u32, u32)> {
    let (tx, rx) = token
        .split_once(':')
        .ok_or_else(|| Error::field(token, "expected tx_queue:rx_queue"))?;
    Ok((hex::decode_u32(tx)?, hex::decode_u32(rx)?))
}

fn parse_decimal<T: std::str::FromStr>(token: &str) -> Result<T> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::field(token, "expected a decimal number"));
    }
    token
        .parse::<T>()
        .map_err(|_| Error::field(token, "decimal value out of range"))
}

/// Parse a whole table from a reader, lazily.
///
/// The first line is the column header and is skipped unconditionally, as
/// are blank lines. Each remaining line yields one record or one
/// line-scoped error, including lines that are not valid UTF-8. A read
/// error is yielded once and ends the iteration.
pub fn parse_table<R: BufRead>(
    reader: R,
    protocol: Protocol,
    family: AddressFamily,
) -> TableRecords<R> {
    TableRecords {
        reader,
        buf: Vec::new(),
        parser: RecordParser::new(protocol, family),
        line_number: 0,
        done: false,
    }
}

/// Iterator returned by [`parse_table`]
pub struct TableRecords<R> {
    reader: R,
    buf: Vec<u8>,
    parser: RecordParser,
    line_number: usize,
    done: bool,
}

impl<R> TableRecords<R> {
    /// 1-based number of the line last read (the header is line 1)
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for TableRecords<R> {
    type Item = Result<ConnectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::Io(e)));
                }
            }
            self.line_number += 1;
            if self.line_number == 1 {
                continue;
            }

            let line = match std::str::from_utf8(trim_newline(&self.buf)) {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::line(format!("not valid UTF-8: {}", e)))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parser.parse(line));
        }
    }
}

fn trim_newline(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
