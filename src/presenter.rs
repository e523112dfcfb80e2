//! Table rendering
//!
//! Filtering and formatting of a snapshot for display. Name resolution
//! happens here and only here; it never changes which records exist or in
//! what order they appear.

use crate::address::Endpoint;
use crate::config::DisplayConfig;
use crate::record::{ConnectionRecord, Protocol};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::process::Command;

const COL_PROTOCOL_WIDTH: usize = 8;
const COL_LOCAL_WIDTH: usize = 22;
const COL_REMOTE_WIDTH: usize = 22;
const COL_STATE_WIDTH: usize = 12;
const COL_UID_WIDTH: usize = 8;
const COL_QUEUE_WIDTH: usize = 7;
const COL_INODE_WIDTH: usize = 10;

/// Which records to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub tcp: bool,
    pub udp: bool,
    /// Only LISTEN sockets
    pub listening: bool,
    /// Only ESTABLISHED connections
    pub established: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            tcp: true,
            udp: true,
            listening: false,
            established: false,
        }
    }
}

impl Filter {
    /// Should `record` be displayed?
    ///
    /// With both state filters set, a record passes if it matches either.
    pub fn matches(&self, record: &ConnectionRecord) -> bool {
        let protocol_ok = match record.protocol {
            Protocol::Tcp => self.tcp,
            Protocol::Udp => self.udp,
        };
        if !protocol_ok {
            return false;
        }

        match (self.listening, self.established) {
            (false, false) => true,
            (true, false) => record.is_listening(),
            (false, true) => record.is_established(),
            (true, true) => record.is_listening() || record.is_established(),
        }
    }

    pub fn apply<'a>(
        &'a self,
        records: &'a [ConnectionRecord],
    ) -> impl Iterator<Item = &'a ConnectionRecord> + 'a {
        records.iter().filter(move |r| self.matches(r))
    }
}

/// Turns addresses and uids into names
pub trait NameResolver {
    /// Host name for an address, if one is known
    fn host_name(&self, ip: IpAddr) -> Option<String>;
    /// Login name for a uid, if one is known
    fn user_name(&self, uid: u32) -> Option<String>;
}

/// Resolves nothing; everything prints numerically
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericResolver;

impl NameResolver for NumericResolver {
    fn host_name(&self, _ip: IpAddr) -> Option<String> {
        None
    }

    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }
}

/// Resolves through the system: `host(1)` for addresses, the passwd
/// database for uids. Lookups are cached for the life of the resolver.
#[derive(Debug, Default)]
pub struct SystemResolver {
    hosts: RefCell<HashMap<IpAddr, Option<String>>>,
    users: RefCell<HashMap<u32, Option<String>>>,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameResolver for SystemResolver {
    fn host_name(&self, ip: IpAddr) -> Option<String> {
        if let Some(cached) = self.hosts.borrow().get(&ip) {
            return cached.clone();
        }
        let name = reverse_dns(ip);
        self.hosts.borrow_mut().insert(ip, name.clone());
        name
    }

    fn user_name(&self, uid: u32) -> Option<String> {
        if let Some(cached) = self.users.borrow().get(&uid) {
            return cached.clone();
        }
        let name = lookup_user(uid);
        self.users.borrow_mut().insert(uid, name.clone());
        name
    }
}

/// Reverse lookup via `host`; `None` when the command is missing or has no
/// PTR record
fn reverse_dns(ip: IpAddr) -> Option<String> {
    if ip.is_unspecified() {
        return None;
    }

    let output = Command::new("host").arg(ip.to_string()).output().ok()?;
    if !output.status.success() {
        log::debug!("host {} exited with {}", ip, output.status);
        return None;
    }
    parse_host_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse "x.x.x.x.in-addr.arpa domain name pointer hostname."
fn parse_host_output(stdout: &str) -> Option<String> {
    let line = stdout.lines().find(|l| l.contains("domain name pointer"))?;
    let hostname = line.split("pointer").nth(1)?.trim().trim_end_matches('.');
    if hostname.is_empty() {
        None
    } else {
        Some(hostname.to_string())
    }
}

#[cfg(unix)]
fn lookup_user(uid: u32) -> Option<String> {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::from_raw(uid)) {
        Ok(user) => user.map(|u| u.name),
        Err(e) => {
            log::debug!("uid {} lookup failed: {}", uid, e);
            None
        }
    }
}

#[cfg(not(unix))]
fn lookup_user(_uid: u32) -> Option<String> {
    None
}

/// Column and naming options for [`render_table`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub numeric: bool,
    pub show_queues: bool,
    pub show_inode: bool,
}

impl From<&DisplayConfig> for TableOptions {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            numeric: config.numeric,
            show_queues: config.show_queues,
            show_inode: config.show_inode,
        }
    }
}

/// Format one endpoint: `*:port` for the wildcard address, otherwise the
/// address (or its host name unless `numeric`) and port
pub fn format_endpoint(endpoint: &Endpoint, numeric: bool, resolver: &dyn NameResolver) -> String {
    if endpoint.is_unspecified() {
        return format!("*:{}", endpoint.port);
    }
    if !numeric {
        if let Some(name) = resolver.host_name(endpoint.ip) {
            return format!("{}:{}", name, endpoint.port);
        }
    }
    endpoint.to_string()
}

fn format_uid(uid: Option<u32>, numeric: bool, resolver: &dyn NameResolver) -> String {
    match uid {
        None => "-".to_string(),
        Some(uid) if numeric => uid.to_string(),
        Some(uid) => resolver.user_name(uid).unwrap_or_else(|| uid.to_string()),
    }
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn header(options: &TableOptions) -> String {
    let mut line = format!("{:<w$} ", "Proto", w = COL_PROTOCOL_WIDTH);
    if options.show_queues {
        let _ = write!(
            line,
            "{:>w$} {:>w$} ",
            "Recv-Q",
            "Send-Q",
            w = COL_QUEUE_WIDTH
        );
    }
    let _ = write!(
        line,
        "{:<lw$} {:<rw$} {:<sw$} {:<uw$}",
        "Local Address",
        "Remote Address",
        "State",
        "UID",
        lw = COL_LOCAL_WIDTH,
        rw = COL_REMOTE_WIDTH,
        sw = COL_STATE_WIDTH,
        uw = COL_UID_WIDTH
    );
    if options.show_inode {
        let _ = write!(line, " {:<w$}", "Inode", w = COL_INODE_WIDTH);
    }
    line
}

fn row(record: &ConnectionRecord, options: &TableOptions, resolver: &dyn NameResolver) -> String {
    let mut line = format!("{:<w$} ", record.label(), w = COL_PROTOCOL_WIDTH);
    if options.show_queues {
        let _ = write!(
            line,
            "{:>w$} {:>w$} ",
            format_optional(record.rx_queue),
            format_optional(record.tx_queue),
            w = COL_QUEUE_WIDTH
        );
    }
    let _ = write!(
        line,
        "{:<lw$} {:<rw$} {:<sw$} {:<uw$}",
        format_endpoint(&record.local, options.numeric, resolver),
        format_endpoint(&record.remote, options.numeric, resolver),
        record.state.name(),
        format_uid(record.uid, options.numeric, resolver),
        lw = COL_LOCAL_WIDTH,
        rw = COL_REMOTE_WIDTH,
        sw = COL_STATE_WIDTH,
        uw = COL_UID_WIDTH
    );
    if options.show_inode {
        let _ = write!(line, " {:<w$}", format_optional(record.inode), w = COL_INODE_WIDTH);
    }
    line.trim_end().to_string()
}

/// Render the records that pass `filter` as a text table.
///
/// Records are printed in the order given; sort the snapshot first.
pub fn render_table(
    records: &[ConnectionRecord],
    filter: &Filter,
    options: &TableOptions,
    resolver: &dyn NameResolver,
) -> String {
    let shown: Vec<&ConnectionRecord> = filter.apply(records).collect();
    if shown.is_empty() {
        return "No connections found matching the specified criteria.\n".to_string();
    }

    let mut out = String::new();
    let head = header(options);
    let head = head.trim_end();
    out.push_str(head);
    out.push('\n');
    out.push_str(&"-".repeat(head.len()));
    out.push('\n');

    for record in &shown {
        out.push_str(&row(record, options, resolver));
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "\nTotal: {} connection{}",
        shown.len(),
        if shown.len() != 1 { "s" } else { "" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use crate::state::SocketState;

    struct FixedResolver;

    impl NameResolver for FixedResolver {
        fn host_name(&self, ip: IpAddr) -> Option<String> {
            ip.is_loopback().then(|| "localhost".to_string())
        }

        fn user_name(&self, uid: u32) -> Option<String> {
            (uid == 0).then(|| "root".to_string())
        }
    }

    fn records() -> Vec<ConnectionRecord> {
        [
            (Protocol::Tcp, "0: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000 0 0 100"),
            (Protocol::Tcp, "1: 0100007F:1F90 0100007F:0050 01 00000001:00000002 00:00000000 00000000 1000 0 101"),
            (Protocol::Udp, "2: 0100007F:0035 00000000:0000 07 00000000:00000000 00:00000000 00000000 101 0 102"),
        ]
        .iter()
        .map(|(protocol, line)| parse_line(line, *protocol).unwrap())
        .collect()
    }

    #[test]
    fn test_filter_protocol() {
        let recs = records();
        let tcp_only = Filter {
            udp: false,
            ..Filter::default()
        };
        assert_eq!(tcp_only.apply(&recs).count(), 2);
        let udp_only = Filter {
            tcp: false,
            ..Filter::default()
        };
        assert_eq!(udp_only.apply(&recs).count(), 1);
    }

    #[test]
    fn test_filter_state() {
        let recs = records();
        let listening = Filter {
            listening: true,
            ..Filter::default()
        };
        let shown: Vec<_> = listening.apply(&recs).collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].state, SocketState::Listen);

        let both = Filter {
            listening: true,
            established: true,
            ..Filter::default()
        };
        assert_eq!(both.apply(&recs).count(), 2);
    }

    #[test]
    fn test_wildcard_endpoint() {
        let recs = records();
        assert_eq!(format_endpoint(&recs[0].local, true, &NumericResolver), "*:22");
        assert_eq!(format_endpoint(&recs[0].remote, false, &FixedResolver), "*:0");
    }

    #[test]
    fn test_resolved_vs_numeric() {
        let recs = records();
        assert_eq!(
            format_endpoint(&recs[1].local, true, &FixedResolver),
            "127.0.0.1:8080"
        );
        assert_eq!(
            format_endpoint(&recs[1].local, false, &FixedResolver),
            "localhost:8080"
        );
        assert_eq!(format_uid(Some(0), false, &FixedResolver), "root");
        assert_eq!(format_uid(Some(0), true, &FixedResolver), "0");
        assert_eq!(format_uid(Some(1000), false, &FixedResolver), "1000");
        assert_eq!(format_uid(None, false, &FixedResolver), "-");
    }

    #[test]
    fn test_render_table() {
        let recs = records();
        let out = render_table(
            &recs,
            &Filter::default(),
            &TableOptions {
                numeric: true,
                ..TableOptions::default()
            },
            &NumericResolver,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Proto    Local Address"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[1].len(), lines[0].len());
        assert!(lines[2].starts_with("tcp      *:22"));
        assert!(lines[3].contains("127.0.0.1:8080"));
        assert!(lines[3].contains("ESTABLISHED"));
        assert!(lines[4].starts_with("udp "));
        assert!(lines[4].contains("UNCONN"));
        assert_eq!(*lines.last().unwrap(), "Total: 3 connections");
    }

    #[test]
    fn test_render_optional_columns() {
        let recs = records();
        let out = render_table(
            &recs[1..2],
            &Filter::default(),
            &TableOptions {
                numeric: true,
                show_queues: true,
                show_inode: true,
            },
            &NumericResolver,
        );
        assert!(out.contains("Recv-Q"));
        assert!(out.contains("Inode"));
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap().len(), lines.next().unwrap().len());
        let row = out.lines().nth(2).unwrap();
        assert!(row.ends_with("101"));
        assert!(row.contains("      2       1 "));
        assert!(out.ends_with("Total: 1 connection\n"));
    }

    #[test]
    fn test_render_empty() {
        let recs = records();
        let filter = Filter {
            tcp: false,
            udp: false,
            ..Filter::default()
        };
        assert_eq!(
            render_table(&recs, &filter, &TableOptions::default(), &NumericResolver),
            "No connections found matching the specified criteria.\n"
        );
    }

    #[test]
    fn test_parse_host_output() {
        assert_eq!(
            parse_host_output("1.0.0.127.in-addr.arpa domain name pointer localhost.\n"),
            Some("localhost".to_string())
        );
        assert_eq!(
            parse_host_output("Host 5.0.0.10.in-addr.arpa. not found: 3(NXDOMAIN)\n"),
            None
        );
    }
}
