//! Listening sockets example
//!
//! Lists every listening TCP socket and every bound UDP socket, IPv4 and
//! IPv6, with numeric addresses.

use sockmon::connections::listening;
use sockmon::{ConnectionMonitor, Protocol};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Socket Monitor - Listening Sockets ===\n");

    let snapshot = ConnectionMonitor::with_ipv6().snapshot();

    for report in &snapshot.sources {
        match &report.error {
            None => println!(
                "{:<5} {} parsed, {} malformed",
                report.kind, report.parsed, report.malformed
            ),
            Some(err) => println!("{:<5} unavailable: {}", report.kind, err),
        }
    }
    println!();

    println!("TCP listeners:");
    for conn in listening(&snapshot.records).filter(|c| c.protocol == Protocol::Tcp) {
        println!(
            "  {:<6} {:<40} uid {:?}",
            conn.label(),
            conn.local.to_string(),
            conn.uid
        );
    }

    println!("\nUDP sockets:");
    for conn in snapshot
        .records
        .iter()
        .filter(|c| c.protocol == Protocol::Udp)
    {
        println!(
            "  {:<6} {:<40} {}",
            conn.label(),
            conn.local.to_string(),
            conn.state
        );
    }

    Ok(())
}
