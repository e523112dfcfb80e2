//! CLI tool for Socket Monitor (sockmon)

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "sockmon")]
#[command(about = "Socket Monitor: list TCP and UDP sockets from /proc/net, netstat/ss style", long_about = None)]
#[command(version)]
#[command(after_help = "Examples:\n  sockmon            Show all TCP and UDP connections\n  sockmon -t -l      Show only TCP listening sockets\n  sockmon -u -n      Show UDP connections with numeric addresses\n\nReads /proc/net/{tcp,udp} (and tcp6/udp6 with -6).")]
struct Cli {
    /// Show TCP connections (default: both TCP and UDP)
    #[arg(short, long)]
    tcp: bool,

    /// Show UDP connections (default: both TCP and UDP)
    #[arg(short, long)]
    udp: bool,

    /// Show only listening sockets
    #[arg(short, long)]
    listening: bool,

    /// Show only established connections
    #[arg(short, long)]
    established: bool,

    /// Show numeric addresses and uids instead of resolving names
    #[arg(short, long)]
    numeric: bool,

    /// Include the IPv6 tables (tcp6, udp6)
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Output format (json or text)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// procfs mount point to read the tables from
    #[arg(long)]
    proc_root: Option<PathBuf>,

    /// Configuration file (default: ~/.config/sockmon/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use sockmon::presenter::render_table;
    use sockmon::{
        Config, ConnectionMonitor, Filter, NameResolver, NumericResolver, SystemResolver,
        TableOptions,
    };

    let cli = Cli::parse();

    env_logger::init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Command-line flags override the configuration file
    if cli.tcp || cli.udp {
        config.sources.tcp = cli.tcp;
        config.sources.udp = cli.udp;
    }
    if cli.ipv6 {
        config.sources.include_ipv6 = true;
    }
    if let Some(root) = &cli.proc_root {
        config.sources.proc_root = root.clone();
    }
    if cli.numeric {
        config.display.numeric = true;
    }

    let snapshot = ConnectionMonitor::from_config(&config.sources).snapshot();

    for report in snapshot.unavailable_sources() {
        eprintln!(
            "Warning: Failed to read {} connections: {}",
            report.kind,
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    if !snapshot.any_source_available() {
        eprintln!("Error: no connection table could be read");
        std::process::exit(1);
    }

    let filter = Filter {
        tcp: config.sources.tcp,
        udp: config.sources.udp,
        listening: cli.listening,
        established: cli.established,
    };

    if cli.format == "json" {
        let shown: Vec<_> = filter.apply(&snapshot.records).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "captured_at": snapshot.captured_at,
                "sources": snapshot.sources,
                "connections": shown,
            }))?
        );
        return Ok(());
    }

    let resolver: Box<dyn NameResolver> = if config.display.numeric {
        Box::new(NumericResolver)
    } else {
        Box::new(SystemResolver::new())
    };
    let options = TableOptions::from(&config.display);

    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    println!("=== Active connections on {} ===\n", host);
    print!(
        "{}",
        render_table(&snapshot.records, &filter, &options, resolver.as_ref())
    );

    let malformed = snapshot.malformed_lines();
    if config.display.report_malformed && malformed > 0 {
        eprintln!("Note: skipped {} malformed line(s)", malformed);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
