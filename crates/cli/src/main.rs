use anyhow::Context;
use clap::{Parser, Subcommand};
use dnswatch_domain::{CliOverrides, Transport};
use dnswatch_infrastructure::dns::{probe, DnsContext};
use std::path::PathBuf;
use tracing::info;

mod bootstrap;
mod replay;
mod summary;

#[derive(Parser)]
#[command(name = "dnswatch")]
#[command(version)]
#[command(about = "dnswatch - passive DNS transaction parser")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Unreplied requests per flow before FLOODED is raised (0 disables)
    #[arg(long)]
    request_flood: Option<u32>,

    /// Per-flow memory cap in bytes (0 disables)
    #[arg(long)]
    state_memcap: Option<u64>,

    /// Global memory cap in bytes (0 disables)
    #[arg(long)]
    global_memcap: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a hex capture through one flow and print transactions as JSON lines
    Replay {
        /// Capture file, one `> hex` or `< hex` line per message
        file: PathBuf,

        /// Treat lines as TCP segments carrying length-prefixed messages
        #[arg(long)]
        tcp: bool,
    },

    /// Check whether a hex payload looks like a DNS message
    Probe {
        /// Hex-encoded payload
        payload: String,
    },

    /// Print the numeric id of a decoder event name
    EventId { name: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        request_flood: cli.request_flood,
        state_memcap: cli.state_memcap,
        global_memcap: cli.global_memcap,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    if let Some(path) = bootstrap::config_source(cli.config.as_deref()) {
        info!(path = %path, "Configuration loaded");
    }

    match cli.command {
        Command::Replay { file, tcp } => {
            info!("Starting dnswatch v{}", env!("CARGO_PKG_VERSION"));

            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let lines = replay::parse_capture(&text)?;
            let transport = if tcp { Transport::Tcp } else { Transport::Udp };

            let ctx = DnsContext::new(&config.dns);
            let stdout = std::io::stdout();
            replay::replay(&ctx, transport, &lines, &mut stdout.lock())?;
        }
        Command::Probe { payload } => {
            let bytes = hex::decode(payload.trim()).context("invalid hex payload")?;
            println!("{}", probe(&bytes));
        }
        Command::EventId { name } => match DnsContext::event_id_by_name(&name) {
            Some(id) => println!("{}", id),
            None => anyhow::bail!("unknown decoder event '{}'", name),
        },
    }

    Ok(())
}
