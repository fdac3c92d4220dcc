//! Marionette CLI
//!
//! Send raw commands to a running Marionette server.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use marionette::{Config, Transport, DEFAULT_ADDRESS};
use tracing_subscriber::{fmt, EnvFilter};

/// Marionette CLI
#[derive(Parser, Debug)]
#[command(name = "marionette-cli")]
#[command(about = "Talk to a Firefox Marionette server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = DEFAULT_ADDRESS)]
    addr: String,

    /// Read/write deadline in seconds
    #[arg(short, long, default_value = "300")]
    timeout_secs: u64,

    /// Log outgoing payloads
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and print the server greeting
    Handshake,

    /// Send a command and print its result
    Send {
        /// Command name, e.g. WebDriver:GetTitle
        name: String,

        /// Parameters as a JSON object
        #[arg(default_value = "{}", value_parser = parse_params)]
        params: serde_json::Value,
    },
}

/// Parse PARAMS_JSON while clap validates arguments
fn parse_params(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid params JSON: {}", e))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.debug { "info,marionette=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> marionette::Result<ExitCode> {
    let config = Config::builder()
        .address(&args.addr)
        .io_timeout(Duration::from_secs(args.timeout_secs))
        .debug_payloads(args.debug)
        .build();

    let mut transport = Transport::new(config);
    transport.connect(&args.addr)?;

    let code = match args.command {
        Commands::Handshake => {
            println!(
                "{} (protocol {})",
                transport.application_type().unwrap_or("unknown"),
                transport.protocol_version().unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        Commands::Send { name, params } => {
            let response = transport.send(&name, &params)?;
            match response.driver_error() {
                None => {
                    println!("{}", response.value().unwrap_or("null"));
                    ExitCode::SUCCESS
                }
                Some(err) => {
                    eprintln!("{}", err);
                    if let Some(trace) = &err.stacktrace {
                        eprintln!("{}", trace);
                    }
                    ExitCode::FAILURE
                }
            }
        }
    };

    transport.close()?;
    Ok(code)
}
