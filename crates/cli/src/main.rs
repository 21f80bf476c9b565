//! WebProxy CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Wire observability**: JSON `tracing` output on stderr, plus an
//!    OpenTelemetry OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 2. **Load configuration**: the TOML file named by `WEBPROXY_CONFIG`, or
//!    defaults.
//! 3. **Construct infrastructure**: the `reqwest` HTTP transport, the SOAP
//!    transport, and the HTML document parser, injected into a
//!    [`dispatch::WebProxy`].
//! 4. **Dispatch**: run one command and print its decoded result as JSON on
//!    stdout.

mod commands;
mod observability;

use std::process::ExitCode;

use anyhow::Context;
use dispatch::ProxyConfig;
use tracing::error;

use commands::{Command, USAGE};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "WEBPROXY_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help" | "help") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let _telemetry = match observability::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match execute(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> anyhow::Result<()> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => ProxyConfig::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => ProxyConfig::default(),
    };

    let output = commands::run(command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
