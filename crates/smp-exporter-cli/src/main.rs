//! CLI for smp-exporter — Prometheus exporter for Extron SMP/SMD appliances.

mod commands;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use smp_exporter_server::{ClientConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "smp-exporter")]
#[command(about = "Prometheus exporter for Extron SMP 300 / SMP 401 / SMD 101 appliances")]
#[command(version = smp_exporter_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /probe and /metrics for Prometheus
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:9109")]
        listen_address: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Probe one device and print its metrics
    Probe {
        /// Device address, e.g. 10.0.0.5 or https://smp.example.org
        #[arg(long)]
        target: String,

        /// Authorization header value forwarded to the device (e.g. "Basic ...")
        #[arg(long, env = "SMP_EXPORTER_AUTHORIZATION")]
        authorization: Option<String>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// List supported models and their metric rules
    Models {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Device client flags shared by `serve` and `probe`.
#[derive(Args)]
struct ClientArgs {
    /// Total timeout of a device request in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "5")]
    connect_timeout_secs: u64,

    /// Verify device TLS certificates (appliances usually ship self-signed ones)
    #[arg(long)]
    verify_tls: bool,
}

impl ClientArgs {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            verify_tls: self.verify_tls,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen_address,
            client,
        } => commands::serve::run(ServerConfig {
            listen_address,
            client: client.config(),
        }),
        Commands::Probe {
            target,
            authorization,
            client,
        } => commands::probe::run(&target, authorization.as_deref(), &client.config()),
        Commands::Models { json } => commands::models::run(json),
    }
}
