//! passband CLI - real-time bandpass filter between an input and an output device.

mod commands;
mod console;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passband")]
#[command(author, version, about = "Real-time bandpass audio pass-through", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio devices and host defaults
    Devices(commands::devices::DevicesArgs),

    /// Run the filter between two devices with an interactive console
    Run(commands::run::RunArgs),

    /// Print the effective configuration as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
