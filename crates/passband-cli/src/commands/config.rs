//! Effective configuration command.

use clap::Args;
use passband_config::EngineConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration file (TOML). Defaults to the user config file if present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print only the path that would be loaded
    #[arg(long)]
    path: bool,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    if args.path {
        let path = args
            .config
            .unwrap_or_else(passband_config::default_config_path);
        println!("{}", path.display());
        return Ok(());
    }

    let (config, source) = EngineConfig::load_or_default(args.config.as_deref())?;
    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
