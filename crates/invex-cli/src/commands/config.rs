//! Config command - manage configuration.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use invex_core::InvexConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show(config_path),
        ConfigCommand::Init(init) => init_file(init),
        ConfigCommand::Path => {
            println!("{}", super::default_config_path().display());
            Ok(())
        }
    }
}

fn show(config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    // Keys are secrets; show only whether they are set.
    config.structured.api_key = config.structured.api_key.as_deref().map(|_| "<set>".to_string());
    config.vision.api_key = config.vision.api_key.as_deref().map(|_| "<set>".to_string());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_file(args: InitArgs) -> anyhow::Result<()> {
    let path = args.output.unwrap_or_else(super::default_config_path);
    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    InvexConfig::default().save(&path)?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}
