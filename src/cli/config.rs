use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the config file and store locations
    Path,

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    match args.action {
        ConfigAction::Show => {
            println!("Current configuration ({}):", ctx.config_path().display());
            println!("{}", serde_yaml::to_string(config)?);
        }
        ConfigAction::Path => {
            println!("config: {}", ctx.config_path().display());
            println!("store:  {}", config.store_path().display());
        }
        ConfigAction::Validate => {
            let problems = config.problems();
            if !problems.is_empty() {
                bail!("Invalid configuration:\n  {}", problems.join("\n  "));
            }
            println!("Configuration is valid");
        }
    }
    Ok(())
}
