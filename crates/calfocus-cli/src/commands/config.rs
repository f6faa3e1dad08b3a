use clap::Subcommand;
use calfocus_core::Config;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "lead_in_seconds", "focus_name")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(ctx: &Context, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let settings = ctx.load()?;
            let value = settings
                .config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            ctx.update(|settings| Ok(settings.config.set(&key, &value)?))?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = ctx.load()?;
            let json = serde_json::to_string_pretty(&settings.config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            ctx.update(|settings| {
                settings.config = Config::default();
                Ok(())
            })?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
