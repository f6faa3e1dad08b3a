use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use context::Context;

#[derive(Parser)]
#[command(name = "calfocus", version, about = "Calendar-driven focus mode")]
struct Cli {
    /// Settings file (default: ~/.config/calfocus/settings.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until interrupted
    Run,
    /// Run one decision cycle and print the result
    Check {
        /// Decide only; do not save or switch focus
        #[arg(long)]
        dry_run: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Show focus state and accounts
    Status {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// OAuth client credentials
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Calendar account management
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Enable or disable individual calendars
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Switch focus manually
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Serve the line-delimited JSON bridge on stdin/stdout
    Bridge,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::new(cli.settings);
    let result = match cli.command {
        Commands::Run => commands::run::run(&ctx).await,
        Commands::Check { dry_run, json } => commands::check::run(&ctx, dry_run, json).await,
        Commands::Status { json } => commands::status::run(&ctx, json),
        Commands::Config { action } => commands::config::run(&ctx, action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Account { action } => commands::account::run(&ctx, action).await,
        Commands::Calendar { action } => commands::calendar::run(&ctx, action),
        Commands::Focus { action } => commands::focus::run(&ctx, action).await,
        Commands::Bridge => commands::bridge::run(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
