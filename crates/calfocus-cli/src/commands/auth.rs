use clap::Subcommand;
use calfocus_core::integrations::ClientCredentials;

use crate::context::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the Google OAuth client id and secret in the OS keyring
    Login {
        /// OAuth client ID
        #[arg(long)]
        client_id: String,
        /// OAuth client secret
        #[arg(long)]
        client_secret: String,
    },
    /// Remove the stored client credentials
    Logout,
    /// Check whether client credentials are configured
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => {
            let client_id = client_id.trim().to_string();
            let client_secret = client_secret.trim().to_string();
            if client_id.is_empty() || client_secret.is_empty() {
                return Err("--client-id and --client-secret must not be empty".into());
            }
            ClientCredentials {
                client_id,
                client_secret,
            }
            .save()?;
            println!("client credentials saved");
        }
        AuthAction::Logout => {
            ClientCredentials::delete()?;
            println!("client credentials removed");
        }
        AuthAction::Status => {
            println!(
                "{}",
                if ClientCredentials::load()?.is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
        }
    }
    Ok(())
}
