use clap::Subcommand;
use chrono::Utc;
use serde::Serialize;

use calfocus_core::integrations::google::OAUTH_REDIRECT_PORT;
use calfocus_core::integrations::{enroll_account, oauth};
use calfocus_core::{Account, OAuthError};

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Authorize a Google account in the browser and add it
    Add {
        /// Local port for the OAuth redirect
        #[arg(long, default_value_t = OAUTH_REDIRECT_PORT)]
        port: u16,
    },
    /// Remove an account and its tokens
    Remove {
        /// Account email
        email: String,
    },
    /// List accounts in check order
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct AccountSummary<'a> {
    email: &'a str,
    signed_in: bool,
    calendars_enabled: usize,
    calendars_total: usize,
}

impl<'a> From<&'a Account> for AccountSummary<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            email: &account.email,
            signed_in: account.credentials.is_some(),
            calendars_enabled: account.calendars.iter().filter(|c| c.enabled).count(),
            calendars_total: account.calendars.len(),
        }
    }
}

pub async fn run(ctx: &Context, action: AccountAction) -> CliResult {
    match action {
        AccountAction::Add { port } => add(ctx, port).await?,
        AccountAction::Remove { email } => {
            ctx.update(|settings| {
                if settings.remove_account(&email) {
                    Ok(())
                } else {
                    Err(format!("no such account: {email}").into())
                }
            })?;
            println!("removed {email}");
        }
        AccountAction::List { json } => {
            let settings = ctx.load()?;
            let summaries: Vec<AccountSummary> =
                settings.accounts.iter().map(AccountSummary::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("no accounts");
            } else {
                for s in summaries {
                    println!(
                        "{}  {}/{} calendars{}",
                        s.email,
                        s.calendars_enabled,
                        s.calendars_total,
                        if s.signed_in { "" } else { "  (signed out)" }
                    );
                }
            }
        }
    }
    Ok(())
}

async fn add(ctx: &Context, port: u16) -> CliResult {
    let config = ctx.load()?.config;
    let client = ctx
        .client_credentials()
        .ok_or_else(|| OAuthError::CredentialsNotConfigured {
            service: "google".into(),
        })?;
    let provider = ctx.provider(Some(client), &config)?;
    let oauth_config = provider
        .oauth_config(port)
        .ok_or("OAuth client credentials not configured")?;

    println!("Opening browser for Google sign-in...");
    let code = oauth::authorize(&oauth_config).await?;
    let account = enroll_account(&provider, &code, Utc::now()).await?;

    let summary = format!(
        "added {} ({} calendars, primary enabled)",
        account.email,
        account.calendars.len()
    );
    // The sign-in can take minutes; merge into the document as it is now.
    ctx.update(|settings| {
        settings.upsert_account(account);
        Ok(())
    })?;
    println!("{summary}");
    Ok(())
}
