use serde::Serialize;

use crate::context::{CliResult, Context};

#[derive(Serialize)]
struct AccountStatus<'a> {
    email: &'a str,
    signed_in: bool,
    enabled_calendars: Vec<&'a str>,
}

#[derive(Serialize)]
struct Status<'a> {
    focus_on: bool,
    last_reason: &'a str,
    focus_name: &'a str,
    accounts: Vec<AccountStatus<'a>>,
}

pub fn run(ctx: &Context, json: bool) -> CliResult {
    let settings = ctx.load()?;
    let status = Status {
        focus_on: settings.focus.is_on,
        last_reason: &settings.focus.last_reason,
        focus_name: &settings.config.focus_name,
        accounts: settings
            .accounts
            .iter()
            .map(|a| AccountStatus {
                email: &a.email,
                signed_in: a.credentials.is_some(),
                enabled_calendars: a
                    .calendars
                    .iter()
                    .filter(|c| c.enabled)
                    .map(|c| c.display_name.as_str())
                    .collect(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} Focus: {}",
        status.focus_name,
        if status.focus_on { "on" } else { "off" }
    );
    if !status.last_reason.is_empty() {
        println!("Last reason: {}", status.last_reason);
    }
    if status.accounts.is_empty() {
        println!("No accounts. Run `calfocus account add`.");
    }
    for account in &status.accounts {
        println!(
            "{}{}: {}",
            account.email,
            if account.signed_in { "" } else { " (signed out)" },
            if account.enabled_calendars.is_empty() {
                "no calendars enabled".to_string()
            } else {
                account.enabled_calendars.join(", ")
            }
        );
    }
    Ok(())
}
