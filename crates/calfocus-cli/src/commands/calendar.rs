use clap::Subcommand;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Include a calendar in meeting detection
    Enable {
        /// Account email
        email: String,
        /// Calendar ID
        calendar_id: String,
    },
    /// Exclude a calendar from meeting detection
    Disable {
        /// Account email
        email: String,
        /// Calendar ID
        calendar_id: String,
    },
    /// List an account's calendars
    List {
        /// Account email
        email: String,
    },
}

pub fn run(ctx: &Context, action: CalendarAction) -> CliResult {
    match action {
        CalendarAction::Enable { email, calendar_id } => toggle(ctx, &email, &calendar_id, true),
        CalendarAction::Disable { email, calendar_id } => {
            toggle(ctx, &email, &calendar_id, false)
        }
        CalendarAction::List { email } => {
            let settings = ctx.load()?;
            let account = settings
                .account(&email)
                .ok_or_else(|| format!("no such account: {email}"))?;
            for calendar in &account.calendars {
                println!(
                    "[{}] {}  {}",
                    if calendar.enabled { "x" } else { " " },
                    calendar.id,
                    calendar.display_name
                );
            }
            Ok(())
        }
    }
}

fn toggle(ctx: &Context, email: &str, calendar_id: &str, enabled: bool) -> CliResult {
    ctx.update(|settings| {
        if settings.set_calendar_enabled(email, calendar_id, enabled) {
            Ok(())
        } else {
            Err(format!("no calendar {calendar_id} for account {email}").into())
        }
    })?;
    println!(
        "{} {calendar_id}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
