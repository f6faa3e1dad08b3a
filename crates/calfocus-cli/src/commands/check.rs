use chrono::Utc;
use serde::Serialize;

use calfocus_core::{Decision, Transition};

use crate::context::{CliResult, Context};

#[derive(Serialize)]
struct CheckOutput<'a> {
    #[serde(flatten)]
    decision: &'a Decision,
    /// "on", "off", or absent when nothing changed
    #[serde(skip_serializing_if = "Option::is_none")]
    switched: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actuator_error: Option<&'a str>,
    dry_run: bool,
}

pub async fn run(ctx: &Context, dry_run: bool, json: bool) -> CliResult {
    let settings = ctx.load()?;
    let cycle = ctx.cycle(ctx.client_credentials(), &settings.config)?;
    let now = Utc::now();

    if dry_run {
        let decision = cycle.run_dry(now).await?;
        let output = CheckOutput {
            decision: &decision,
            switched: None,
            actuator_error: None,
            dry_run: true,
        };
        return print(&output, json);
    }

    let report = cycle.run(now).await?;
    let switched = match &report.transition {
        Transition::Unchanged => None,
        Transition::Changed { command, .. } => Some(command.to_string()),
    };
    let output = CheckOutput {
        decision: &report.decision,
        switched,
        actuator_error: report.actuator_error.as_deref(),
        dry_run: false,
    };
    print(&output, json)
}

fn print(output: &CheckOutput<'_>, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    let decision = output.decision;
    println!(
        "In meeting: {}",
        if decision.in_meeting { "yes" } else { "no" }
    );
    println!("Reason: {}", decision.reason);
    for skipped in &decision.skipped {
        println!("Skipped: {} ({})", skipped.email, skipped.reason);
    }
    if decision.timed_out {
        println!("Note: calendar provider timed out; remaining accounts were not checked");
    }
    match (&output.switched, output.dry_run) {
        (_, true) => println!("Focus: not changed (dry run)"),
        (Some(command), false) => println!("Focus: switched {command}"),
        (None, false) => println!("Focus: unchanged"),
    }
    if let Some(err) = output.actuator_error {
        println!("Actuator error: {err}");
    }
    Ok(())
}
