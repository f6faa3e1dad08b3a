use tokio::io::BufReader;

use calfocus_core::focus::bridge;
use calfocus_core::FallbackActuator;

use crate::context::{CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let default_focus_name = ctx
        .load()
        .map(|s| s.config.focus_name)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot load settings, using default focus name");
            calfocus_core::Config::default().focus_name
        });
    let actuator = FallbackActuator::system_default();

    bridge::serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &actuator,
        &default_focus_name,
    )
    .await?;
    Ok(())
}
