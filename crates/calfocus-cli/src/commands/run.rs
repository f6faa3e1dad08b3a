use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use calfocus_core::notify::NotificationKey;
use calfocus_core::scheduler::{watch_activity, ACTIVITY_POLL_SECS};
use calfocus_core::Scheduler;

use crate::context::{CliResult, Context};

pub async fn run(ctx: &Context) -> CliResult {
    let settings = ctx.load()?;
    let config = settings.config;
    let client = ctx.client_credentials();
    let missing_setup = client.is_none();
    let cycle = Arc::new(ctx.cycle(client, &config)?);

    if missing_setup {
        cycle.alert(NotificationKey::MissingSetup, Utc::now()).await;
    }

    let scheduler = Scheduler::new(Arc::clone(&cycle), config.poll_interval());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = tokio::spawn(watch_activity(
        cycle.sensor(),
        config.idle_threshold(),
        Duration::from_secs(ACTIVITY_POLL_SECS),
        scheduler.triggers(),
        shutdown_rx.clone(),
    ));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
    watcher.await?;
    Ok(())
}
