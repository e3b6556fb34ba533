//! Background loops started once the gateway is ready.

use crate::{duels, tournament, Data};
use serenity::all::Http;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const TOURNAMENT_TICK: Duration = Duration::from_secs(60);

/// Spawn the tournament scheduler and the duel sweep.
pub fn spawn_all(http: Arc<Http>, data: Data) {
    let tournament_http = Arc::clone(&http);
    let tournament_data = data.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOURNAMENT_TICK);
        loop {
            interval.tick().await;
            if let Err(e) = tournament::lifecycle::tick(&tournament_http, &tournament_data).await {
                error!(error = %e, "Tournament scheduler tick failed");
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(duels::SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = duels::sweep(&http, &data).await {
                error!(error = %e, "Duel sweep failed");
            }
        }
    });

    info!("Background tasks started");
}
