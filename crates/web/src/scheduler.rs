use std::time::Duration;

use chrono::Utc;
use storage::{Database, services::ProgressionEngine};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs the stage sweep on a fixed interval for the lifetime of the server.
pub fn spawn_sweeper(db: Database, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let today = Utc::now().date_naive();
            if let Err(e) = ProgressionEngine::new(db.pool()).sweep(today).await {
                tracing::error!(error = %e, "Scheduled sweep failed");
            }
        }
    })
}
