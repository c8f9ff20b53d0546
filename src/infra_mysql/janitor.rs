use super::token_store_mysql::delete_expired;
use chrono::{Local, NaiveDateTime};
use sqlx::MySqlPool;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Daily task deleting expired token rows. The first run happens one
/// second past the next local midnight, then every 24 hours.
pub struct Janitor {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Janitor {
    pub fn spawn(pool: MySqlPool, table: String) -> Self {
        let cancel = CancellationToken::new();
        let delay = delay_until_next_run(Local::now().naive_local());
        let handle = tokio::spawn(run(pool, table, delay, cancel.clone()));
        info!(?delay, "token janitor scheduled");

        Janitor {
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("token janitor stopped: {:?}", r);
        }
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Time from `now` until 00:00:01 of the following day.
pub fn delay_until_next_run(now: NaiveDateTime) -> Duration {
    now.date()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 1))
        .and_then(|next| (next - now).to_std().ok())
        .unwrap_or(DAY)
}

async fn run(pool: MySqlPool, table: String, delay: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + delay, DAY);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("token janitor shutting down...");
                break;
            }
            _ = ticker.tick() => {
                info!("token janitor running at {}", Local::now());
                match delete_expired(&pool, &table).await {
                    Ok(removed) => info!(removed, "token janitor removed expired rows"),
                    Err(e) => error!("token janitor error: {:#?}", e),
                }
            }
        }
    }
}
