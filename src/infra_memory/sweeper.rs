use super::TtlCache;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Handle to the periodic task evicting expired entries of a [`TtlCache`].
///
/// The task stops when [`Sweeper::stop`] is called, when the handle is
/// dropped, or when the cache itself is gone.
pub struct Sweeper {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Start sweeping every `period`, first run one period from now.
    /// Must be called within a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> Sweeper {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::downgrade(self), period, cancel.clone()));
        info!(?period, "ttl cache sweeper started");

        Sweeper {
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }
}

impl Sweeper {
    /// Cancel the task and wait for it. Safe to call more than once.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("ttl cache sweeper stopped: {:?}", r);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<V>(cache: Weak<TtlCache<V>>, period: Duration, cancel: CancellationToken)
where
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("ttl cache sweeper cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(cache) = cache.upgrade() else {
                    debug!("ttl cache dropped, sweeper exiting");
                    break;
                };
                // A failing run must not end the schedule.
                match tokio::task::spawn_blocking(move || cache.sweep()).await {
                    Ok(evicted) => debug!(evicted, "ttl cache sweep finished"),
                    Err(e) => error!("ttl cache sweep failed: {:#?}", e),
                }
            }
        }
    }
}
