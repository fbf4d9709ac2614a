//! Background feed updater.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use super::service::FeedIngestor;

/// Periodically runs a [`FeedIngestor`].
pub struct FeedUpdater {
    ingestor: FeedIngestor,
    period: Duration,
}

impl FeedUpdater {
    /// Create an updater ticking every `interval_secs` seconds.
    pub fn new(ingestor: FeedIngestor, interval_secs: u64) -> Self {
        Self {
            ingestor,
            period: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run forever. The first pass starts immediately.
    pub async fn run(&self) {
        info!(
            "Feed updater started (interval: {} seconds)",
            self.period.as_secs()
        );

        let mut timer = interval(self.period);
        loop {
            timer.tick().await;
            if let Err(e) = self.ingestor.run_once().await {
                error!("Feed ingestion failed: {}", e);
            }
        }
    }
}

/// Spawn the updater on the runtime.
pub fn start_feed_updater(updater: FeedUpdater) -> JoinHandle<()> {
    tokio::spawn(async move { updater.run().await })
}
