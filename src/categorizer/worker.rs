//! Background categorizer worker.

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use super::service::Categorizer;

/// Polls the queue and drains it batch by batch.
pub struct CategorizerWorker {
    categorizer: Categorizer,
    batch_size: usize,
    poll_interval: Duration,
}

impl CategorizerWorker {
    /// Create a worker.
    pub fn new(categorizer: Categorizer, batch_size: usize, poll_interval_secs: u64) -> Self {
        Self {
            categorizer,
            batch_size: batch_size.max(1),
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
        }
    }

    /// Process batches until the queue yields nothing. Returns the number
    /// of messages received.
    pub async fn drain(&self) -> usize {
        let mut received = 0;
        loop {
            match self.categorizer.process_batch(self.batch_size).await {
                Ok(report) if report.received > 0 => {
                    received += report.received;
                    // Released messages are visible again at once.
                    if report.released > 0 {
                        break;
                    }
                }
                Ok(_) => break,
                Err(e) => {
                    error!("Categorizer batch failed: {}", e);
                    break;
                }
            }
        }
        received
    }

    /// Run forever.
    pub async fn run(&self) {
        info!(
            "Categorizer worker started (batch size: {}, poll interval: {} seconds)",
            self.batch_size,
            self.poll_interval.as_secs()
        );

        loop {
            self.drain().await;
            sleep(self.poll_interval).await;
        }
    }
}

/// Spawn the worker on the runtime.
pub fn start_categorizer_worker(worker: CategorizerWorker) -> JoinHandle<()> {
    tokio::spawn(async move { worker.run().await })
}
