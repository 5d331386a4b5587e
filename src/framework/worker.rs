use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc::Sender;

use crate::error::Result;
use crate::monitor::JobMessage;
use crate::monitor::MonitorMessage;

/// Batch jobs reading committed snapshot data.
///
/// Jobs must be idempotent: running them twice for the same period
/// overwrites, never duplicates.
#[async_trait]
pub trait Job: Send {
    /// Run the job once, returning a short summary of the work done.
    async fn run_once(&mut self) -> Result<String>;
}

/// Drives a job at a fixed interval until ctrl-c.
pub struct JobWorker<J: Job> {
    id: &'static str,
    job: J,
    interval: Duration,
    monitor_tx: Sender<MonitorMessage>,
}

impl<J: Job> JobWorker<J> {
    /// Create a new JobWorker.
    ///
    /// * `id` - name of the worker
    /// * `job` - the job to run
    /// * `interval` - time between two runs, first run is immediate
    /// * `monitor_tx` - a monitor channel
    pub fn new(
        id: &'static str,
        job: J,
        interval: Duration,
        monitor_tx: Sender<MonitorMessage>,
    ) -> Self {
        Self {
            id,
            job,
            interval,
            monitor_tx,
        }
    }

    pub async fn start(&mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("[{}] got a ctrl-c message", self.id);
                    break;
                },
                _ = ticker.tick() => {
                    self.run().await;
                },
            }
        }
    }

    async fn run(&mut self) {
        tracing::debug!("[{}] running", self.id);
        let msg = match self.job.run_once().await {
            Ok(summary) => {
                tracing::info!("[{}] {}", self.id, summary);
                JobMessage::success(self.id, summary)
            }
            Err(err) => {
                tracing::error!("[{}] {}", self.id, err);
                JobMessage::failure(self.id, err.to_string())
            }
        };
        if self.monitor_tx.send(MonitorMessage::Job(msg)).await.is_err() {
            tracing::warn!("[{}] monitor is down", self.id);
        }
    }
}
