use super::adapter::{FeedAdapter, MessageOutcome};
use crate::error::BotError;
use crate::strategy::{RsiStrategy, Strategy};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Counters for one run of the feed loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub messages: u64,
    pub candles: u64,
    pub skipped: u64,
    /// Closed candles refused by validation or ordering
    pub rejected: u64,
    /// Messages that failed to decode
    pub malformed: u64,
}

struct RunningFeed {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<FeedStats>,
}

/// Start/stop lifecycle around a feed adapter
///
/// The transport is somebody else's problem: whatever reads the socket
/// pushes raw messages into an `mpsc` channel and the runner drains it on a
/// tokio task. Starting twice or stopping twice is a no-op.
pub struct FeedRunner<S = RsiStrategy> {
    adapter: FeedAdapter<S>,
    running: Option<RunningFeed>,
}

impl<S: Strategy + 'static> FeedRunner<S> {
    pub fn new(adapter: FeedAdapter<S>) -> Self {
        Self {
            adapter,
            running: None,
        }
    }

    /// `true` between `start` and `stop` while the task is alive
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Spawn the feed loop on the current tokio runtime
    ///
    /// Returns `false` without touching `messages` when already running.
    pub fn start(&mut self, messages: mpsc::Receiver<String>) -> bool {
        if self.is_running() {
            tracing::warn!("Feed already running, ignoring start");
            return false;
        }

        let symbol = self.adapter.handle().symbol();
        tracing::info!(symbol = %symbol, "Starting feed");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_feed(self.adapter.clone(), messages, shutdown_rx));

        self.running = Some(RunningFeed {
            shutdown: shutdown_tx,
            task,
        });
        true
    }

    /// Signal shutdown and wait for the loop to exit
    ///
    /// Returns the run's counters, or `None` if nothing was running.
    pub async fn stop(&mut self) -> Option<FeedStats> {
        let running = self.running.take()?;
        // The loop may already have exited on its own
        let _ = running.shutdown.send(());
        let stats = join_feed(running.task).await;
        tracing::info!(?stats, "Feed stopped");
        Some(stats)
    }

    /// Wait for the loop to end because its input channel closed
    pub async fn join(&mut self) -> Option<FeedStats> {
        let running = self.running.take()?;
        let stats = join_feed(running.task).await;
        tracing::info!(?stats, "Feed finished");
        Some(stats)
    }
}

async fn join_feed(task: JoinHandle<FeedStats>) -> FeedStats {
    match task.await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(error = %e, "Feed task failed");
            FeedStats::default()
        }
    }
}

async fn run_feed<S: Strategy>(
    adapter: FeedAdapter<S>,
    mut messages: mpsc::Receiver<String>,
    mut shutdown: oneshot::Receiver<()>,
) -> FeedStats {
    let mut stats = FeedStats::default();

    loop {
        let text = tokio::select! {
            _ = &mut shutdown => break,
            msg = messages.recv() => match msg {
                Some(text) => text,
                None => {
                    tracing::debug!("Feed channel closed");
                    break;
                }
            },
        };

        stats.messages += 1;
        match adapter.handle_message(&text) {
            Ok(MessageOutcome::Ingested(_)) => stats.candles += 1,
            Ok(_) => stats.skipped += 1,
            Err(e @ (BotError::OutOfOrderCandle { .. } | BotError::InvalidCandle(_))) => {
                stats.rejected += 1;
                tracing::warn!(error = %e, "Rejected feed candle");
            }
            Err(e) => {
                stats.malformed += 1;
                tracing::warn!(error = %e, "Failed to decode feed message");
            }
        }
    }

    stats
}
