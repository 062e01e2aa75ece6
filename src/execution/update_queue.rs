use crate::models::MarketUpdate;
use tokio::sync::mpsc;

/// Create the hand-off queue between the feed side and consumers
///
/// Unbounded FIFO: publishing never blocks the feed callback, and the
/// consumer side only ever polls.
pub fn update_queue() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// Producer half, cloned into every feed task
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::UnboundedSender<MarketUpdate>,
}

impl UpdateSender {
    /// Queue an update. Returns `false` once the receiver is gone.
    pub fn publish(&self, update: MarketUpdate) -> bool {
        match self.tx.send(update) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Update receiver dropped, discarding update");
                false
            }
        }
    }
}

/// Consumer half, polled from the UI or reporting loop
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::UnboundedReceiver<MarketUpdate>,
}

impl UpdateReceiver {
    /// Next queued update in FIFO order, `None` immediately if empty
    pub fn try_recv(&mut self) -> Option<MarketUpdate> {
        self.rx.try_recv().ok()
    }

    /// Drain the queue and keep only the newest update
    pub fn try_get_latest(&mut self) -> Option<MarketUpdate> {
        let mut latest = None;
        while let Some(update) = self.try_recv() {
            latest = Some(update);
        }
        latest
    }

    /// Everything queued so far, oldest first
    pub fn drain(&mut self) -> Vec<MarketUpdate> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Wait for the next update; `None` when every sender is dropped
    pub async fn recv(&mut self) -> Option<MarketUpdate> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, Signal};

    fn update(open_time: i64, close: f64) -> MarketUpdate {
        let candle = Candle::new(open_time, close, close, close, close, 1.0).unwrap();
        MarketUpdate::new("PEPEUSDT", &candle, None, Signal::NoSignal)
    }

    #[test]
    fn test_empty_queue_returns_none() {
        let (_tx, mut rx) = update_queue();
        assert!(rx.try_recv().is_none());
        assert!(rx.try_get_latest().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = update_queue();
        assert!(tx.publish(update(1, 1.0)));
        assert!(tx.publish(update(2, 2.0)));

        assert_eq!(rx.try_recv().unwrap().timestamp, 1);
        assert_eq!(rx.try_recv().unwrap().timestamp, 2);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_latest_drains_queue() {
        let (tx, mut rx) = update_queue();
        for i in 0..5 {
            tx.publish(update(i, 1.0 + i as f64));
        }

        assert_eq!(rx.try_get_latest().unwrap().timestamp, 4);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (tx, rx) = update_queue();
        drop(rx);
        assert!(!tx.publish(update(1, 1.0)));
    }

    #[test]
    fn test_drain_and_async_recv() {
        let (tx, mut rx) = update_queue();
        tx.publish(update(1, 1.0));
        tx.publish(update(2, 2.0));
        assert_eq!(rx.drain().len(), 2);

        tx.publish(update(3, 3.0));
        drop(tx);
        let received = tokio_test::block_on(rx.recv());
        assert_eq!(received.unwrap().timestamp, 3);
        assert!(tokio_test::block_on(rx.recv()).is_none());
    }
}
