use rsibot::backtest::{to_kline_message, MarketScenario, SignalReport, SyntheticDataGenerator};
use rsibot::feed::FeedStats;
use rsibot::*;
use std::time::Duration;
use tokio::sync::mpsc;

const MINUTE_MS: i64 = 60_000;

fn settings() -> BotConfig {
    BotConfig::from_toml(
        r#"
        symbol = "PEPEUSDT"
        timeframe = "1m"
        buffer_capacity = 100
        "#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_feed_to_consumer_pipeline() {
    let _ = tracing_subscriber::fmt::try_init();

    let settings = settings();
    let handle = StrategyHandle::new(settings.build_strategy().unwrap());
    let (updates_tx, mut updates_rx) = update_queue();
    let mut runner = FeedRunner::new(FeedAdapter::new(handle.clone(), updates_tx));

    let (feed_tx, feed_rx) = mpsc::channel(16);
    assert!(runner.start(feed_rx));

    let mut gen = SyntheticDataGenerator::new(42);
    let candles = gen
        .generate(MarketScenario::OversoldRecovery, 90, MINUTE_MS)
        .unwrap();

    // Consumer polls while the feed is still producing
    assert!(updates_rx.try_get_latest().is_none());

    for candle in &candles {
        feed_tx
            .send(to_kline_message("PEPEUSDT", "1m", MINUTE_MS, candle))
            .await
            .unwrap();
    }
    drop(feed_tx);

    let stats = runner.join().await.unwrap();
    assert_eq!(
        stats,
        FeedStats {
            messages: 90,
            candles: 90,
            skipped: 0,
            rejected: 0,
            malformed: 0,
        }
    );

    let mut report = SignalReport::default();
    for update in updates_rx.drain() {
        report.record(&update);
    }

    assert_eq!(report.evaluations, 90);
    assert!(report.buys >= 1);
    assert!(report.sells >= 1);
    assert_eq!(report.ends_in_position(), handle.with(|s| s.in_position()));
    assert_eq!(handle.with(|s| s.candle_count()), 90);
}

#[tokio::test]
async fn test_consumer_sees_latest_update() {
    let handle = StrategyHandle::new(settings().build_strategy().unwrap());
    let (updates_tx, mut updates_rx) = update_queue();
    let adapter = FeedAdapter::new(handle, updates_tx);

    let producer = tokio::spawn(async move {
        for i in 0..20 {
            let close = 100.0 - i as f64;
            adapter
                .on_closed_candle(i * MINUTE_MS, close, close, close, close, 1.0)
                .unwrap();
        }
    });
    producer.await.unwrap();

    let latest = updates_rx.try_get_latest().unwrap();
    assert_eq!(latest.timestamp, 19 * MINUTE_MS);
    assert_eq!(latest.close, 81.0);
    assert_eq!(latest.rsi, Some(0.0));
    assert_eq!(latest.signal, Signal::Hold);
    assert!(updates_rx.try_recv().is_none());
}

#[tokio::test]
async fn test_stop_interrupts_idle_feed() {
    let handle = StrategyHandle::new(settings().build_strategy().unwrap());
    let (updates_tx, _updates_rx) = update_queue();
    let mut runner = FeedRunner::new(FeedAdapter::new(handle, updates_tx));

    // Sender kept alive: the loop only exits on stop
    let (_feed_tx, feed_rx) = mpsc::channel::<String>(1);
    runner.start(feed_rx);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(runner.is_running());

    let stats = tokio::time::timeout(Duration::from_secs(1), runner.stop())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats, FeedStats::default());
    assert!(!runner.is_running());
}

#[tokio::test]
async fn test_history_then_live_feed() {
    let handle = StrategyHandle::new(settings().build_strategy().unwrap());

    let history: Vec<Candle> = (0..30)
        .map(|i| {
            let close = 100.0 + (i % 3) as f64;
            Candle::new(i * MINUTE_MS, close, close, close, close, 1.0).unwrap()
        })
        .collect();
    let series = handle.with(|s| s.load_history(history));
    assert_eq!(series.len(), 30);
    assert!(series[29].is_some());

    let (updates_tx, mut updates_rx) = update_queue();
    let adapter = FeedAdapter::new(handle.clone(), updates_tx);

    // Replayed history candle is refused, the next one is accepted
    let stale = adapter.on_closed_candle(29 * MINUTE_MS, 1.0, 1.0, 1.0, 1.0, 1.0);
    assert!(matches!(stale, Err(BotError::OutOfOrderCandle { .. })));

    let update = adapter
        .on_closed_candle(30 * MINUTE_MS, 101.0, 101.0, 101.0, 101.0, 1.0)
        .unwrap()
        .unwrap();
    assert!(update.rsi.is_some());
    assert_eq!(updates_rx.try_recv(), Some(update));
}
