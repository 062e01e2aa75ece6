use anyhow::{Context, Result};
use clap::Parser;
use rsibot::backtest::{interval_ms, to_kline_message, MarketScenario, SignalReport, SyntheticDataGenerator};
use rsibot::{update_queue, BotConfig, FeedAdapter, FeedRunner, MarketUpdate, StrategyHandle};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

/// Stream closed candles through the RSI strategy and print its signals
#[derive(Debug, Parser)]
#[command(name = "rsibot", version)]
struct Args {
    /// Settings file (TOML or JSON); RSIBOT_* env vars override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Synthetic market to generate when no input file is given
    #[arg(long, value_enum, default_value_t = MarketScenario::OversoldRecovery)]
    scenario: MarketScenario,

    /// Number of synthetic candles
    #[arg(long, default_value_t = 120)]
    candles: usize,

    /// RNG seed for synthetic candles
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Synthetic candles loaded as history before streaming starts
    #[arg(long, default_value_t = 0)]
    warmup: usize,

    /// Replay kline stream messages from a file, one JSON event per line
    #[arg(long)]
    input: Option<PathBuf>,

    /// Consumer poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = BotConfig::load(args.config.as_deref()).context("Failed to load settings")?;
    setup_logging(&settings.log_filter);

    tracing::info!("🚀 rsibot starting");
    tracing::info!(
        symbol = %settings.symbol,
        timeframe = %settings.timeframe,
        rsi_period = settings.rsi_period,
        oversold = settings.rsi_oversold,
        overbought = settings.rsi_overbought,
        "Configuration"
    );

    let strategy = settings.build_strategy().context("Invalid strategy settings")?;
    let handle = StrategyHandle::new(strategy);

    let messages = match &args.input {
        Some(path) => read_messages(path).await?,
        None => synthetic_messages(&args, &settings, &handle)?,
    };
    tracing::info!(messages = messages.len(), "Feed prepared");

    let (updates_tx, mut updates_rx) = update_queue();
    let adapter = FeedAdapter::new(handle.clone(), updates_tx);

    // Stand-in for the socket reader: pushes raw messages into the runner
    let (feed_tx, feed_rx) = mpsc::channel(64);
    let mut runner = FeedRunner::new(adapter);
    runner.start(feed_rx);

    let producer = tokio::spawn(async move {
        for message in messages {
            if feed_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut report = SignalReport::default();
    let mut ticker = interval(Duration::from_millis(args.poll_ms.max(1)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                producer.abort();
                break;
            }
            _ = ticker.tick() => {
                while let Some(update) = updates_rx.try_recv() {
                    print_update(&update);
                    report.record(&update);
                }
                if producer.is_finished() && !runner.is_running() {
                    break;
                }
            }
        }
    }

    if let Some(stats) = runner.stop().await {
        report.rejected_candles = stats.rejected as usize;
        if stats.malformed > 0 {
            tracing::warn!(malformed = stats.malformed, "Feed messages could not be decoded");
        }
    }
    for update in updates_rx.drain() {
        print_update(&update);
        report.record(&update);
    }
    report.print_report();
    tracing::info!(
        in_position = handle.with(|s| s.in_position()),
        "👋 rsibot stopped"
    );
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn setup_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn read_messages(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Generate synthetic klines, loading the first `warmup` candles as history
fn synthetic_messages(
    args: &Args,
    settings: &BotConfig,
    handle: &StrategyHandle,
) -> Result<Vec<String>> {
    let step_ms = interval_ms(&settings.timeframe)
        .with_context(|| format!("Unsupported timeframe {:?}", settings.timeframe))?;

    let mut generator = SyntheticDataGenerator::new(args.seed);
    let candles = generator.generate(args.scenario, args.candles, step_ms)?;

    let warmup = args.warmup.min(candles.len());
    let (history, live) = candles.split_at(warmup);
    if !history.is_empty() {
        let series = handle.with(|s| s.load_history(history.to_vec()));
        let last_rsi = series.last().copied().flatten();
        tracing::info!(candles = history.len(), ?last_rsi, "History loaded");
    }

    Ok(live
        .iter()
        .map(|candle| to_kline_message(&settings.symbol, &settings.timeframe, step_ms, candle))
        .collect())
}

fn print_update(update: &MarketUpdate) {
    let rsi = update
        .rsi
        .map_or_else(|| "calculating...".to_string(), |r| format!("{:.2}", r));
    let marker = match update.signal {
        rsibot::Signal::Buy => "🟢",
        rsibot::Signal::Sell => "🔴",
        _ => "  ",
    };

    println!(
        "{} {} {} close={:.8} RSI={} signal={}",
        marker,
        update.timestamp,
        update.symbol,
        update.close,
        rsi,
        update.signal
    );
}
