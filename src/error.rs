use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Out-of-order candle: open time {received} is not after last stored {last}")]
    OutOfOrderCandle { last: i64, received: i64 },

    #[error("Invalid candle: {0}")]
    InvalidCandle(String),

    #[error("Malformed feed message: {0}")]
    MalformedMessage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = BotError> = std::result::Result<T, E>;
