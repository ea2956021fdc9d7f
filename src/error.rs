use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentinelError>;

/// Errors raised at the crate's outer surface (configuration, event replay).
///
/// The ingest/store/evaluator core never returns these: unavailable or
/// malformed telemetry degrades to absence instead.
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event on line {line}: {message}")]
    InvalidEvent { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SentinelError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
