/// Domain-specific error types for the simulation engine.
/// Every failure is fail-fast: the run aborts before any path is generated
/// and no partial result is ever published.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("insufficient data: need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("option chain unavailable: {0}")]
    OptionChainUnavailable(String),

    #[error("no suitable expiration: {0}")]
    NoSuitableExpiration(String),

    #[error("no contracts available: {0}")]
    NoContracts(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
