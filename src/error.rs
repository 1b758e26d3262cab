use thiserror::Error;

/// Errors returned to callers of the sourcing engine.
///
/// Per-supplier failures never show up here; they are recorded as skipped
/// suppliers on the comparison result instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Why a single supplier could not produce a quote.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuoteError {
    #[error("product not carried")]
    NotCarried,

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("connector error: {0}")]
    Connector(String),

    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    #[error("chaos mode injected failure")]
    Injected,
}

pub type EngineResult<T> = Result<T, EngineError>;
