//! Error handling for the account-creation detector.
//!
//! Errors are reported per transaction. A caller scanning many transactions
//! records the failure for the offending item and keeps going; only
//! [`DetectorError::is_retryable`] errors are worth fetching again.

use thiserror::Error;
use std::fmt;

/// Main error type for the detector.
#[derive(Error, Debug)]
pub enum DetectorError {
    /// The instruction tree cannot be reconciled with its inner-instruction
    /// groups. The source data is corrupt or truncated; skip the transaction.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The transaction was fetched without execution results (balances,
    /// inner instructions). Refetch it with the right parameters.
    #[error("Missing transaction metadata: {0}")]
    MissingMetadata(String),

    /// Transport-level failure while resolving an account. An account that
    /// does not exist is not an error.
    #[error("Account lookup failed: {0}")]
    LookupFailure(String),

    /// The RPC payload could not be turned into a transaction model.
    #[error("Transaction parsing error: {0}")]
    TransactionParsing(String),

    /// Errors related to RPC communication other than account lookups.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DetectorError {
    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DetectorError::LookupFailure(_) | DetectorError::Rpc(_))
    }
}

/// Result type alias for the detector.
pub type DetectorResult<T> = Result<T, DetectorError>;

/// Context information for errors.
///
/// Describes where a foreign error surfaced: the component, the operation
/// being performed and, when known, the transaction signature.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Transaction signature being processed, if applicable.
    pub signature: Option<String>,

    /// Component where the error occurred (e.g., "rpc").
    pub component: String,

    /// Operation being performed when the error occurred (e.g., "get_transaction").
    pub operation: String,

    /// Additional context details.
    pub details: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} while {}", self.component, self.operation)?;
        if let Some(signature) = &self.signature {
            write!(f, " for transaction {}", signature)?;
        }
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for turning foreign errors into [`DetectorError`]s with context.
pub trait ErrorExt<T> {
    /// Wrap the error, classifying it by the component named in `context`.
    fn with_context(self, context: ErrorContext) -> DetectorResult<T>;
}

impl<T, E: std::error::Error + 'static> ErrorExt<T> for Result<T, E> {
    fn with_context(self, context: ErrorContext) -> DetectorResult<T> {
        self.map_err(|e| {
            let error_msg = format!("{}: {}", context, e);
            match context.component.as_str() {
                "lookup" => DetectorError::LookupFailure(error_msg),
                "rpc" => DetectorError::Rpc(error_msg),
                "config" => DetectorError::Config(error_msg),
                _ => DetectorError::TransactionParsing(error_msg),
            }
        })
    }
}
