//! Error handling for the ledger engine
//!
//! One error type covers every component. Transaction-level rejections get
//! their own variants because the commit loop matches on them to decide
//! whether to skip a transaction or abort the whole operation.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for all ledger engine operations
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Transaction field failed the numeric grammar (empty, zero, leading zero, non-digit)
    MalformedTransaction(String),
    /// Hash-chain proof did not reach the committed key
    AuthenticationError(String),
    /// Sender balance does not strictly exceed amount + gas
    InsufficientBalance { required: String, available: String },
    /// A wallet already spent in the current block batch
    DuplicateWalletInBatch(String),
    /// Expected file or stream missing this tick; retry next tick
    IoUnavailable(String),
    /// No shard directory has room left; fatal, operator must intervene
    CapacityExhausted,
    /// Account record lookups / updates
    Account(String),
    /// sled database errors
    Storage(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Relay line could not be parsed against the fixed grammar
    Parse(String),
    /// Configuration errors
    Config(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::MalformedTransaction(msg) => write!(f, "Malformed transaction: {msg}"),
            LedgerError::AuthenticationError(msg) => write!(f, "Authentication error: {msg}"),
            LedgerError::InsufficientBalance {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient balance: required {required}, available {available}"
                )
            }
            LedgerError::DuplicateWalletInBatch(wallet) => {
                write!(f, "Wallet {wallet} already spent in this block")
            }
            LedgerError::IoUnavailable(msg) => write!(f, "Input unavailable this tick: {msg}"),
            LedgerError::CapacityExhausted => {
                write!(f, "Archive capacity exhausted: no shard has room")
            }
            LedgerError::Account(msg) => write!(f, "Account error: {msg}"),
            LedgerError::Storage(msg) => write!(f, "Storage error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Parse(msg) => write!(f, "Parse error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl LedgerError {
    /// True for the per-transaction rejection kinds that the commit loop
    /// logs and skips without aborting the batch.
    pub fn is_transaction_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::MalformedTransaction(_)
                | LedgerError::AuthenticationError(_)
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::DuplicateWalletInBatch(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
