use thiserror::Error;
use veilpot_core::{Address, Amount, VeilError};

pub type Result<T> = std::result::Result<T, LotteryError>;

#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Invalid payment: expected {expected}, got {got}")]
    InvalidPayment { expected: Amount, got: Amount },

    #[error("Ticket already active for {0}")]
    TicketAlreadyActive(Address),

    #[error("No active ticket for {0}")]
    NoActiveTicket(Address),

    #[error("Input proof rejected: {0}")]
    InvalidProof(String),

    #[error(transparent)]
    Core(VeilError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a rejected ledger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong value attached to the call
    Payment,
    /// Missing or already-active ticket
    State,
    /// Externally supplied ciphertext failed binding verification
    Proof,
    Internal,
}

impl LotteryError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotteryError::InvalidPayment { .. } => ErrorKind::Payment,
            LotteryError::TicketAlreadyActive(_) | LotteryError::NoActiveTicket(_) => {
                ErrorKind::State
            }
            LotteryError::InvalidProof(_) => ErrorKind::Proof,
            _ => ErrorKind::Internal,
        }
    }
}

impl From<VeilError> for LotteryError {
    fn from(err: VeilError) -> Self {
        match err {
            VeilError::Proof(msg) => LotteryError::InvalidProof(msg),
            VeilError::Config(msg) => LotteryError::Config(msg),
            other => LotteryError::Core(other),
        }
    }
}
