use thiserror::Error;

pub type Result<T> = std::result::Result<T, VeilError>;

#[derive(Error, Debug)]
pub enum VeilError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Input proof rejected: {0}")]
    Proof(String),

    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(String),

    #[error("Ciphertext type mismatch for {handle}: expected {expected}, found {found}")]
    TypeMismatch {
        handle: String,
        expected: String,
        found: String,
    },

    #[error("Decryption of {handle} not permitted for {reader}")]
    AccessDenied { handle: String, reader: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VeilError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn proof(msg: impl Into<String>) -> Self {
        Self::Proof(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_proof(&self) -> bool {
        matches!(self, Self::Proof(_))
    }
}
