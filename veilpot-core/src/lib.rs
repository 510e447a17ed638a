//! veilpot core - confidential values for the veilpot ledger
//!
//! This library provides typed ciphertext handles, a reference coprocessor
//! evaluating homomorphic operations over them, verified ingestion of
//! client-encrypted inputs and the decryption grant table, all persisted in
//! one SQLite database so ledger calls can commit them atomically.

pub mod error;
pub mod fhe;
pub mod storage;
pub mod types;

pub use error::{Result, VeilError};
pub use fhe::{
    Coprocessor, Ebool, Encrypted, EncryptedInput, EncryptedInputs, Euint32, Euint8, FheSession,
    FheType, Handle, InputProof,
};
pub use storage::Storage;
pub use types::{Address, Amount};
