//! Confidential values.
//!
//! Typed ciphertext handles, the homomorphic operations the ledger needs,
//! verified ingestion of client inputs and the decryption grant table.

pub mod acl;
pub mod coprocessor;
pub mod decrypt;
pub mod handle;
pub mod input;
pub mod seal;
pub mod session;

pub use acl::AclStore;
pub use coprocessor::Coprocessor;
pub use handle::{Ebool, Encrypted, Euint32, Euint8, FheType, Handle};
pub use input::{EncryptedInput, EncryptedInputs, InputProof};
pub use seal::{SealKey, SealedValue};
pub use session::FheSession;
