use super::acl::AclStore;
use super::handle::Handle;
use super::seal::SealKey;
use super::session::FheSession;
use crate::error::Result;
use crate::storage::Storage;
use crate::types::Address;
use rusqlite::Connection;
use std::sync::Arc;

/// Reference coprocessor: holds the key material and the ciphertext table.
///
/// Plaintext only exists inside its methods while an operation is being
/// evaluated. Callers see handles.
///
/// Every operation result is stored and granted to the calling contract,
/// intermediates included, and nothing is ever garbage collected: the
/// `ciphertexts` and `acl` tables only grow.
pub struct Coprocessor {
    key: SealKey,
    storage: Arc<Storage>,
}

impl Coprocessor {
    pub fn new(key: SealKey, storage: Arc<Storage>) -> Self {
        Self { key, storage }
    }

    pub fn from_passphrase(passphrase: &str, iterations: u32, storage: Arc<Storage>) -> Result<Self> {
        let key = SealKey::derive(passphrase, iterations)?;
        Ok(Self::new(key, storage))
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub(crate) fn key(&self) -> &SealKey {
        &self.key
    }

    /// Open a session evaluating on behalf of `contract` over `conn`.
    pub fn session<'a>(&'a self, conn: &'a Connection, contract: Address) -> FheSession<'a> {
        FheSession::new(&self.key, conn, contract)
    }

    pub async fn readers(&self, handle: &Handle) -> Result<Vec<Address>> {
        let conn = self.storage.get_connection().await;
        AclStore::new(&conn).readers(handle)
    }
}

impl std::fmt::Debug for Coprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coprocessor").finish_non_exhaustive()
    }
}
