//! User decryption.
//!
//! Stands in for the threshold user-decryption service: a plaintext is
//! released only when both the requesting user and the contract that owns
//! the ciphertext hold a grant on it.

use super::acl::AclStore;
use super::coprocessor::Coprocessor;
use super::handle::Encrypted;
use crate::error::{Result, VeilError};
use crate::storage::CiphertextStore;
use crate::types::Address;

impl Coprocessor {
    pub async fn user_decrypt<T: Encrypted>(
        &self,
        value: T,
        user: &Address,
        contract: &Address,
    ) -> Result<T::Clear> {
        let handle = value.handle();

        // Never written; nothing secret to protect
        if handle.is_zero() {
            return Ok(T::clear_from_raw(0));
        }

        let conn = self.storage().get_connection().await;
        let acl = AclStore::new(&conn);
        for reader in [user, contract] {
            if !acl.is_allowed(&handle, reader)? {
                tracing::warn!("Refused decryption of {} for {}", handle.short(), reader);
                return Err(VeilError::AccessDenied {
                    handle: handle.to_string(),
                    reader: reader.to_string(),
                });
            }
        }

        let sealed = CiphertextStore::new(&conn).load(&handle)?;
        if sealed.fhe_type != T::TYPE {
            return Err(VeilError::TypeMismatch {
                handle: handle.to_string(),
                expected: T::TYPE.to_string(),
                found: sealed.fhe_type.to_string(),
            });
        }

        let raw = self.key().open(&sealed)?;
        tracing::debug!("Released {} to {}", handle.short(), user);
        Ok(T::clear_from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::Euint32;
    use crate::storage::Storage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_uninitialized_decrypts_to_zero_for_anyone() {
        let storage = Arc::new(Storage::in_memory().await.unwrap());
        let cop = Coprocessor::from_passphrase("decrypt tests", 10, storage).unwrap();

        let points = Euint32::uninitialized();
        let clear = cop
            .user_decrypt(points, &Address::random(), &Address::random())
            .await
            .unwrap();
        assert_eq!(clear, 0);
    }
}
