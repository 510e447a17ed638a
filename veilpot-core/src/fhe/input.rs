use super::coprocessor::Coprocessor;
use super::handle::{FheType, Handle};
use super::seal::{tags_match, SealKey};
use crate::error::{Result, VeilError};
use crate::storage::CiphertextStore;
use crate::types::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const PROOF_DOMAIN: &[u8] = b"veilpot/input-proof/v1";

/// Attestation that a batch of input ciphertexts was produced for one
/// (contract, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof {
    pub contract: Address,
    pub user: Address,
    pub handles: Vec<Handle>,
    pub tag: [u8; 32],
}

/// Result of [`EncryptedInput::encrypt`]: one handle per added value, in
/// insertion order, plus the proof covering all of them.
#[derive(Debug, Clone)]
pub struct EncryptedInputs {
    pub handles: Vec<Handle>,
    pub proof: InputProof,
}

/// Client-side builder for values headed to a ledger call.
///
/// ```ignore
/// let inputs = EncryptedInput::new(contract, alice)
///     .add8(4)
///     .add8(12)
///     .encrypt(&coprocessor)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    contract: Address,
    user: Address,
    values: Vec<(FheType, u32)>,
}

impl EncryptedInput {
    pub fn new(contract: Address, user: Address) -> Self {
        Self {
            contract,
            user,
            values: Vec::new(),
        }
    }

    pub fn add8(mut self, value: u8) -> Self {
        self.values.push((FheType::Uint8, value as u32));
        self
    }

    pub fn add32(mut self, value: u32) -> Self {
        self.values.push((FheType::Uint32, value));
        self
    }

    /// Seal every value, register the ciphertexts with the coprocessor and
    /// bind them to the target contract and user.
    ///
    /// Registered inputs carry no decryption grants until a ledger call
    /// ingests them.
    pub async fn encrypt(self, coprocessor: &Coprocessor) -> Result<EncryptedInputs> {
        if self.values.is_empty() {
            return Err(VeilError::proof("Encrypted input has no values"));
        }

        let key = coprocessor.key();
        let conn = coprocessor.storage().get_connection().await;
        let store = CiphertextStore::new(&conn);

        let mut handles = Vec::with_capacity(self.values.len());
        for (fhe_type, raw) in &self.values {
            let sealed = key.seal(*fhe_type, *raw)?;
            handles.push(store.insert(&sealed)?);
        }

        let tag = binding_tag(key, &self.contract, &self.user, &handles);
        tracing::debug!(
            "Registered {} encrypted input(s) for {} on {}",
            handles.len(),
            self.user,
            self.contract
        );

        Ok(EncryptedInputs {
            handles: handles.clone(),
            proof: InputProof {
                contract: self.contract,
                user: self.user,
                handles,
                tag,
            },
        })
    }
}

impl InputProof {
    /// Check that `handle` is covered by this proof and that the proof was
    /// issued for `caller` calling `contract`.
    pub(crate) fn verify(
        &self,
        key: &SealKey,
        handle: &Handle,
        caller: &Address,
        contract: &Address,
    ) -> Result<()> {
        if &self.contract != contract {
            return Err(VeilError::proof(format!(
                "proof is bound to contract {}, not {}",
                self.contract, contract
            )));
        }

        if &self.user != caller {
            return Err(VeilError::proof(format!(
                "proof is bound to user {}, not {}",
                self.user, caller
            )));
        }

        if !self.handles.contains(handle) {
            return Err(VeilError::proof(format!(
                "handle {} is not covered by the proof",
                handle.short()
            )));
        }

        let expected = binding_tag(key, &self.contract, &self.user, &self.handles);
        if !tags_match(&expected, &self.tag) {
            return Err(VeilError::proof("binding tag mismatch"));
        }

        Ok(())
    }
}

fn binding_tag(key: &SealKey, contract: &Address, user: &Address, handles: &[Handle]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.verifier());
    hasher.update(PROOF_DOMAIN);
    hasher.update(contract.as_bytes());
    hasher.update(user.as_bytes());
    hasher.update((handles.len() as u32).to_be_bytes());
    for handle in handles {
        hasher.update(handle.as_bytes());
    }

    let mut tag = [0u8; 32];
    tag.copy_from_slice(&hasher.finalize());
    tag
}
