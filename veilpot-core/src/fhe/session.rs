//! Homomorphic operations over typed handles.
//!
//! A session borrows a connection, usually an open transaction, so every
//! ciphertext and grant it writes commits or rolls back together with the
//! caller's own records. Each result ciphertext is granted to the session's
//! contract as it is written.

use super::acl::AclStore;
use super::handle::{Ebool, Encrypted, Euint8, Handle};
use super::input::InputProof;
use super::seal::SealKey;
use crate::error::{Result, VeilError};
use crate::storage::CiphertextStore;
use crate::types::Address;
use rand::Rng;
use rusqlite::Connection;

pub struct FheSession<'a> {
    key: &'a SealKey,
    conn: &'a Connection,
    contract: Address,
}

impl<'a> FheSession<'a> {
    pub(crate) fn new(key: &'a SealKey, conn: &'a Connection, contract: Address) -> Self {
        Self {
            key,
            conn,
            contract,
        }
    }

    /// Encrypt a public constant.
    pub fn trivial<T: Encrypted>(&self, value: T::Clear) -> Result<T> {
        self.write(T::clear_to_raw(value))
    }

    pub fn eq<T: Encrypted>(&self, a: T, b: T) -> Result<Ebool> {
        let diff = self.read(a)? ^ self.read(b)?;
        // 1 when diff == 0, without comparing
        let is_zero = ((diff | diff.wrapping_neg()) >> 31) ^ 1;
        self.write(is_zero)
    }

    /// Oblivious select: both arms are read, the result is picked by mask.
    pub fn select<T: Encrypted>(&self, cond: Ebool, a: T, b: T) -> Result<T> {
        let mask = 0u32.wrapping_sub(self.read(cond)? & 1);
        let (a, b) = (self.read(a)?, self.read(b)?);
        self.write((a & mask) | (b & !mask))
    }

    /// Wrapping addition within the type's width.
    pub fn add<T: Encrypted>(&self, a: T, b: T) -> Result<T> {
        let sum = self.read(a)?.wrapping_add(self.read(b)?);
        self.write(sum)
    }

    pub fn and(&self, a: Ebool, b: Ebool) -> Result<Ebool> {
        let out = self.read(a)? & self.read(b)?;
        self.write(out)
    }

    pub fn or(&self, a: Ebool, b: Ebool) -> Result<Ebool> {
        let out = self.read(a)? | self.read(b)?;
        self.write(out)
    }

    pub fn not(&self, a: Ebool) -> Result<Ebool> {
        let out = self.read(a)? ^ 1;
        self.write(out)
    }

    /// 0 or 1 as an encrypted byte.
    pub fn cast_u8(&self, a: Ebool) -> Result<Euint8> {
        let raw = self.read(a)? & 1;
        self.write(raw)
    }

    /// Fresh encrypted value drawn uniformly from `0..bound`.
    pub fn random_u8(&self, bound: u8) -> Result<Euint8> {
        if bound == 0 {
            return Err(VeilError::internal("random bound must be greater than 0"));
        }
        let raw = rand::thread_rng().gen_range(0..bound);
        self.write(raw as u32)
    }

    /// Ingest a ciphertext supplied by `caller`, checking its input proof.
    pub fn from_external<T: Encrypted>(
        &self,
        handle: Handle,
        proof: &InputProof,
        caller: &Address,
    ) -> Result<T> {
        proof.verify(self.key, &handle, caller, &self.contract)?;

        let sealed = CiphertextStore::new(self.conn)
            .load(&handle)
            .map_err(|e| match e {
                VeilError::UnknownHandle(h) => {
                    VeilError::proof(format!("input {} was never registered", h))
                }
                other => other,
            })?;

        if sealed.fhe_type != T::TYPE {
            return Err(VeilError::proof(format!(
                "input {} is {}, expected {}",
                handle.short(),
                sealed.fhe_type,
                T::TYPE
            )));
        }

        AclStore::new(self.conn).allow(&handle, &self.contract)?;
        Ok(T::from_handle(handle))
    }

    /// Grant `reader` the right to request decryption of `value`.
    pub fn allow<T: Encrypted>(&self, value: T, reader: &Address) -> Result<()> {
        if !value.is_initialized() {
            return Ok(());
        }
        AclStore::new(self.conn).allow(&value.handle(), reader)
    }

    fn read<T: Encrypted>(&self, value: T) -> Result<u32> {
        let handle = value.handle();
        if handle.is_zero() {
            return Ok(0);
        }

        let sealed = CiphertextStore::new(self.conn).load(&handle)?;
        if sealed.fhe_type != T::TYPE {
            return Err(VeilError::TypeMismatch {
                handle: handle.to_string(),
                expected: T::TYPE.to_string(),
                found: sealed.fhe_type.to_string(),
            });
        }

        self.key.open(&sealed)
    }

    fn write<T: Encrypted>(&self, raw: u32) -> Result<T> {
        let sealed = self.key.seal(T::TYPE, raw)?;
        let handle = CiphertextStore::new(self.conn).insert(&sealed)?;
        AclStore::new(self.conn).allow(&handle, &self.contract)?;
        Ok(T::from_handle(handle))
    }
}
