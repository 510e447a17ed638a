use crate::error::{Result, VeilError};
use crate::fhe::{FheType, Handle, SealedValue};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub struct CiphertextStore<'a> {
    conn: &'a Connection,
}

impl<'a> CiphertextStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, sealed: &SealedValue) -> Result<Handle> {
        let handle = sealed.handle();

        self.conn.execute(
            "INSERT INTO ciphertexts (handle, fhe_type, nonce, ciphertext, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                handle,
                sealed.fhe_type.tag(),
                sealed.nonce,
                sealed.ciphertext,
                Utc::now().timestamp(),
            ],
        )?;

        Ok(handle)
    }

    pub fn load(&self, handle: &Handle) -> Result<SealedValue> {
        let row = self
            .conn
            .query_row(
                "SELECT fhe_type, nonce, ciphertext FROM ciphertexts WHERE handle = ?1",
                params![handle],
                |row| {
                    Ok((
                        row.get::<_, u8>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()?;

        let (tag, nonce, ciphertext) =
            row.ok_or_else(|| VeilError::UnknownHandle(handle.to_string()))?;

        Ok(SealedValue {
            fhe_type: FheType::from_tag(tag)?,
            nonce,
            ciphertext,
        })
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ciphertexts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
