//! Decryption grants.
//!
//! A side table mapping ciphertext handle to the addresses allowed to request
//! its decryption. Grants are written on the same connection (and so inside
//! the same transaction) as the ciphertext they cover.

use super::handle::Handle;
use crate::error::Result;
use crate::types::Address;
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct AclStore<'a> {
    conn: &'a Connection,
}

impl<'a> AclStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn allow(&self, handle: &Handle, reader: &Address) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO acl (handle, reader, granted_at) VALUES (?1, ?2, ?3)",
            params![handle, reader, Utc::now().timestamp()],
        )?;

        tracing::trace!("Granted {} read access to {}", reader, handle.short());
        Ok(())
    }

    pub fn is_allowed(&self, handle: &Handle, reader: &Address) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM acl WHERE handle = ?1 AND reader = ?2",
            params![handle, reader],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn readers(&self, handle: &Handle) -> Result<Vec<Address>> {
        let mut stmt = self
            .conn
            .prepare("SELECT reader FROM acl WHERE handle = ?1 ORDER BY reader")?;

        let reader_iter = stmt.query_map(params![handle], |row| row.get::<_, Address>(0))?;

        let mut readers = Vec::new();
        for reader in reader_iter {
            readers.push(reader?);
        }

        Ok(readers)
    }
}
