use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use veilpot_core::{Address, Encrypted, Euint32, Handle};

pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS points (
        owner TEXT PRIMARY KEY,
        balance BLOB NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

/// Encrypted per-player points, replaced by `balance + reward` on each draw.
///
/// The sum is an encrypted `euint32` add, which wraps modulo 2^32 like every
/// other integer op on the coprocessor. A balance only decreases if it passes
/// `u32::MAX`, which takes over 42,000 jackpots.
pub struct PointsStore<'a> {
    conn: &'a Connection,
}

impl<'a> PointsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stored balance, or the uninitialized handle if the player never drew.
    pub fn get(&self, owner: &Address) -> Result<Euint32> {
        let balance: Option<Handle> = self
            .conn
            .query_row(
                "SELECT balance FROM points WHERE owner = ?1",
                params![owner],
                |row| row.get(0),
            )
            .optional()?;

        Ok(balance.map_or_else(Euint32::uninitialized, Euint32::from_handle))
    }

    pub fn put(&self, owner: &Address, balance: Euint32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO points (owner, balance, updated_at) VALUES (?1, ?2, ?3)",
            params![owner, balance.handle(), chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}
