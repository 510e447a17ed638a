pub mod ciphertext_store;

pub use ciphertext_store::CiphertextStore;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// Single SQLite database shared by the coprocessor and the ledger.
///
/// The connection sits behind an async mutex, so every ledger call runs
/// against it one at a time. Callers open a `rusqlite::Transaction` on the
/// locked connection to make a whole call atomic.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        tracing::debug!("Opened ledger database at {}", db_path.display());
        Ok(storage)
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Sealed ciphertexts, addressed by handle
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ciphertexts (
                handle BLOB PRIMARY KEY,
                fhe_type INTEGER NOT NULL,
                nonce BLOB NOT NULL,
                ciphertext BLOB NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Decryption grants
        conn.execute(
            "CREATE TABLE IF NOT EXISTS acl (
                handle BLOB NOT NULL,
                reader TEXT NOT NULL,
                granted_at INTEGER NOT NULL,
                PRIMARY KEY (handle, reader)
            )",
            [],
        )?;

        Ok(())
    }

    /// Create tables owned by a layer built on top of the core.
    pub async fn apply_schema(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
