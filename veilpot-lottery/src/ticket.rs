use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use veilpot_core::{Address, Encrypted, Euint8};

pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tickets (
        owner TEXT PRIMARY KEY,
        first BLOB NOT NULL,
        second BLOB NOT NULL,
        active INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

/// A player's two encrypted numbers. One record per address, overwritten by
/// each purchase and deactivated (never deleted) by a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub owner: Address,
    pub first: Euint8,
    pub second: Euint8,
    pub active: bool,
}

impl Ticket {
    /// What an address that never bought a ticket reads back.
    pub fn empty(owner: Address) -> Self {
        Self {
            owner,
            first: Euint8::uninitialized(),
            second: Euint8::uninitialized(),
            active: false,
        }
    }
}

pub struct TicketStore<'a> {
    conn: &'a Connection,
}

impl<'a> TicketStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, owner: &Address) -> Result<Option<Ticket>> {
        let ticket = self
            .conn
            .query_row(
                "SELECT first, second, active FROM tickets WHERE owner = ?1",
                params![owner],
                |row| {
                    Ok(Ticket {
                        owner: *owner,
                        first: Euint8::from_handle(row.get(0)?),
                        second: Euint8::from_handle(row.get(1)?),
                        active: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(ticket)
    }

    pub fn put(&self, ticket: &Ticket) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tickets (owner, first, second, active, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                ticket.owner,
                ticket.first.handle(),
                ticket.second.handle(),
                ticket.active,
                chrono::Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }

    pub fn deactivate(&self, owner: &Address) -> Result<()> {
        self.conn.execute(
            "UPDATE tickets SET active = 0, updated_at = ?2 WHERE owner = ?1",
            params![owner, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}
