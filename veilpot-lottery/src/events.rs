use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veilpot_core::{Address, Euint32, Euint8};

pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tx_id TEXT NOT NULL,
        player TEXT NOT NULL,
        kind TEXT NOT NULL,
        payload TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_player ON events(player, id);
";

/// Notification emitted by a successful ledger call. Payloads are handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    TicketPurchased {
        player: Address,
        first: Euint8,
        second: Euint8,
    },
    DrawCompleted {
        player: Address,
        random_first: Euint8,
        random_second: Euint8,
        reward: Euint32,
    },
}

impl LedgerEvent {
    pub fn player(&self) -> &Address {
        match self {
            LedgerEvent::TicketPurchased { player, .. } => player,
            LedgerEvent::DrawCompleted { player, .. } => player,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::TicketPurchased { .. } => "ticket_purchased",
            LedgerEvent::DrawCompleted { .. } => "draw_completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    /// Ledger call that emitted the event
    pub tx_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// Append-only notification log.
pub struct EventLog<'a> {
    conn: &'a Connection,
}

impl<'a> EventLog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn append(&self, tx_id: Uuid, event: &LedgerEvent) -> Result<i64> {
        let payload = serde_json::to_string(event)?;
        self.conn.execute(
            "INSERT INTO events (tx_id, player, kind, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tx_id.to_string(),
                event.player(),
                event.kind(),
                payload,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every event for `player`, oldest first.
    pub fn for_player(&self, player: &Address) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tx_id, payload, created_at FROM events
             WHERE player = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![player], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, tx_id, payload, created_at) = row?;
            let tx_id = Uuid::parse_str(&tx_id)
                .map_err(|e| crate::LotteryError::internal(format!("Bad tx id {}: {}", tx_id, e)))?;
            let timestamp = Utc
                .timestamp_opt(created_at, 0)
                .single()
                .ok_or_else(|| crate::LotteryError::internal("Bad event timestamp"))?;

            records.push(EventRecord {
                id,
                tx_id,
                timestamp,
                event: serde_json::from_str(&payload)?,
            });
        }

        Ok(records)
    }
}
