//! Draw scoring.
//!
//! The ticket is matched against the drawn pair entirely over ciphertexts.
//! Every comparison is evaluated regardless of earlier outcomes, and every
//! conditional is an oblivious select, so the sequence of operations is the
//! same for every ticket/draw combination.

use crate::ticket::Ticket;
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use veilpot_core::{Address, Ebool, Encrypted, Euint32, Euint8, FheSession, Handle};

pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS last_draws (
        owner TEXT PRIMARY KEY,
        first BLOB NOT NULL,
        second BLOB NOT NULL,
        drawn_at INTEGER NOT NULL
    );
";

/// Reward when both ticket numbers are matched.
pub const JACKPOT_REWARD: u32 = 100_000;
/// Reward when exactly one ticket number is matched.
pub const SINGLE_MATCH_REWARD: u32 = 1_000;

/// A drawn pair of encrypted numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub first: Euint8,
    pub second: Euint8,
}

/// Score `ticket` against `drawn` and return the encrypted reward.
///
/// Matching is one-to-one: each drawn slot can satisfy at most one ticket
/// number. The ticket's first number claims the first drawn slot it equals
/// (preferring slot one), and the second number may only match a slot left
/// unclaimed.
pub fn score_ticket(session: &FheSession<'_>, ticket: &Ticket, drawn: &Draw) -> Result<Euint32> {
    let first_hits_one = session.eq(ticket.first, drawn.first)?;
    let first_hits_two = session.eq(ticket.first, drawn.second)?;
    let match_first = session.or(first_hits_one, first_hits_two)?;

    // Slot left over once the first number has claimed one
    let leftover = session.select(first_hits_one, drawn.second, drawn.first)?;
    let second_vs_leftover = session.eq(ticket.second, leftover)?;
    let second_hits_one = session.eq(ticket.second, drawn.first)?;
    let second_hits_two = session.eq(ticket.second, drawn.second)?;
    let second_vs_either = session.or(second_hits_one, second_hits_two)?;
    let match_second: Ebool = session.select(match_first, second_vs_leftover, second_vs_either)?;

    let match_count = session.add(session.cast_u8(match_first)?, session.cast_u8(match_second)?)?;

    let two = session.trivial::<Euint8>(2)?;
    let one = session.trivial::<Euint8>(1)?;
    let is_jackpot = session.eq(match_count, two)?;
    let is_single = session.eq(match_count, one)?;

    let jackpot = session.trivial::<Euint32>(JACKPOT_REWARD)?;
    let single = session.trivial::<Euint32>(SINGLE_MATCH_REWARD)?;
    let nothing = session.trivial::<Euint32>(0)?;

    let reward = session.select(is_single, single, nothing)?;
    let reward = session.select(is_jackpot, jackpot, reward)?;
    Ok(reward)
}

/// Most recent drawn pair per player.
pub struct DrawStore<'a> {
    conn: &'a Connection,
}

impl<'a> DrawStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, owner: &Address) -> Result<Option<Draw>> {
        let row: Option<(Handle, Handle)> = self
            .conn
            .query_row(
                "SELECT first, second FROM last_draws WHERE owner = ?1",
                params![owner],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(first, second)| Draw {
            first: Euint8::from_handle(first),
            second: Euint8::from_handle(second),
        }))
    }

    pub fn put(&self, owner: &Address, draw: &Draw) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO last_draws (owner, first, second, drawn_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                owner,
                draw.first.handle(),
                draw.second.handle(),
                chrono::Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }
}
