//! Confidential two-number lottery.
//!
//! Players buy a ticket holding two encrypted numbers, then draw against two
//! encrypted random numbers. Matching, reward selection and the points
//! balance are all computed over ciphertexts, and only the player (and the
//! ledger itself) may ask for the results to be decrypted.

pub mod config;
pub mod draw;
pub mod error;
pub mod events;
pub mod ledger;
pub mod points;
pub mod randomness;
pub mod ticket;

pub use config::{CoprocessorConfig, DrawRange, LotteryConfig};
pub use draw::{score_ticket, Draw, JACKPOT_REWARD, SINGLE_MATCH_REWARD};
pub use error::{ErrorKind, LotteryError, Result};
pub use events::{EventRecord, LedgerEvent};
pub use ledger::{CallContext, LotteryLedger, TICKET_PRICE};
pub use randomness::{CoprocessorRandomness, FixedRandomness, RandomnessSource};
pub use ticket::Ticket;

/// Open a ledger with the default development configuration, bound to
/// `contract_address` and kept in memory.
pub async fn open_ledger(contract_address: veilpot_core::Address) -> Result<LotteryLedger> {
    LotteryLedger::open(&LotteryConfig::new(contract_address)).await
}
