use crate::config::DrawRange;
use crate::draw::Draw;
use crate::{LotteryError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use veilpot_core::{Euint8, FheSession};

/// Supplies the encrypted pair for one draw.
///
/// Called exactly once per draw, inside the draw's transaction, so the
/// values cannot exist before the draw commits.
pub trait RandomnessSource: Send + Sync {
    fn draw_pair(&self, session: &FheSession<'_>) -> Result<Draw>;
}

/// Draws both numbers with the coprocessor's encrypted RNG.
#[derive(Debug, Clone, Copy)]
pub struct CoprocessorRandomness {
    range: DrawRange,
}

impl CoprocessorRandomness {
    pub fn new(range: DrawRange) -> Self {
        Self { range }
    }

    fn draw_one(&self, session: &FheSession<'_>) -> Result<Euint8> {
        let bound = u8::try_from(self.range.span())
            .map_err(|_| LotteryError::config("Draw range must span at most 255 values"))?;
        let offset = session.random_u8(bound)?;
        let min = session.trivial::<Euint8>(self.range.min)?;
        Ok(session.add(offset, min)?)
    }
}

impl Default for CoprocessorRandomness {
    fn default() -> Self {
        Self::new(DrawRange::default())
    }
}

impl RandomnessSource for CoprocessorRandomness {
    fn draw_pair(&self, session: &FheSession<'_>) -> Result<Draw> {
        Ok(Draw {
            first: self.draw_one(session)?,
            second: self.draw_one(session)?,
        })
    }
}

/// Replays a scripted sequence of pairs.
///
/// For tests and audits: the pairs are public, so never use it where the
/// outcome must stay secret.
#[derive(Debug, Default)]
pub struct FixedRandomness {
    pairs: Mutex<VecDeque<(u8, u8)>>,
}

impl FixedRandomness {
    pub fn new(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        Self {
            pairs: Mutex::new(pairs.into_iter().collect()),
        }
    }

    pub fn push(&self, first: u8, second: u8) {
        self.pairs.lock().push_back((first, second));
    }

    pub fn remaining(&self) -> usize {
        self.pairs.lock().len()
    }
}

impl RandomnessSource for FixedRandomness {
    fn draw_pair(&self, session: &FheSession<'_>) -> Result<Draw> {
        let (first, second) = self
            .pairs
            .lock()
            .pop_front()
            .ok_or_else(|| LotteryError::internal("Scripted randomness exhausted"))?;

        Ok(Draw {
            first: session.trivial(first)?,
            second: session.trivial(second)?,
        })
    }
}
