use crate::error::{LotteryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use veilpot_core::Address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Address the ledger acts as when granting and checking decrypt rights
    pub contract_address: Address,
    /// SQLite file; `None` keeps the ledger in memory
    pub db_path: Option<PathBuf>,
    pub draw_range: DrawRange,
    pub coprocessor: CoprocessorConfig,
}

/// Inclusive range the drawn numbers are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CoprocessorConfig {
    pub passphrase: String,
    pub kdf_iterations: u32,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::from_bytes([0x5e; 20]),
            db_path: None,
            draw_range: DrawRange::default(),
            coprocessor: CoprocessorConfig {
                passphrase: "veilpot-dev-coprocessor".to_string(),
                kdf_iterations: 100_000,
            },
        }
    }
}

impl Default for DrawRange {
    fn default() -> Self {
        Self { min: 1, max: 20 }
    }
}

impl DrawRange {
    /// Number of values in the range.
    pub fn span(&self) -> u16 {
        self.max as u16 - self.min as u16 + 1
    }
}

impl std::fmt::Debug for CoprocessorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoprocessorConfig")
            .field("passphrase", &"<redacted>")
            .field("kdf_iterations", &self.kdf_iterations)
            .finish()
    }
}

impl LotteryConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            ..Self::default()
        }
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(db_path.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract_address == Address::ZERO {
            return Err(LotteryError::config("Contract address cannot be zero"));
        }

        if self.draw_range.min > self.draw_range.max {
            return Err(LotteryError::config(format!(
                "Draw range {}..={} is empty",
                self.draw_range.min, self.draw_range.max
            )));
        }

        // random_u8 takes the span as a u8 bound
        if self.draw_range.span() > u8::MAX as u16 {
            return Err(LotteryError::config("Draw range must span at most 255 values"));
        }

        if self.coprocessor.passphrase.is_empty() {
            return Err(LotteryError::config("Coprocessor passphrase cannot be empty"));
        }

        if self.coprocessor.kdf_iterations == 0 {
            return Err(LotteryError::config("KDF iterations must be greater than 0"));
        }

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LotteryConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
