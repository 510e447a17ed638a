use crate::error::{Result, VeilError};
use rand::RngCore;
use rust_decimal::Decimal;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of decimals in one whole unit of the ledger's native currency.
pub const UNIT_DECIMALS: u32 = 18;

/// 20-byte account address, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| VeilError::InvalidAddress(format!("{}: {}", s, e)))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| VeilError::InvalidAddress(format!("{}: expected 20 bytes", s)))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Address {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Address {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: VeilError| FromSqlError::Other(Box::new(e)))
    }
}

/// Value attached to a ledger call.
///
/// Always held at a scale of [`UNIT_DECIMALS`], so the decimal's mantissa is
/// the amount in base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount::from_base_units(0);

    pub const fn from_base_units(units: u64) -> Self {
        Self(Decimal::from_parts(
            units as u32,
            (units >> 32) as u32,
            0,
            false,
            UNIT_DECIMALS,
        ))
    }

    pub fn base_units(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    /// Parse a decimal amount of whole units, e.g. `"0.01"`.
    pub fn parse_units(value: &str) -> Result<Self> {
        let parsed = Decimal::from_str(value.trim())
            .map_err(|e| VeilError::InvalidAmount(format!("'{}': {}", value, e)))?
            .normalize();

        if parsed.is_sign_negative() {
            return Err(VeilError::InvalidAmount(format!("'{}' is negative", value)));
        }
        if parsed.scale() > UNIT_DECIMALS {
            return Err(VeilError::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                value, UNIT_DECIMALS
            )));
        }

        Self::at_unit_scale(parsed)
            .ok_or_else(|| VeilError::InvalidAmount(format!("'{}' overflows", value)))
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).and_then(Self::at_unit_scale)
    }

    // rescale gives up precision instead of failing when the mantissa is full
    fn at_unit_scale(mut value: Decimal) -> Option<Self> {
        value.rescale(UNIT_DECIMALS);
        (value.scale() == UNIT_DECIMALS).then_some(Self(value))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::parse_units(&s).map_err(serde::de::Error::custom)
    }
}
