use crate::error::{Result, VeilError};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque 32-byte reference to a ciphertext held by the coprocessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle([u8; 32]);

impl Handle {
    /// The handle of a value that was never written. Reads as zero.
    pub const ZERO: Handle = Handle([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VeilError::internal(format!("handle must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.short())
    }
}

impl FromStr for Handle {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| VeilError::internal(format!("bad handle {}: {}", s, e)))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Handle {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(&self.0[..]))
    }
}

impl FromSql for Handle {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = value.as_blob()?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| FromSqlError::InvalidBlobSize {
            expected_size: 32,
            blob_size: bytes.len(),
        })?;
        Ok(Handle(bytes))
    }
}

/// Plaintext domain of a ciphertext.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FheType {
    Bool,
    Uint8,
    Uint32,
}

impl FheType {
    pub fn tag(&self) -> u8 {
        match self {
            FheType::Bool => 0,
            FheType::Uint8 => 2,
            FheType::Uint32 => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(FheType::Bool),
            2 => Ok(FheType::Uint8),
            4 => Ok(FheType::Uint32),
            other => Err(VeilError::internal(format!("unknown ciphertext type tag {}", other))),
        }
    }

    /// Bit mask applied to every plaintext of this type; arithmetic wraps within it.
    pub fn mask(&self) -> u32 {
        match self {
            FheType::Bool => 0x1,
            FheType::Uint8 => 0xff,
            FheType::Uint32 => u32::MAX,
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FheType::Bool => "ebool",
            FheType::Uint8 => "euint8",
            FheType::Uint32 => "euint32",
        };
        f.write_str(name)
    }
}

/// A typed ciphertext handle.
///
/// Implementors are thin wrappers over [`Handle`] that tie it to one
/// plaintext domain, so the homomorphic operations can be checked at
/// compile time instead of at the coprocessor.
pub trait Encrypted: Copy + fmt::Debug {
    const TYPE: FheType;
    type Clear: Copy + fmt::Debug + PartialEq;

    fn from_handle(handle: Handle) -> Self;
    fn handle(&self) -> Handle;

    fn clear_to_raw(value: Self::Clear) -> u32;
    fn clear_from_raw(raw: u32) -> Self::Clear;

    fn uninitialized() -> Self {
        Self::from_handle(Handle::ZERO)
    }

    fn is_initialized(&self) -> bool {
        !self.handle().is_zero()
    }
}

/// Encrypted boolean.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ebool(Handle);

/// Encrypted 8-bit unsigned integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Euint8(Handle);

/// Encrypted 32-bit unsigned integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Euint32(Handle);

impl Encrypted for Ebool {
    const TYPE: FheType = FheType::Bool;
    type Clear = bool;

    fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    fn handle(&self) -> Handle {
        self.0
    }

    fn clear_to_raw(value: bool) -> u32 {
        value as u32
    }

    fn clear_from_raw(raw: u32) -> bool {
        raw & 1 == 1
    }
}

impl Encrypted for Euint8 {
    const TYPE: FheType = FheType::Uint8;
    type Clear = u8;

    fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    fn handle(&self) -> Handle {
        self.0
    }

    fn clear_to_raw(value: u8) -> u32 {
        value as u32
    }

    fn clear_from_raw(raw: u32) -> u8 {
        (raw & 0xff) as u8
    }
}

impl Encrypted for Euint32 {
    const TYPE: FheType = FheType::Uint32;
    type Clear = u32;

    fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    fn handle(&self) -> Handle {
        self.0
    }

    fn clear_to_raw(value: u32) -> u32 {
        value
    }

    fn clear_from_raw(raw: u32) -> u32 {
        raw
    }
}

impl fmt::Debug for Ebool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ebool({})", self.0.short())
    }
}

impl fmt::Debug for Euint8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Euint8({})", self.0.short())
    }
}

impl fmt::Debug for Euint32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Euint32({})", self.0.short())
    }
}
