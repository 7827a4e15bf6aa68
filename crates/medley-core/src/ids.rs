//! Fixed-width identifier and fingerprint newtypes for the Medley engine.
//!
//! `ID_t` is an opaque caller-supplied 48-bit entity identifier, `Hash_t` a
//! 64-bit fingerprint, `MatchingID_t` a 32-bit canonical cluster number
//! densely assigned by [`crate::cluster`]. Each type has a deterministic
//! little-endian fixed-width byte encoding so that
//! [`crate::store::IndexStore`] payloads are portable across builds.
#![allow(non_camel_case_types)]

use std::fmt;

/// Errors produced constructing an [`ID_t`] from a raw `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// The value does not fit in 48 bits.
    OutOfRange(u64),
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(v) => write!(f, "{v} does not fit in 48 bits"),
        }
    }
}

impl std::error::Error for IdError {}

/// The widest value an [`ID_t`] may hold: `2^48 - 1`.
pub const ID_T_MAX: u64 = (1u64 << 48) - 1;

/// Opaque 48-bit entity identifier.
///
/// Caller-supplied; the engine never inspects an id's value beyond equality
/// and ordering. Not required to be unique per input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ID_t(u64);

impl ID_t {
    /// Number of bytes in the fixed-width little-endian encoding.
    pub const BYTE_WIDTH: usize = 6;

    /// The zero id. Useful as a placeholder when a caller needs an `ID_t`
    /// that is never published (e.g. fingerprinting an example record that
    /// does not have a real id of its own).
    pub const ZERO: Self = Self(0);

    /// Builds an `ID_t`, rejecting values that do not fit in 48 bits.
    pub fn new(value: u64) -> Result<Self, IdError> {
        if value > ID_T_MAX {
            Err(IdError::OutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Returns the underlying `u64`.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Encodes as 6 little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; Self::BYTE_WIDTH] {
        let full = self.0.to_le_bytes();
        let mut out = [0u8; Self::BYTE_WIDTH];
        out.copy_from_slice(&full[..Self::BYTE_WIDTH]);
        out
    }

    /// Decodes from 6 little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; Self::BYTE_WIDTH]) -> Self {
        let mut full = [0u8; 8];
        full[..Self::BYTE_WIDTH].copy_from_slice(&bytes);
        Self(u64::from_le_bytes(full))
    }
}

impl fmt::Display for ID_t {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for ID_t {
    type Error = IdError;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ID_t> for u64 {
    fn from(id: ID_t) -> Self {
        id.0
    }
}

/// 64-bit fingerprint produced by hashing a record under a deletion pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash_t(u64);

impl Hash_t {
    /// Number of bytes in the fixed-width little-endian encoding.
    pub const BYTE_WIDTH: usize = 8;

    /// Wraps a raw `u64` fingerprint. All `u64` values are valid.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying `u64`.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Encodes as 8 little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; Self::BYTE_WIDTH] {
        self.0.to_le_bytes()
    }

    /// Decodes from 8 little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; Self::BYTE_WIDTH]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for Hash_t {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Hash_t {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Hash_t> for u64 {
    fn from(h: Hash_t) -> Self {
        h.0
    }
}

/// 32-bit canonical cluster identifier assigned by [`crate::cluster`].
/// Densely numbered starting at 1 within a build; deterministic given
/// identical input (same ids, same fingerprints), since assignment walks
/// ids in sorted order rather than arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchingID_t(u32);

impl MatchingID_t {
    /// Number of bytes in the fixed-width little-endian encoding.
    pub const BYTE_WIDTH: usize = 4;

    /// Wraps a raw `u32` matching id. All `u32` values are valid.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying `u32`.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Encodes as 4 little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; Self::BYTE_WIDTH] {
        self.0.to_le_bytes()
    }

    /// Decodes from 4 little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; Self::BYTE_WIDTH]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for MatchingID_t {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MatchingID_t {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<MatchingID_t> for u32 {
    fn from(m: MatchingID_t) -> Self {
        m.0
    }
}
