//! Absolute configuration-memory bit positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised when parsing a [`BitPosition`] from a bitread dump line.
#[derive(Debug, thiserror::Error)]
#[error("malformed bitread bit string: {0:?}")]
pub struct PositionParseError(pub String);

/// The position of a single bit in configuration memory.
///
/// A position names the 24-bit hardware frame address, the word within the
/// frame (0..=100) and the bit within the word (0..=31). Positions order by
/// frame address first, then word, then bit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BitPosition {
    /// Hardware frame address.
    pub frame_addr: u32,
    /// Word index within the frame.
    pub word: u32,
    /// Bit index within the word.
    pub bit: u32,
}

impl BitPosition {
    /// Creates a position from its three coordinates.
    pub fn new(frame_addr: u32, word: u32, bit: u32) -> Self {
        Self {
            frame_addr,
            word,
            bit,
        }
    }

    /// Parses a position from a prjxray `bitread` dump entry.
    ///
    /// Entries have the form `bit_<addr-hex>_<word>_<bit>`, e.g.
    /// `bit_0002000f_012_05`.
    pub fn from_bitread_str(s: &str) -> Result<Self, PositionParseError> {
        let err = || PositionParseError(s.to_string());
        let mut parts = s.split('_');
        if parts.next() != Some("bit") {
            return Err(err());
        }
        let frame_addr = parts
            .next()
            .and_then(|p| u32::from_str_radix(p, 16).ok())
            .ok_or_else(err)?;
        let word = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let bit = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self {
            frame_addr,
            word,
            bit,
        })
    }
}

impl fmt::Display for BitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit_{:08x}_{:03}_{:02}", self.frame_addr, self.word, self.bit)
    }
}
