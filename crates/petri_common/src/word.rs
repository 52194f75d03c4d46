//! A single 32-bit configuration-memory word.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Error raised when parsing a [`Word`] from its textual forms.
#[derive(Debug, thiserror::Error)]
pub enum WordParseError {
    /// The hex string did not have the expected 8-digit length.
    #[error("wrong length {0} for a word hex string, expected 8 digits")]
    WrongLength(usize),
    /// The string contained non-hexadecimal characters.
    #[error("invalid hex digits in word string: {0}")]
    InvalidDigits(String),
}

/// One 32-bit word of configuration memory.
///
/// Bit index 0 is the least significant bit. On the wire a word is carried
/// as four big-endian bytes; [`Word::to_be_bytes`] and [`Word::from_be_bytes`]
/// implement that codec.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Word(u32);

impl Word {
    /// Creates a word from its numeric value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this word.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Gets the bit at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= 32`.
    pub fn get(self, bit: u32) -> bool {
        assert!(bit < 32, "bit index {bit} out of range for a 32-bit word");
        self.0 >> bit & 1 != 0
    }

    /// Sets the bit at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= 32`.
    pub fn set(&mut self, bit: u32, value: bool) {
        assert!(bit < 32, "bit index {bit} out of range for a 32-bit word");
        if value {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }

    /// Returns whether every bit of this word is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns the indices of all bits that are set, in ascending order.
    pub fn set_bits(self) -> Vec<u32> {
        (0..32).filter(|&i| self.get(i)).collect()
    }

    /// Serializes this word as four big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Reads a word from four big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    /// Parses a word from an 8-digit hex string, with or without a `0x` prefix.
    pub fn from_hex_str(s: &str) -> Result<Self, WordParseError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 8 {
            return Err(WordParseError::WrongLength(digits.len()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| WordParseError::InvalidDigits(s.to_string()))
    }
}

impl fmt::Display for Word {
    /// Formats the word as 8 zero-padded lowercase hex digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Word {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl BitAnd for Word {
    type Output = Word;

    fn bitand(self, rhs: Word) -> Word {
        Word(self.0 & rhs.0)
    }
}

impl BitOr for Word {
    type Output = Word;

    fn bitor(self, rhs: Word) -> Word {
        Word(self.0 | rhs.0)
    }
}
