//! Configuration-memory frames.
//!
//! The frame is the smallest addressable unit of 7-Series configuration
//! memory: 101 words of 32 bits, 3232 bits in total. Frames serialize to
//! 404 bytes of big-endian words on the wire.

use crate::error::BitstreamError;
use petri_common::{BitPosition, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of 32-bit words in one configuration frame.
pub const FRAME_WORDS: usize = 101;
/// Wire size of one configuration frame in bytes.
pub const FRAME_BYTES: usize = FRAME_WORDS * 4;

/// One frame of configuration memory.
///
/// Frames order by address first, so sorting a frame list yields the
/// device's programming order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Frame {
    addr: u32,
    words: Vec<Word>,
}

impl Frame {
    /// Creates an all-zero frame at the given address.
    pub fn new(addr: u32) -> Self {
        Self {
            addr,
            words: vec![Word::default(); FRAME_WORDS],
        }
    }

    /// Creates a frame from its 101 words.
    pub fn from_words(addr: u32, words: Vec<Word>) -> Result<Self, BitstreamError> {
        if words.len() != FRAME_WORDS {
            return Err(BitstreamError::BadFrameWordCount(words.len()));
        }
        Ok(Self { addr, words })
    }

    /// Reads a frame from its 404 wire bytes (big-endian words).
    pub fn from_bytes(addr: u32, bytes: &[u8]) -> Result<Self, BitstreamError> {
        if bytes.len() != FRAME_BYTES {
            return Err(BitstreamError::BadFrameByteCount(bytes.len()));
        }
        let words = bytes
            .chunks_exact(4)
            .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self { addr, words })
    }

    /// Creates a frame with the given bits set.
    ///
    /// # Panics
    ///
    /// Panics if a position's word or bit index is out of range.
    pub fn from_bit_list(addr: u32, bits: &[BitPosition]) -> Self {
        let mut frame = Self::new(addr);
        for &bit in bits {
            frame.set_position(bit, true);
        }
        frame
    }

    /// Returns the hardware frame address.
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Returns the frame's words.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Gets one bit by word and bit index.
    ///
    /// # Panics
    ///
    /// Panics if `word >= 101` or `bit >= 32`.
    pub fn get_bit(&self, word: u32, bit: u32) -> bool {
        self.words[word as usize].get(bit)
    }

    /// Sets one bit by word and bit index.
    ///
    /// # Panics
    ///
    /// Panics if `word >= 101` or `bit >= 32`.
    pub fn set_bit(&mut self, word: u32, bit: u32, value: bool) {
        self.words[word as usize].set(bit, value);
    }

    /// Sets the bit named by a position.
    ///
    /// # Panics
    ///
    /// Panics if the position addresses a different frame or is out of range.
    pub fn set_position(&mut self, pos: BitPosition, value: bool) {
        assert_eq!(
            pos.frame_addr, self.addr,
            "position {pos} does not belong to frame {:#010x}",
            self.addr
        );
        self.set_bit(pos.word, pos.bit, value);
    }

    /// Returns whether every bit of the frame is zero.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.is_zero())
    }

    /// Returns the positions of all true bits, word-major then bit-major.
    pub fn to_bit_list(&self) -> Vec<BitPosition> {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, word)| {
                word.set_bits()
                    .into_iter()
                    .map(move |bit| BitPosition::new(self.addr, word_idx as u32, bit))
            })
            .collect()
    }

    /// Serializes the frame to its 404 wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FRAME_BYTES);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Returns the address as a zero-padded `0x`-prefixed string.
    pub fn normalized_addr(&self) -> String {
        format!("0x{:08x}", self.addr)
    }

    /// Renders the frame as one line of the prjxray `.frm` format, as
    /// consumed by the `xc7patch` tool.
    pub fn to_frm_format(&self) -> String {
        let words: Vec<String> = self.words.iter().map(Word::to_string).collect();
        format!("{:#x} {}", self.addr, words.join(","))
    }

    /// Renders the frame in the `bitread` text format: a `.frame` header
    /// line followed by the words, six per line.
    pub fn to_text(&self) -> String {
        let mut out = format!(".frame {}\n", self.normalized_addr());
        for chunk in self.words.chunks(6) {
            let line: Vec<String> = chunk.iter().map(Word::to_string).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

/// Groups bit positions into frames, one per distinct frame address,
/// returned in ascending address order.
///
/// # Panics
///
/// Panics if a position's word or bit index is out of range.
pub fn frames_from_bits(bits: &[BitPosition]) -> Vec<Frame> {
    let mut grouped: BTreeMap<u32, Vec<BitPosition>> = BTreeMap::new();
    for &bit in bits {
        grouped.entry(bit.frame_addr).or_default().push(bit);
    }
    grouped
        .into_iter()
        .map(|(addr, bit_list)| Frame::from_bit_list(addr, &bit_list))
        .collect()
}
