//! Configuration word and packet codec.
//!
//! A 7-Series configuration stream is a flat sequence of big-endian 32-bit
//! words. Each packet starts with one [`ConfigWord`] header that names a
//! packet type, an op code, the payload word count and (for Type 1 packets)
//! the target configuration register; the payload words follow immediately.
//!
//! ```text
//! Type 1: [31:29]=001 [28:27]=op [17:13]=register [10:0]=count
//! Type 2: [31:29]=010 [28:27]=op [26:0]=count
//! ```
//!
//! Type 2 packets carry no register: they extend the word count of the
//! preceding Type 1 write (in practice always FDRI frame data).

use crate::error::BitstreamError;
use petri_common::Word;

/// Packet type of a configuration word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Short-header packet with an 11-bit word count and a register field.
    Type1 = 1,
    /// Long-header packet with a 27-bit word count and no register field.
    Type2 = 2,
}

impl PacketType {
    fn from_code(code: u32) -> Result<Self, BitstreamError> {
        match code {
            1 => Ok(PacketType::Type1),
            2 => Ok(PacketType::Type2),
            _ => Err(BitstreamError::UnknownPacketType(code)),
        }
    }
}

/// Op code of a configuration word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// No operation; the word is padding.
    Nop = 0,
    /// Read from the named register.
    Read = 1,
    /// Write the payload to the named register.
    Write = 2,
}

impl OpCode {
    fn from_code(code: u32) -> Result<Self, BitstreamError> {
        match code {
            0 => Ok(OpCode::Nop),
            1 => Ok(OpCode::Read),
            2 => Ok(OpCode::Write),
            _ => Err(BitstreamError::UnknownOpCode(code)),
        }
    }
}

/// The named 7-Series configuration registers.
///
/// Codes not listed here are reserved or undocumented; decoding one is an
/// error rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// CRC check value.
    Crc = 0,
    /// Frame Address Register.
    Far = 1,
    /// Frame Data Register, Input.
    Fdri = 2,
    /// Frame Data Register, Output (readback).
    Fdro = 3,
    /// Command register.
    Cmd = 4,
    /// Control register 0.
    Ctl0 = 5,
    /// Masking register for CTL0/CTL1 writes.
    Mask = 6,
    /// Status register.
    Stat = 7,
    /// Legacy output register (daisy chain).
    Lout = 8,
    /// Configuration option register 0.
    Cor0 = 9,
    /// Multi-Frame Write register.
    Mfwr = 10,
    /// Initial CBC value register (encryption).
    Cbc = 11,
    /// Device ID register.
    Idcode = 12,
    /// User access register.
    Axss = 13,
    /// Configuration option register 1.
    Cor1 = 14,
    /// Warm boot start address register.
    Wbstar = 16,
    /// Watchdog timer register.
    Timer = 17,
    /// Software-readable readback CRC register.
    RbcrcSw = 19,
    /// Boot history status register.
    Bootsts = 20,
    /// Control register 1.
    Ctl1 = 24,
    /// BPI/SPI configuration options register.
    Bspi = 31,
}

impl Register {
    /// Returns the register's address code.
    pub fn code(self) -> u32 {
        self as u32
    }

    fn from_code(code: u32) -> Result<Self, BitstreamError> {
        Ok(match code {
            0 => Register::Crc,
            1 => Register::Far,
            2 => Register::Fdri,
            3 => Register::Fdro,
            4 => Register::Cmd,
            5 => Register::Ctl0,
            6 => Register::Mask,
            7 => Register::Stat,
            8 => Register::Lout,
            9 => Register::Cor0,
            10 => Register::Mfwr,
            11 => Register::Cbc,
            12 => Register::Idcode,
            13 => Register::Axss,
            14 => Register::Cor1,
            16 => Register::Wbstar,
            17 => Register::Timer,
            19 => Register::RbcrcSw,
            20 => Register::Bootsts,
            24 => Register::Ctl1,
            31 => Register::Bspi,
            _ => return Err(BitstreamError::UnknownRegister(code)),
        })
    }
}

/// First word count that no longer fits a Type 1 header.
pub const TYPE1_COUNT_LIMIT: u32 = 1 << 11;
/// First word count that no longer fits a Type 2 header.
pub const TYPE2_COUNT_LIMIT: u32 = 1 << 27;

/// Decode mask of the Type 1 count field.
const TYPE1_COUNT_MASK: u32 = 0xfff;
/// Decode mask of the Type 2 count field.
const TYPE2_COUNT_MASK: u32 = 0xfff_ffff;
/// Shift of the packet type field.
const PACKET_TYPE_SHIFT: u32 = 29;
/// Shift of the op code field.
const OP_CODE_SHIFT: u32 = 27;
/// Shift of the Type 1 register field.
const REGISTER_SHIFT: u32 = 13;
/// Mask of the Type 1 register field (5 bits).
const REGISTER_MASK: u32 = 0x1f;

/// The header word of a configuration packet.
///
/// Construction validates the packet-type/register pairing and the count
/// field width, so every existing `ConfigWord` encodes cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigWord {
    packet_type: PacketType,
    op_code: OpCode,
    count: u32,
    register: Option<Register>,
}

impl ConfigWord {
    /// Creates a Type 1 word targeting a register.
    pub fn type1(op_code: OpCode, register: Register, count: u32) -> Result<Self, BitstreamError> {
        if count >= TYPE1_COUNT_LIMIT {
            return Err(BitstreamError::CountTooLarge {
                packet_type: PacketType::Type1,
                count,
                limit: TYPE1_COUNT_LIMIT,
            });
        }
        Ok(Self {
            packet_type: PacketType::Type1,
            op_code,
            count,
            register: Some(register),
        })
    }

    /// Creates a Type 2 word; Type 2 packets carry no register.
    pub fn type2(op_code: OpCode, count: u32) -> Result<Self, BitstreamError> {
        if count >= TYPE2_COUNT_LIMIT {
            return Err(BitstreamError::CountTooLarge {
                packet_type: PacketType::Type2,
                count,
                limit: TYPE2_COUNT_LIMIT,
            });
        }
        Ok(Self {
            packet_type: PacketType::Type2,
            op_code,
            count,
            register: None,
        })
    }

    /// Returns the canonical NOP word (`0x2000_0000`).
    pub fn nop() -> Self {
        Self {
            packet_type: PacketType::Type1,
            op_code: OpCode::Nop,
            count: 0,
            register: Some(Register::Crc),
        }
    }

    /// Returns the packet type.
    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Returns the op code.
    pub fn op_code(&self) -> OpCode {
        self.op_code
    }

    /// Returns the payload word count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the target register; `None` for Type 2 words.
    pub fn register(&self) -> Option<Register> {
        self.register
    }

    /// Decodes a word from its 4 big-endian wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BitstreamError> {
        let word: [u8; 4] = bytes
            .try_into()
            .map_err(|_| BitstreamError::TruncatedWord(bytes.len()))?;
        let word = u32::from_be_bytes(word);

        let packet_type = PacketType::from_code(word >> PACKET_TYPE_SHIFT & 0b111)?;
        let op_code = OpCode::from_code(word >> OP_CODE_SHIFT & 0b11)?;
        match packet_type {
            PacketType::Type1 => {
                let register = Register::from_code(word >> REGISTER_SHIFT & REGISTER_MASK)?;
                Self::type1(op_code, register, word & TYPE1_COUNT_MASK)
            }
            PacketType::Type2 => Self::type2(op_code, word & TYPE2_COUNT_MASK),
        }
    }

    /// Returns the packed 32-bit encoding of this word.
    pub fn to_u32(&self) -> u32 {
        let mut bits = (self.packet_type as u32) << PACKET_TYPE_SHIFT
            | (self.op_code as u32) << OP_CODE_SHIFT;
        if let Some(register) = self.register {
            bits |= register.code() << REGISTER_SHIFT;
        }
        bits | self.count
    }

    /// Encodes this word as its 4 big-endian wire bytes.
    pub fn to_bytes(&self) -> [u8; 4] {
        self.to_u32().to_be_bytes()
    }
}

/// One configuration packet: a header word plus its payload bytes.
///
/// Equality compares the header and the raw payload bytes, regardless of
/// whether the packet was built from bytes or from words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPacket {
    word: ConfigWord,
    payload: Vec<u8>,
}

impl ConfigPacket {
    /// Returns the NOP packet: the bare NOP word with no payload.
    pub fn nop() -> Self {
        Self {
            word: ConfigWord::nop(),
            payload: Vec::new(),
        }
    }

    /// Creates a packet, validating that the payload matches the header's
    /// declared word count.
    pub fn new(word: ConfigWord, payload: Vec<u8>) -> Result<Self, BitstreamError> {
        if payload.len() != word.count() as usize * 4 {
            return Err(BitstreamError::PayloadSizeMismatch {
                expected_words: word.count(),
                got_bytes: payload.len(),
            });
        }
        Ok(Self { word, payload })
    }

    /// Creates a packet from payload words instead of raw bytes.
    pub fn from_words(word: ConfigWord, payload: &[Word]) -> Result<Self, BitstreamError> {
        let bytes = payload.iter().flat_map(|w| w.to_be_bytes()).collect();
        Self::new(word, bytes)
    }

    /// Returns the header word.
    pub fn word(&self) -> &ConfigWord {
        &self.word
    }

    /// Returns the raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the payload reinterpreted as big-endian words.
    pub fn payload_words(&self) -> Vec<Word> {
        self.payload
            .chunks_exact(4)
            .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Returns the full wire encoding: header word then payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.payload.len());
        bytes.extend_from_slice(&self.word.to_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Returns the encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        4 + self.payload.len()
    }
}

/// An iterator decoding a raw byte stream into configuration packets.
///
/// The stream must start immediately after the sync word. Decoding stops at
/// the first malformed word; the error is yielded once and the iterator is
/// fused afterwards.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    /// Creates a reader over the bytes following the sync word.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Returns the current byte offset into the stream.
    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl Iterator for PacketReader<'_> {
    type Item = Result<ConfigPacket, BitstreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let remaining = &self.bytes[self.pos..];
        if remaining.len() < 4 {
            self.pos = self.bytes.len();
            return Some(Err(BitstreamError::TruncatedWord(remaining.len())));
        }

        let word = match ConfigWord::from_bytes(&remaining[..4]) {
            Ok(word) => word,
            Err(err) => {
                self.pos = self.bytes.len();
                return Some(Err(err));
            }
        };
        let payload_len = word.count() as usize * 4;
        if remaining.len() < 4 + payload_len {
            self.pos = self.bytes.len();
            return Some(Err(BitstreamError::PayloadOverrun(word.count())));
        }

        let payload = remaining[4..4 + payload_len].to_vec();
        self.pos += 4 + payload_len;
        // The length was checked against the count above.
        Some(ConfigPacket::new(word, payload))
    }
}

/// Decodes an entire post-sync byte stream into packets.
pub fn decode_packets(bytes: &[u8]) -> Result<Vec<ConfigPacket>, BitstreamError> {
    PacketReader::new(bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_write_encodes_to_known_pattern() {
        let word = ConfigWord::type1(OpCode::Write, Register::Far, 1).unwrap();
        assert_eq!(word.to_u32(), 0x3000_2001);
        assert_eq!(word.to_bytes(), [0x30, 0x00, 0x20, 0x01]);
    }

    #[test]
    fn nop_is_0x20000000() {
        assert_eq!(ConfigWord::nop().to_u32(), 0x2000_0000);
        let decoded = ConfigWord::from_bytes(&[0x20, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(decoded, ConfigWord::nop());
        assert_eq!(decoded.op_code(), OpCode::Nop);
        assert_eq!(decoded.register(), Some(Register::Crc));
    }

    #[test]
    fn decode_encode_roundtrip_all_valid_words() {
        let ops = [OpCode::Nop, OpCode::Read, OpCode::Write];
        let registers = [
            Register::Crc,
            Register::Far,
            Register::Fdri,
            Register::Cmd,
            Register::Mask,
            Register::Idcode,
            Register::Ctl1,
            Register::Bspi,
        ];
        for op in ops {
            for register in registers {
                for count in [0, 1, 101, 2047] {
                    let word = ConfigWord::type1(op, register, count).unwrap();
                    let back = ConfigWord::from_bytes(&word.to_bytes()).unwrap();
                    assert_eq!(word, back);
                }
            }
            for count in [0, 1, 0x7ff_ffff] {
                let word = ConfigWord::type2(op, count).unwrap();
                let back = ConfigWord::from_bytes(&word.to_bytes()).unwrap();
                assert_eq!(word, back);
            }
        }
    }

    #[test]
    fn count_limits_are_construction_errors() {
        assert!(matches!(
            ConfigWord::type1(OpCode::Write, Register::Fdri, 2048),
            Err(BitstreamError::CountTooLarge { limit: 2048, .. })
        ));
        assert!(matches!(
            ConfigWord::type2(OpCode::Write, 1 << 27),
            Err(BitstreamError::CountTooLarge { .. })
        ));
    }

    #[test]
    fn decode_rejects_unknown_fields() {
        // Packet type 7.
        assert!(matches!(
            ConfigWord::from_bytes(&[0xe0, 0x00, 0x00, 0x00]),
            Err(BitstreamError::UnknownPacketType(7))
        ));
        // Op code 3.
        assert!(matches!(
            ConfigWord::from_bytes(&[0x38, 0x00, 0x00, 0x00]),
            Err(BitstreamError::UnknownOpCode(3))
        ));
        // Register 15 is one of the undocumented codes.
        let word = 1u32 << 29 | 2 << 27 | 15 << 13;
        assert!(matches!(
            ConfigWord::from_bytes(&word.to_be_bytes()),
            Err(BitstreamError::UnknownRegister(15))
        ));
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(matches!(
            ConfigWord::from_bytes(&[0x30, 0x00]),
            Err(BitstreamError::TruncatedWord(2))
        ));
    }

    #[test]
    fn packet_validates_payload_size() {
        let word = ConfigWord::type1(OpCode::Write, Register::Cmd, 1).unwrap();
        assert!(ConfigPacket::new(word, vec![0; 4]).is_ok());
        assert!(matches!(
            ConfigPacket::new(word, vec![0; 5]),
            Err(BitstreamError::PayloadSizeMismatch {
                expected_words: 1,
                got_bytes: 5,
            })
        ));
    }

    #[test]
    fn packet_equality_ignores_payload_representation() {
        let word = ConfigWord::type1(OpCode::Write, Register::Far, 1).unwrap();
        let from_bytes = ConfigPacket::new(word, vec![0x00, 0x40, 0x00, 0x00]).unwrap();
        let from_words = ConfigPacket::from_words(word, &[Word::new(0x0040_0000)]).unwrap();
        assert_eq!(from_bytes, from_words);
        assert_eq!(from_words.payload_words(), vec![Word::new(0x0040_0000)]);
    }

    #[test]
    fn packet_wire_roundtrip() {
        let word = ConfigWord::type1(OpCode::Write, Register::Idcode, 1).unwrap();
        let packet = ConfigPacket::new(word, vec![0x03, 0x62, 0xd0, 0x93]).unwrap();
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), packet.encoded_len());
        let decoded = decode_packets(&bytes).unwrap();
        assert_eq!(decoded, vec![packet]);
    }

    #[test]
    fn reader_decodes_sequences() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ConfigWord::nop().to_bytes());
        let far = ConfigPacket::new(
            ConfigWord::type1(OpCode::Write, Register::Far, 1).unwrap(),
            vec![0, 0, 0, 7],
        )
        .unwrap();
        bytes.extend_from_slice(&far.to_bytes());
        let packets = decode_packets(&bytes).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].word(), &ConfigWord::nop());
        assert_eq!(packets[1], far);
    }

    #[test]
    fn reader_rejects_overrunning_count() {
        // FAR write declaring 1 word with no payload following.
        let bytes = ConfigWord::type1(OpCode::Write, Register::Far, 1)
            .unwrap()
            .to_bytes();
        let result = decode_packets(&bytes);
        assert!(matches!(result, Err(BitstreamError::PayloadOverrun(1))));
    }

    #[test]
    fn reader_rejects_trailing_fragment() {
        let mut bytes = ConfigWord::nop().to_bytes().to_vec();
        bytes.push(0xff);
        assert!(matches!(
            decode_packets(&bytes),
            Err(BitstreamError::TruncatedWord(1))
        ));
    }

    #[test]
    fn reader_fuses_after_error() {
        let mut reader = PacketReader::new(&[0xe0, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00]);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
