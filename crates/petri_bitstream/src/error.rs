//! Error types for bitstream decoding, classification and assembly.

use crate::packet::PacketType;
use petri_common::BitPosition;
use petri_device::DeviceError;

/// Errors raised while decoding, classifying or assembling bitstreams.
///
/// All of these are fatal to the operation that raised them: a bitstream
/// that cannot be fully understood must not be (re)generated, because a
/// corrupt image risks mis-programming real hardware.
#[derive(Debug, thiserror::Error)]
pub enum BitstreamError {
    /// An I/O error occurred while reading a bitstream or part file.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration word was shorter than 4 bytes.
    #[error("config word must be exactly 4 bytes, got {0}")]
    TruncatedWord(usize),

    /// The packet type field held an unknown code.
    #[error("unknown packet type code {0}")]
    UnknownPacketType(u32),

    /// The op code field held an unknown code.
    #[error("unknown op code {0}")]
    UnknownOpCode(u32),

    /// The register field held a code outside the known register set.
    #[error("unknown configuration register code {0}")]
    UnknownRegister(u32),

    /// A payload word count exceeded its packet type's field width.
    #[error("payload word count {count} is too big for a {packet_type:?} packet, limit is {limit}")]
    CountTooLarge {
        /// Packet type whose limit was exceeded.
        packet_type: PacketType,
        /// The offending count.
        count: u32,
        /// First count value that no longer fits.
        limit: u32,
    },

    /// A packet payload did not match its config word's declared count.
    #[error("wrong payload size: config word expects {expected_words} words but {got_bytes} bytes were given")]
    PayloadSizeMismatch {
        /// Word count declared by the config word.
        expected_words: u32,
        /// Actual payload length in bytes.
        got_bytes: usize,
    },

    /// A declared payload ran past the end of the byte stream.
    #[error("config word declares {0} payload words, which is not possible here")]
    PayloadOverrun(u32),

    /// A frame byte buffer was not exactly 404 bytes.
    #[error("frame cannot be initialised from {0} bytes, exactly 404 expected")]
    BadFrameByteCount(usize),

    /// A frame word list was not exactly 101 words.
    #[error("frame cannot be initialised with a word count other than 101, got {0}")]
    BadFrameWordCount(usize),

    /// The byte stream contained no sync word.
    #[error("no sync word found in bitstream")]
    MissingSyncWord,

    /// The init packets carried no IDCODE write.
    #[error("no IDCODE write found in the init packets")]
    MissingIdcode,

    /// The packet stream did not follow the recognized grammar.
    #[error("unexpected packet order, bitstream deemed incorrect")]
    UnexpectedPacketOrder,

    /// A frame-data payload had an impossible size for its chunk kind.
    #[error("unexpected payload size, bitstream deemed incorrect")]
    UnexpectedPayloadSize,

    /// A partial image was requested before an evolvable region was set up.
    #[error("no evolvable region was defined; set up the handler before requesting partial bytes")]
    EvolvableRegionNotSetUp,

    /// An operation needed a device table but none was loaded.
    #[error("no device table loaded; parse a bitstream or set up the handler first")]
    NoDeviceTable,

    /// A bit position fell outside every owned frame.
    #[error("bit {0} is neither part of the habitat nor of the evolvable region")]
    UnknownBit(BitPosition),

    /// A frame address error from the device model.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_count_too_large() {
        let err = BitstreamError::CountTooLarge {
            packet_type: PacketType::Type1,
            count: 4096,
            limit: 2048,
        };
        assert_eq!(
            format!("{err}"),
            "payload word count 4096 is too big for a Type1 packet, limit is 2048"
        );
    }

    #[test]
    fn display_unknown_bit() {
        let err = BitstreamError::UnknownBit(BitPosition::new(0x42, 1, 2));
        assert!(format!("{err}").contains("bit_00000042_001_02"));
    }

    #[test]
    fn device_error_converts() {
        let device = DeviceError::InvalidRow { addr: 0, row: 9 };
        let err: BitstreamError = device.into();
        assert!(matches!(err, BitstreamError::Device(_)));
    }
}
