//! Xilinx 7-Series bitstream surgery.
//!
//! This crate reads, edits and regenerates 7-Series configuration
//! bitstreams at the level of individual configuration-memory frames and
//! configuration-register packets. It provides the packet codec
//! ([`packet`]), the frame model ([`frame`]), the strict packet-stream
//! classifier ([`parse`]), the software header and boilerplate templates
//! ([`header`]) and the assembler ([`handler`]), which together support
//! whole-device reprogramming, partial reconfiguration of an evolvable
//! region and targeted packet removal.
//!
//! Hardware checksums (CRC/ECC) are not computed; the emitted command
//! sequences reset the CRC register where vendor tools would check it.

#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod handler;
pub mod header;
pub mod packet;
pub mod parse;

pub use error::BitstreamError;
pub use frame::{frames_from_bits, Frame, FRAME_BYTES, FRAME_WORDS};
pub use handler::{remove_bram_init_packets, Xc7BitstreamHandler};
pub use packet::{
    decode_packets, ConfigPacket, ConfigWord, OpCode, PacketReader, PacketType, Register,
};
pub use parse::{classify_packets, idcode_from_packets, ParsedBitstream};
