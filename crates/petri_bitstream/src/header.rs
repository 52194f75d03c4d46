//! Software header and boilerplate packet templates.
//!
//! Every loadable bitstream starts with the vendor tool's software header
//! (TLV metadata fields, dummy pad words, the bus width auto-detect pattern
//! and the sync word) and brackets its frame data with fixed init/suffix
//! command sequences. The sequences here were recovered by analysing
//! tool-generated bitstreams for the same device family.
//!
//! A write of 7 to CMD resets the CRC register; vendor tools emit it where a
//! CRC check would otherwise go, which lets these templates skip checksum
//! computation entirely.

use crate::error::BitstreamError;
use crate::packet::{ConfigPacket, ConfigWord, OpCode, Register};
use petri_common::Word;

/// Sync word marking the start of the configuration command stream.
pub const SYNC_WORD: u32 = 0xaa99_5566;

/// Device name written into the software header by default.
pub const DEFAULT_PART_NAME: &str = "7a35tcpg236";

/// FAR "park" address written by the startup sequence.
const FAR_PARK_ADDR: u32 = 0x03be_0000;

// Command register values.
/// Null command.
const CMD_NULL: u32 = 0x00;
/// Write Configuration: enable FDRI frame writes.
pub(crate) const CMD_WCFG: u32 = 0x01;
/// Last Frame: deassert GHIGH_B.
const CMD_LFRM: u32 = 0x03;
/// Start: begin the startup sequence.
const CMD_START: u32 = 0x05;
/// Reset CRC register.
pub(crate) const CMD_RCRC: u32 = 0x07;
/// Switch CCLK frequency.
const CMD_SWITCH: u32 = 0x09;
/// Pulse the GRESTORE signal.
const CMD_GRESTORE: u32 = 0x0a;
/// Desync: end configuration.
const CMD_DESYNC: u32 = 0x0d;

/// Words trailing the software header: 16 dummy words, the 2-word bus
/// detect pattern, 2 more dummy words and the sync word.
const HEADER_TRAILER_WORDS: usize = 21;

/// Builds the vendor software header for a payload of the given length.
///
/// The layout is reproduced byte-for-byte from tool output: TLV fields
/// `a` (fixed design-name blob), `b` (device name), `c`/`d` (date and time
/// placeholders) and `e` (length of everything after the header fields),
/// followed by the dummy/bus-detect/sync trailer.
pub fn sw_header(payload_len: usize, part_name: &str) -> Vec<u8> {
    let mut header = Vec::with_capacity(128);

    header.extend_from_slice(&[0x00, 0x09]);
    header.extend_from_slice(&[0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x00]);
    // Field 'a': design name, fixed 4-byte blob.
    header.extend_from_slice(&[0x00, 0x01, 0x61, 0x00, 0x04, 0xc0, 0xbe, 0xa0, 0x00]);
    // Field 'b': device name.
    header.push(0x62);
    header.extend_from_slice(&((part_name.len() + 1) as u16).to_be_bytes());
    header.extend_from_slice(part_name.as_bytes());
    header.push(0x00);
    // Fields 'c'/'d': date and time placeholders.
    header.push(0x63);
    header.extend_from_slice(&[0x00, 0x05]);
    header.extend_from_slice(b"Date\0");
    header.push(0x64);
    header.extend_from_slice(&[0x00, 0x05]);
    header.extend_from_slice(b"Time\0");
    // Field 'e': length of bus detect + sync + config packets.
    header.push(0x65);
    header.extend_from_slice(&((payload_len + HEADER_TRAILER_WORDS * 4) as u32).to_be_bytes());

    for _ in 0..16 {
        header.extend_from_slice(&0xffff_ffffu32.to_be_bytes());
    }
    header.extend_from_slice(&0x0000_00bbu32.to_be_bytes());
    header.extend_from_slice(&0x1122_0044u32.to_be_bytes());
    for _ in 0..2 {
        header.extend_from_slice(&0xffff_ffffu32.to_be_bytes());
    }
    header.extend_from_slice(&SYNC_WORD.to_be_bytes());

    header
}

/// Returns the NOP packet.
pub fn nop_packet() -> ConfigPacket {
    ConfigPacket::nop()
}

/// Builds a one-word write packet to the given register.
pub fn write_register(register: Register, value: u32) -> Result<ConfigPacket, BitstreamError> {
    let word = ConfigWord::type1(OpCode::Write, register, 1)?;
    ConfigPacket::from_words(word, &[Word::new(value)])
}

/// Builds a CMD register write.
pub fn write_cmd(command: u32) -> Result<ConfigPacket, BitstreamError> {
    write_register(Register::Cmd, command)
}

/// Builds a FAR write seeking the given frame address.
pub fn set_far(frame_addr: u32) -> Result<ConfigPacket, BitstreamError> {
    write_register(Register::Far, frame_addr)
}

/// Builds the zero-count FDRI write announcing a Type 2 frame-data write.
pub fn fdri_write_prep() -> Result<ConfigPacket, BitstreamError> {
    let word = ConfigWord::type1(OpCode::Write, Register::Fdri, 0)?;
    ConfigPacket::new(word, Vec::new())
}

/// Builds the Type 2 write word carrying `word_count` payload words.
pub fn type2_write(word_count: u32) -> Result<ConfigWord, BitstreamError> {
    ConfigWord::type2(OpCode::Write, word_count)
}

/// Init packets bracketing a full-device write.
pub fn full_init_packets(
    compressed: bool,
    idcode: u32,
) -> Result<Vec<ConfigPacket>, BitstreamError> {
    let ctl1_mask = if compressed { 0x0000_1000 } else { 0 };
    let mut packets = vec![
        nop_packet(),
        write_register(Register::Timer, 0)?,
        write_register(Register::Wbstar, 0)?,
        write_cmd(CMD_NULL)?,
        nop_packet(),
        write_cmd(CMD_RCRC)?,
        nop_packet(),
        nop_packet(),
        write_register(Register::RbcrcSw, 0)?,
        write_register(Register::Cor0, 0x0200_3fe5)?,
        write_register(Register::Cor1, 0)?,
        write_register(Register::Idcode, idcode)?,
        write_cmd(CMD_SWITCH)?,
        nop_packet(),
        write_register(Register::Mask, 0x0000_0401)?,
        write_register(Register::Ctl0, 0x0000_0501)?,
        write_register(Register::Mask, ctl1_mask)?,
        write_register(Register::Ctl1, ctl1_mask)?,
    ];
    packets.extend(std::iter::repeat_with(nop_packet).take(8));
    Ok(packets)
}

/// Suffix packets (startup sequence) closing a full-device write.
pub fn full_suffix_packets(compressed: bool) -> Result<Vec<ConfigPacket>, BitstreamError> {
    let mut packets = vec![
        write_cmd(CMD_RCRC)?,
        nop_packet(),
        nop_packet(),
        write_cmd(CMD_GRESTORE)?,
        nop_packet(),
        write_cmd(CMD_LFRM)?,
    ];
    if compressed {
        packets.push(write_register(Register::Mask, 0x0000_1000)?);
        packets.push(write_register(Register::Ctl1, 0)?);
    }
    packets.extend(std::iter::repeat_with(nop_packet).take(100));
    packets.extend([
        write_cmd(CMD_START)?,
        nop_packet(),
        set_far(FAR_PARK_ADDR)?,
        write_register(Register::Mask, 0x0000_0501)?,
        write_register(Register::Ctl0, 0x0000_0501)?,
        write_cmd(CMD_RCRC)?,
        nop_packet(),
        nop_packet(),
        write_cmd(CMD_DESYNC)?,
    ]);
    packets.extend(std::iter::repeat_with(nop_packet).take(500));
    Ok(packets)
}

/// Init packets bracketing a partial write.
pub fn partial_init_packets(idcode: u32) -> Result<Vec<ConfigPacket>, BitstreamError> {
    let mut packets: Vec<ConfigPacket> = std::iter::repeat_with(nop_packet).take(100).collect();
    packets.extend([
        write_cmd(CMD_RCRC)?,
        nop_packet(),
        nop_packet(),
        write_register(Register::Idcode, idcode)?,
        write_cmd(CMD_NULL)?,
        write_register(Register::Mask, 0x0000_0400)?,
        write_register(Register::Ctl0, 0x0000_0400)?,
        write_register(Register::Mask, 0x0002_0000)?,
        write_register(Register::Ctl1, 0)?,
    ]);
    Ok(packets)
}

/// Suffix packets closing a partial write.
pub fn partial_suffix_packets() -> Result<Vec<ConfigPacket>, BitstreamError> {
    let mut packets = vec![
        nop_packet(),
        write_register(Register::Mask, 0x0000_0100)?,
        write_register(Register::Ctl0, 0x0000_0100)?,
        write_cmd(CMD_LFRM)?,
    ];
    packets.extend(std::iter::repeat_with(nop_packet).take(100));
    packets.extend([
        write_cmd(CMD_START)?,
        nop_packet(),
        set_far(FAR_PARK_ADDR)?,
        nop_packet(),
        nop_packet(),
        write_cmd(CMD_RCRC)?,
        nop_packet(),
        write_cmd(CMD_DESYNC)?,
    ]);
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::decode_packets;

    #[test]
    fn header_ends_with_sync_word() {
        let header = sw_header(0, DEFAULT_PART_NAME);
        assert_eq!(&header[header.len() - 4..], &[0xaa, 0x99, 0x55, 0x66]);
    }

    #[test]
    fn header_contains_part_name() {
        let header = sw_header(0, DEFAULT_PART_NAME);
        let text = String::from_utf8_lossy(&header);
        assert!(text.contains("7a35tcpg236"));
    }

    #[test]
    fn header_length_field_counts_trailer() {
        let payload_len = 1234usize;
        let header = sw_header(payload_len, DEFAULT_PART_NAME);
        // Field 'e' sits immediately before the 21 trailer words.
        let len_pos = header.len() - HEADER_TRAILER_WORDS * 4 - 4;
        assert_eq!(header[len_pos - 1], 0x65);
        let declared = u32::from_be_bytes([
            header[len_pos],
            header[len_pos + 1],
            header[len_pos + 2],
            header[len_pos + 3],
        ]);
        assert_eq!(declared as usize, payload_len + HEADER_TRAILER_WORDS * 4);
    }

    #[test]
    fn header_bus_detect_pattern_present() {
        let header = sw_header(0, DEFAULT_PART_NAME);
        let pattern = [0x00, 0x00, 0x00, 0xbb, 0x11, 0x22, 0x00, 0x44];
        assert!(header.windows(8).any(|w| w == pattern));
    }

    #[test]
    fn nop_packet_is_bare_word() {
        let nop = nop_packet();
        assert_eq!(nop.to_bytes(), vec![0x20, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn set_far_encodes_address_big_endian() {
        let packet = set_far(0x0040_0000).unwrap();
        assert_eq!(
            packet.to_bytes(),
            vec![0x30, 0x00, 0x20, 0x01, 0x00, 0x40, 0x00, 0x00]
        );
    }

    #[test]
    fn full_init_carries_idcode() {
        let packets = full_init_packets(false, 0x0362_d093).unwrap();
        let idcode = packets
            .iter()
            .find(|p| p.word().register() == Some(Register::Idcode))
            .unwrap();
        assert_eq!(idcode.payload(), [0x03, 0x62, 0xd0, 0x93]);
    }

    #[test]
    fn full_init_trails_eight_nops() {
        let packets = full_init_packets(false, 0).unwrap();
        assert_eq!(packets.len(), 18 + 8);
        assert!(packets[packets.len() - 8..]
            .iter()
            .all(|p| p == &nop_packet()));
    }

    #[test]
    fn compressed_variants_differ_only_in_ctl1() {
        let plain = full_init_packets(false, 0).unwrap();
        let compressed = full_init_packets(true, 0).unwrap();
        assert_eq!(plain.len(), compressed.len());
        let differing: Vec<usize> = plain
            .iter()
            .zip(&compressed)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(differing.len(), 2);
        for idx in differing {
            assert!(matches!(
                compressed[idx].word().register(),
                Some(Register::Mask) | Some(Register::Ctl1)
            ));
        }

        let plain_suffix = full_suffix_packets(false).unwrap();
        let compressed_suffix = full_suffix_packets(true).unwrap();
        assert_eq!(plain_suffix.len() + 2, compressed_suffix.len());
    }

    #[test]
    fn full_suffix_ends_with_500_nops_after_desync() {
        let packets = full_suffix_packets(false).unwrap();
        let nop = nop_packet();
        assert!(packets[packets.len() - 500..].iter().all(|p| p == &nop));
        let desync = &packets[packets.len() - 501];
        assert_eq!(desync.word().register(), Some(Register::Cmd));
        assert_eq!(desync.payload(), [0, 0, 0, 0x0d]);
    }

    #[test]
    fn partial_init_starts_with_100_nops() {
        let packets = partial_init_packets(0).unwrap();
        let nop = nop_packet();
        assert!(packets[..100].iter().all(|p| p == &nop));
        assert_ne!(packets[100], nop);
    }

    #[test]
    fn templates_decode_from_their_own_bytes() {
        for packets in [
            full_init_packets(false, 0x0362_d093).unwrap(),
            full_suffix_packets(false).unwrap(),
            partial_init_packets(0x0362_d093).unwrap(),
            partial_suffix_packets().unwrap(),
        ] {
            let bytes: Vec<u8> = packets.iter().flat_map(ConfigPacket::to_bytes).collect();
            let decoded = decode_packets(&bytes).unwrap();
            assert_eq!(decoded, packets);
        }
    }
}
