//! Packet-stream classification.
//!
//! A decoded packet list is read as `init prefix, frame-data chunks, suffix`.
//! Each chunk starts with one of two header shapes (a FAR write announcing
//! the chunk's start address, surrounded by NOPs, followed by an FDRI
//! write) and carries its frame data either uncompressed or as a
//! multi-frame write, distinguished by the CMD value that follows the
//! write:
//!
//! ```text
//! uncompressed:                 multi-frame write:
//!   Write FAR: addr               Write FAR: addr
//!   Write CMD: 1                  Write CMD: 1
//!   NOP                           NOP
//!   Write FDRI: 0 PW              Write FDRI: 101 PW
//!   Type 2: full payload          Write CMD: 2
//!   Write CMD: 7 (RCRC)           NOPs
//!                                 Write MFWR: zeros
//!                                 Write FAR: next addr
//!                                 ... repeated per target frame
//! ```
//!
//! Acceptance is deliberately strict: any packet sequence outside these
//! shapes fails with [`BitstreamError::UnexpectedPacketOrder`] instead of
//! being guessed at, even when a real device would accept it. Vendor
//! blanking bitstreams are known to be rejected for this reason.

use crate::error::BitstreamError;
use crate::frame::{Frame, FRAME_BYTES};
use crate::packet::{ConfigPacket, ConfigWord, OpCode, PacketType, Register};
use petri_device::FrameAddressGenerator;

/// CMD payload selecting Write Configuration (uncompressed frame data).
const WCFG_MARKER: [u8; 4] = [0, 0, 0, 1];
/// CMD payload selecting Multi Frame Write.
const MFW_MARKER: [u8; 4] = [0, 0, 0, 2];
/// CMD payload resetting the CRC register, emitted before uncompressed data.
const RCRC_MARKER: [u8; 4] = [0, 0, 0, 7];

/// Position after the chunk's FDRI write peeked at to pick the MFW FAR
/// spacing.
const MFW_PEEK_OFFSET: usize = 16;
/// FAR spacing and first-FAR position when the peeked packet is a NOP.
const MFW_WIDE: (usize, usize) = (10, 22);
/// FAR spacing and first-FAR position when the peeked packet is FAR/CMD.
const MFW_NARROW: (usize, usize) = (2, 14);

/// The outcome of classifying a packet stream.
#[derive(Debug, Clone)]
pub struct ParsedBitstream {
    /// Packets preceding the first frame-data chunk.
    pub init_packets: Vec<ConfigPacket>,
    /// Decoded frames in stream order; all-zero frames are retained.
    pub frames: Vec<Frame>,
    /// Packets following the last recognized chunk.
    pub suffix_packets: Vec<ConfigPacket>,
}

/// Classifies a flat packet list into init packets, frames and suffix.
///
/// The address generator is driven by the chunk FAR writes and left at its
/// final position; callers wanting a fresh cursor must `reset()` it.
pub fn classify_packets(
    packets: &[ConfigPacket],
    addr_gen: &mut FrameAddressGenerator,
) -> Result<ParsedBitstream, BitstreamError> {
    let (init, rest) = split_init(packets)?;
    let mut frames = Vec::new();
    let suffix = read_frame_chunks(rest, &mut frames, addr_gen)?;
    Ok(ParsedBitstream {
        init_packets: init.to_vec(),
        frames,
        suffix_packets: suffix.to_vec(),
    })
}

/// Extracts the device IDCODE from the init packets.
pub fn idcode_from_packets(packets: &[ConfigPacket]) -> Result<u32, BitstreamError> {
    let idcode_word = ConfigWord::type1(OpCode::Write, Register::Idcode, 1)?;
    packets
        .iter()
        .find(|p| *p.word() == idcode_word)
        .and_then(|p| <[u8; 4]>::try_from(p.payload()).ok())
        .map(u32::from_be_bytes)
        .ok_or(BitstreamError::MissingIdcode)
}

/// Splits off the init prefix: everything before the first WCFG command
/// write or FAR write.
fn split_init(
    packets: &[ConfigPacket],
) -> Result<(&[ConfigPacket], &[ConfigPacket]), BitstreamError> {
    for (idx, packet) in packets.iter().enumerate() {
        let register = packet.word().register();
        if (register == Some(Register::Cmd) && packet.payload() == WCFG_MARKER)
            || register == Some(Register::Far)
        {
            return Ok((&packets[..idx], &packets[idx..]));
        }
    }
    Err(BitstreamError::UnexpectedPacketOrder)
}

/// Reads the FAR payload of a packet as a frame address.
fn far_payload(packet: &ConfigPacket) -> Result<u32, BitstreamError> {
    <[u8; 4]>::try_from(packet.payload())
        .map(u32::from_be_bytes)
        .map_err(|_| BitstreamError::UnexpectedPacketOrder)
}

/// Consumes frame-data chunks until no chunk header is recognized, and
/// returns the remaining packets (the suffix).
fn read_frame_chunks<'a>(
    mut packets: &'a [ConfigPacket],
    frames: &mut Vec<Frame>,
    addr_gen: &mut FrameAddressGenerator,
) -> Result<&'a [ConfigPacket], BitstreamError> {
    let cmd_write = ConfigWord::type1(OpCode::Write, Register::Cmd, 1)?;
    let fdri_prep = ConfigWord::type1(OpCode::Write, Register::Fdri, 0)?;

    loop {
        // Header shape (a): [_, NOP, FAR, NOP, FDRI-write].
        let shape_a = match (packets.get(1), packets.get(2), packets.get(3), packets.get(4)) {
            (Some(p1), Some(p2), Some(p3), Some(p4)) => {
                p1.word().op_code() == OpCode::Nop
                    && p3.word().op_code() == OpCode::Nop
                    && p2.word().register() == Some(Register::Far)
                    && p4.word().register() == Some(Register::Fdri)
            }
            _ => false,
        };
        if shape_a {
            addr_gen.set_start(far_payload(&packets[2])?)?;
            packets = &packets[4..];
        } else {
            // Header shape (b): [FAR, _, NOP, FDRI-write].
            let shape_b = match (packets.first(), packets.get(2), packets.get(3)) {
                (Some(p0), Some(p2), Some(p3)) => {
                    p2.word().op_code() == OpCode::Nop
                        && p0.word().register() == Some(Register::Far)
                        && p3.word().register() == Some(Register::Fdri)
                }
                _ => false,
            };
            if !shape_b {
                break;
            }
            addr_gen.set_start(far_payload(&packets[0])?)?;
            packets = &packets[3..];
        }

        let type2_write = first_write_is_type2(packets, &fdri_prep, &cmd_write)?;
        let offset = if type2_write { 2 } else { 1 };
        let marker = packets
            .get(offset)
            .ok_or(BitstreamError::UnexpectedPacketOrder)?;

        packets = if *marker.word() == cmd_write && marker.payload() == RCRC_MARKER {
            read_uncompressed_chunk(packets, offset, frames, addr_gen)?
        } else if chunk_is_multi_frame_write(marker)? {
            read_multi_frame_chunk(packets, offset, frames, addr_gen)?
        } else {
            read_uncompressed_chunk(packets, offset, frames, addr_gen)?
        };
    }

    Ok(packets)
}

/// Decides whether the chunk's FDRI write carries its count in a Type 2
/// word (`[FDRI-write count 0, Type 2 payload]`) or directly in the Type 1
/// write.
fn first_write_is_type2(
    packets: &[ConfigPacket],
    fdri_prep: &ConfigWord,
    cmd_write: &ConfigWord,
) -> Result<bool, BitstreamError> {
    let p0 = packets.first().ok_or(BitstreamError::UnexpectedPacketOrder)?;
    let p1 = packets.get(1).ok_or(BitstreamError::UnexpectedPacketOrder)?;

    if p0.word() == fdri_prep && p1.word().packet_type() == PacketType::Type2 {
        Ok(true)
    } else if p1.word() == cmd_write {
        Ok(false)
    } else {
        Err(BitstreamError::UnexpectedPayloadSize)
    }
}

/// Decides whether the marker packet after the chunk's write announces a
/// multi-frame write.
fn chunk_is_multi_frame_write(marker: &ConfigPacket) -> Result<bool, BitstreamError> {
    let register = marker.word().register();
    if register == Some(Register::Cmd) && marker.payload() == MFW_MARKER {
        Ok(true)
    } else if (register == Some(Register::Cmd) && marker.payload() == WCFG_MARKER)
        || matches!(register, Some(Register::Crc) | Some(Register::Mask))
    {
        Ok(false)
    } else {
        Err(BitstreamError::UnexpectedPacketOrder)
    }
}

/// Reads an uncompressed chunk: the write payload is consecutive frames at
/// generator-supplied addresses.
fn read_uncompressed_chunk<'a>(
    packets: &'a [ConfigPacket],
    offset: usize,
    frames: &mut Vec<Frame>,
    addr_gen: &mut FrameAddressGenerator,
) -> Result<&'a [ConfigPacket], BitstreamError> {
    let payload = packets[offset - 1].payload();
    if payload.len() % FRAME_BYTES != 0 {
        return Err(BitstreamError::UnexpectedPayloadSize);
    }
    frames_from_payload(payload, addr_gen, frames)?;
    Ok(&packets[offset..])
}

/// Reads a multi-frame-write chunk.
///
/// The write payload itself may carry several frames; the last one stays in
/// the FDRI and is re-emitted at the address of every following FAR write.
/// The FAR writes repeat at a fixed spacing of 10 or 2 packets, two layouts
/// observed in vendor output and told apart by a structural peek; any third
/// spacing fails instead of being inferred. The first non-FAR packet at a
/// FAR position terminates the chunk.
fn read_multi_frame_chunk<'a>(
    packets: &'a [ConfigPacket],
    offset: usize,
    frames: &mut Vec<Frame>,
    addr_gen: &mut FrameAddressGenerator,
) -> Result<&'a [ConfigPacket], BitstreamError> {
    let payload = packets[offset - 1].payload();
    frames_from_payload(payload, addr_gen, frames)?;
    if payload.len() < FRAME_BYTES {
        return Err(BitstreamError::UnexpectedPayloadSize);
    }
    let fdri_content = &payload[payload.len() - FRAME_BYTES..];

    let peek = packets
        .get(MFW_PEEK_OFFSET + offset)
        .ok_or(BitstreamError::UnexpectedPacketOrder)?;
    let (spacing, start) = if peek.word().op_code() == OpCode::Nop {
        MFW_WIDE
    } else if matches!(
        peek.word().register(),
        Some(Register::Far) | Some(Register::Cmd)
    ) {
        MFW_NARROW
    } else {
        return Err(BitstreamError::UnexpectedPacketOrder);
    };

    let mut idx = start + offset;
    while idx < packets.len() {
        let packet = &packets[idx];
        if packet.word().register() == Some(Register::Far) {
            frames.push(Frame::from_bytes(far_payload(packet)?, fdri_content)?);
            idx += spacing;
        } else {
            return Ok(&packets[idx..]);
        }
    }
    Err(BitstreamError::UnexpectedPacketOrder)
}

/// Slices a payload into frames at generator-supplied addresses.
///
/// Whenever the generator reports a row crossing, the 2 padding frames that
/// follow in the payload are skipped (3 frame slots consumed for 1 frame).
fn frames_from_payload(
    payload: &[u8],
    addr_gen: &mut FrameAddressGenerator,
    frames: &mut Vec<Frame>,
) -> Result<(), BitstreamError> {
    let mut pos = 0;
    while pos < payload.len() {
        let addr = addr_gen
            .next()
            .ok_or(BitstreamError::UnexpectedPayloadSize)?;
        let end = pos + FRAME_BYTES;
        if end > payload.len() {
            return Err(BitstreamError::UnexpectedPayloadSize);
        }
        frames.push(Frame::from_bytes(addr, &payload[pos..end])?);
        pos += if addr_gen.padding_frames_needed() {
            3 * FRAME_BYTES
        } else {
            FRAME_BYTES
        };
    }
    Ok(())
}
