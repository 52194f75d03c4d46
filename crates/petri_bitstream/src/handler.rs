//! Bitstream assembly and in-place surgery.
//!
//! [`Xc7BitstreamHandler`] owns a device's frame set plus an optional
//! habitat baseline and evolvable-region subset, and emits full, partial
//! and habitat-only bitstreams around the fixed packet templates from
//! [`header`](crate::header). The evolvable region is the set of frames
//! intentionally left mutable for repeated experiments; the habitat is the
//! fixed design around it.

use crate::error::BitstreamError;
use crate::frame::{frames_from_bits, Frame, FRAME_BYTES, FRAME_WORDS};
use crate::header::{
    fdri_write_prep, full_init_packets, full_suffix_packets, nop_packet, partial_init_packets,
    partial_suffix_packets, set_far, sw_header, type2_write, write_cmd, CMD_WCFG,
    DEFAULT_PART_NAME, SYNC_WORD,
};
use crate::packet::{decode_packets, ConfigPacket, Register};
use crate::parse::{classify_packets, idcode_from_packets};
use petri_common::BitPosition;
use petri_device::{EvoRegionAddrDomain, FrameAddressGenerator};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Extra all-zero frames appended after the column span of a partial
/// write. One such frame is empirically required for the device to apply
/// the last real frame; the reason is not documented anywhere.
const PARTIAL_TRAILER_FRAMES: usize = 1;

/// An all-zero frame on the wire.
const EMPTY_FRAME: [u8; FRAME_BYTES] = [0; FRAME_BYTES];

/// Reads, edits and regenerates bitstreams for one 7-Series device.
///
/// The handler owns its frame map exclusively; the habitat baseline is an
/// independent copy taken at `setup` time, so later evolvable-region edits
/// never alter it.
#[derive(Debug, Clone)]
pub struct Xc7BitstreamHandler {
    idcode: u32,
    full_init_packets: Vec<ConfigPacket>,
    full_suffix_packets: Vec<ConfigPacket>,
    partial_init_packets: Vec<ConfigPacket>,
    partial_suffix_packets: Vec<ConfigPacket>,
    /// Working frames keyed by address: habitat merged with evolvable bits.
    frames: BTreeMap<u32, Frame>,
    /// The habitat baseline as it was at `setup` time.
    habitat_frames: BTreeMap<u32, Frame>,
    /// Addresses of working frames inside the evolvable region's columns.
    evo_addrs: BTreeSet<u32>,
    evo_is_setup: bool,
    addr_gen: Option<FrameAddressGenerator>,
}

impl Xc7BitstreamHandler {
    /// Creates a handler for a device, building the fixed packet templates
    /// once.
    pub fn new(idcode: u32) -> Result<Self, BitstreamError> {
        Ok(Self {
            idcode,
            full_init_packets: full_init_packets(false, idcode)?,
            full_suffix_packets: full_suffix_packets(false)?,
            partial_init_packets: partial_init_packets(idcode)?,
            partial_suffix_packets: partial_suffix_packets()?,
            frames: BTreeMap::new(),
            habitat_frames: BTreeMap::new(),
            evo_addrs: BTreeSet::new(),
            evo_is_setup: false,
            addr_gen: None,
        })
    }

    /// Parses a full bitstream into a handler owning its non-empty frames.
    pub fn from_bytes(bs_bytes: &[u8], part_json: &str) -> Result<Self, BitstreamError> {
        let sync_pos = find_sync_word(bs_bytes).ok_or(BitstreamError::MissingSyncWord)?;
        let packets = decode_packets(&bs_bytes[sync_pos + 4..])?;

        let mut addr_gen = FrameAddressGenerator::from_part_json(part_json)?;
        let parsed = classify_packets(&packets, &mut addr_gen)?;
        let idcode = idcode_from_packets(&parsed.init_packets)?;

        let mut handler = Self::new(idcode)?;
        addr_gen.reset();
        handler.addr_gen = Some(addr_gen);
        handler.frames = parsed
            .frames
            .into_iter()
            .filter(|frame| !frame.is_empty())
            .map(|frame| (frame.addr(), frame))
            .collect();
        Ok(handler)
    }

    /// Reads a bitstream file and a part description file into a handler.
    pub fn from_file(bit_path: &Path, part_path: &Path) -> Result<Self, BitstreamError> {
        let bs_bytes = std::fs::read(bit_path)?;
        let part_json = std::fs::read_to_string(part_path)?;
        Self::from_bytes(&bs_bytes, &part_json)
    }

    /// Returns the device IDCODE.
    pub fn idcode(&self) -> u32 {
        self.idcode
    }

    /// Returns the owned frames in ascending address order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// Defines the habitat baseline and the evolvable region.
    ///
    /// `evo_bits` become the evolvable region: its frames are merged into
    /// the working set with evolvable bits taking precedence on address
    /// overlap, and the region then absorbs every working frame whose
    /// address falls inside the touched columns, evolvable bits or not
    /// (regions are column-granular in hardware). When `habitat_bits` is
    /// given it replaces the working frames first; otherwise the current
    /// frames (e.g. from a parsed bitstream) serve as the habitat.
    ///
    /// Calling `setup` again discards the previous evolvable region.
    pub fn setup(
        &mut self,
        part_json: &str,
        evo_bits: &[BitPosition],
        habitat_bits: Option<&[BitPosition]>,
    ) -> Result<(), BitstreamError> {
        let addr_gen = FrameAddressGenerator::from_part_json(part_json)?;

        if let Some(habitat_bits) = habitat_bits {
            self.frames = frames_from_bits(habitat_bits)
                .into_iter()
                .map(|frame| (frame.addr(), frame))
                .collect();
        }
        self.habitat_frames = self.frames.clone();

        let evo_frames = frames_from_bits(evo_bits);
        let evo_frame_addrs: Vec<u32> = evo_frames.iter().map(Frame::addr).collect();
        for evo_frame in evo_frames {
            match self.frames.entry(evo_frame.addr()) {
                std::collections::btree_map::Entry::Occupied(mut existing) => {
                    for bit in evo_frame.to_bit_list() {
                        existing.get_mut().set_position(bit, true);
                    }
                }
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(evo_frame);
                }
            }
        }

        let region = EvoRegionAddrDomain::from_addrs(evo_frame_addrs, addr_gen.table())?;
        self.evo_addrs = self
            .frames
            .keys()
            .copied()
            .filter(|&addr| region.contains(addr))
            .collect();
        self.addr_gen = Some(addr_gen);
        self.evo_is_setup = true;
        Ok(())
    }

    /// Reads one bit of the working frame set.
    ///
    /// Positions outside every owned frame are lookup errors, not zeros.
    pub fn get_bit(&self, bit: BitPosition) -> Result<bool, BitstreamError> {
        self.frames
            .get(&bit.frame_addr)
            .map(|frame| frame.get_bit(bit.word, bit.bit))
            .ok_or(BitstreamError::UnknownBit(bit))
    }

    /// Sets one bit inside the evolvable region.
    pub fn set_bit(&mut self, bit: BitPosition, value: bool) -> Result<(), BitstreamError> {
        if !self.evo_addrs.contains(&bit.frame_addr) {
            return Err(BitstreamError::UnknownBit(bit));
        }
        self.frames
            .get_mut(&bit.frame_addr)
            .ok_or(BitstreamError::UnknownBit(bit))?
            .set_position(bit, value);
        Ok(())
    }

    /// Sets several evolvable-region bits at once.
    pub fn set_multi_bits(
        &mut self,
        bits: impl IntoIterator<Item = (BitPosition, bool)>,
    ) -> Result<(), BitstreamError> {
        for (bit, value) in bits {
            self.set_bit(bit, value)?;
        }
        Ok(())
    }

    /// Returns every true bit of the evolvable region's frames.
    pub fn evolvable_bits(&self) -> Vec<BitPosition> {
        self.evo_addrs
            .iter()
            .filter_map(|addr| self.frames.get(addr))
            .flat_map(|frame| frame.to_bit_list())
            .collect()
    }

    /// Emits either the full or the partial evolvable-region bitstream.
    pub fn to_bytes(&self, partial: bool) -> Result<Vec<u8>, BitstreamError> {
        if partial {
            self.partial_evo_bytes()
        } else {
            self.full_bytes()
        }
    }

    /// Emits a full-device bitstream from the working frame set.
    pub fn full_bytes(&self) -> Result<Vec<u8>, BitstreamError> {
        self.assemble_full(&self.frames)
    }

    /// Emits a full-device bitstream from the habitat baseline only.
    pub fn habitat_bytes(&self) -> Result<Vec<u8>, BitstreamError> {
        self.assemble_full(&self.habitat_frames)
    }

    /// Emits a partial bitstream covering only the evolvable region's
    /// column span.
    ///
    /// Addresses inside the span without an evolvable frame are written as
    /// zero frames. Only one contiguous span is supported; the span runs
    /// from the first evolvable frame's column to the last one's.
    pub fn partial_evo_bytes(&self) -> Result<Vec<u8>, BitstreamError> {
        if !self.evo_is_setup {
            return Err(BitstreamError::EvolvableRegionNotSetUp);
        }
        let first = self.evo_addrs.iter().next().copied();
        let last = self.evo_addrs.iter().next_back().copied();
        let (Some(first), Some(last)) = (first, last) else {
            return Err(BitstreamError::EvolvableRegionNotSetUp);
        };
        let mut generator = self.cloned_generator()?;

        // Bounding column range of the whole evolvable set.
        let span = EvoRegionAddrDomain::from_addrs([first, last], generator.table())?;
        let min_addr = span.ranges().first().map(|r| r.start);
        let max_addr = span.ranges().last().map(|r| r.stop);
        let (Some(min_addr), Some(max_addr)) = (min_addr, max_addr) else {
            return Err(BitstreamError::EvolvableRegionNotSetUp);
        };

        generator.reset();
        generator.set_start(min_addr)?;
        let mut config_data = Vec::new();
        let mut total_frames = 0usize;
        while let Some(addr) = generator.next() {
            if addr > max_addr {
                break;
            }
            match self.evo_addrs.contains(&addr).then(|| self.frames.get(&addr)).flatten() {
                Some(frame) => config_data.extend_from_slice(&frame.to_bytes()),
                None => config_data.extend_from_slice(&EMPTY_FRAME),
            }
            total_frames += 1;
            if generator.padding_frames_needed() {
                config_data.extend_from_slice(&EMPTY_FRAME);
                config_data.extend_from_slice(&EMPTY_FRAME);
                total_frames += 2;
            }
        }
        for _ in 0..PARTIAL_TRAILER_FRAMES {
            config_data.extend_from_slice(&EMPTY_FRAME);
            total_frames += 1;
        }

        let payload = self.wrap_config_data(
            min_addr,
            total_frames,
            config_data,
            &self.partial_init_packets,
            &self.partial_suffix_packets,
        )?;
        Ok(with_sw_header(payload))
    }

    /// Walks the whole device, emitting owned frames and zero padding.
    fn assemble_full(&self, frames: &BTreeMap<u32, Frame>) -> Result<Vec<u8>, BitstreamError> {
        let mut generator = self.cloned_generator()?;
        generator.reset();

        let mut config_data = Vec::new();
        let mut total_frames = 0usize;
        while let Some(addr) = generator.next() {
            match frames.get(&addr) {
                Some(frame) => config_data.extend_from_slice(&frame.to_bytes()),
                None => config_data.extend_from_slice(&EMPTY_FRAME),
            }
            total_frames += 1;
            if generator.padding_frames_needed() {
                config_data.extend_from_slice(&EMPTY_FRAME);
                config_data.extend_from_slice(&EMPTY_FRAME);
                total_frames += 2;
            }
        }

        let payload = self.wrap_config_data(
            0,
            total_frames,
            config_data,
            &self.full_init_packets,
            &self.full_suffix_packets,
        )?;
        Ok(with_sw_header(payload))
    }

    /// Wraps raw frame data in the FAR/WCFG/FDRI packet sequence and the
    /// given init/suffix templates.
    fn wrap_config_data(
        &self,
        start_addr: u32,
        total_frames: usize,
        config_data: Vec<u8>,
        init: &[ConfigPacket],
        suffix: &[ConfigPacket],
    ) -> Result<Vec<u8>, BitstreamError> {
        let data_packet = ConfigPacket::new(
            type2_write((total_frames * FRAME_WORDS) as u32)?,
            config_data,
        )?;
        let main = [
            set_far(start_addr)?,
            write_cmd(CMD_WCFG)?,
            nop_packet(),
            fdri_write_prep()?,
            data_packet,
        ];

        let mut payload = Vec::new();
        for packet in init.iter().chain(&main).chain(suffix) {
            payload.extend_from_slice(&packet.to_bytes());
        }
        Ok(payload)
    }

    /// Returns a private copy of the address generator for one traversal.
    fn cloned_generator(&self) -> Result<FrameAddressGenerator, BitstreamError> {
        self.addr_gen
            .as_ref()
            .cloned()
            .ok_or(BitstreamError::NoDeviceTable)
    }
}

/// Strips the BRAM initialization write targeting `bram_far` from a
/// bitstream.
///
/// Removes the first `(FAR, payload == bram_far)` write plus the 3 packets
/// following it (the payload write and its neighbors), leaving every other
/// packet byte-identical, and regenerates the software header for the
/// shortened payload. A stream without a matching FAR write is returned
/// re-headered but otherwise unchanged.
pub fn remove_bram_init_packets(
    bs_bytes: &[u8],
    bram_far: u32,
) -> Result<Vec<u8>, BitstreamError> {
    let sync_pos = find_sync_word(bs_bytes).ok_or(BitstreamError::MissingSyncWord)?;
    let packets = decode_packets(&bs_bytes[sync_pos + 4..])?;

    let far_payload = bram_far.to_be_bytes();
    let mut payload = Vec::new();
    let mut skip = 0usize;
    let mut removed = false;
    for packet in &packets {
        if !removed
            && packet.word().register() == Some(Register::Far)
            && packet.payload() == far_payload
        {
            skip = 4;
            removed = true;
        }
        if skip > 0 {
            skip -= 1;
        } else {
            payload.extend_from_slice(&packet.to_bytes());
        }
    }

    Ok(with_sw_header(payload))
}

/// Returns the byte offset of the sync word, if present.
fn find_sync_word(bs_bytes: &[u8]) -> Option<usize> {
    let pattern = SYNC_WORD.to_be_bytes();
    bs_bytes.windows(4).position(|window| window == pattern)
}

/// Prefixes a packet payload with a freshly generated software header.
fn with_sw_header(payload: Vec<u8>) -> Vec<u8> {
    let mut bytes = sw_header(payload.len(), DEFAULT_PART_NAME);
    bytes.extend_from_slice(&payload);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FRAME_WORDS;
    use petri_common::Word;

    const IDCODE: u32 = 0x0362_d093;

    /// Part description matching the layout used by the parser tests: one
    /// top CLB row with columns of 3 and 2 frames, single-frame columns
    /// elsewhere.
    fn part_json() -> String {
        fn row(clb: &[u32], bram: &[u32]) -> String {
            let columns = |counts: &[u32]| {
                let entries: Vec<String> = counts
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!(r#""{i}": {{"frame_count": {c}}}"#))
                    .collect();
                entries.join(",")
            };
            format!(
                r#"{{"configuration_buses": {{
                    "CLB_IO_CLK": {{"configuration_columns": {{{}}}}},
                    "BLOCK_RAM": {{"configuration_columns": {{{}}}}}
                }}}}"#,
                columns(clb),
                columns(bram)
            )
        }
        format!(
            r#"{{"global_clock_regions": {{
                "top": {{"rows": {{"0": {top}}}}},
                "bottom": {{"rows": {{"0": {bottom}}}}}
            }}}}"#,
            top = row(&[3, 2], &[1]),
            bottom = row(&[1], &[1]),
        )
    }

    fn handler_with_habitat_and_evo() -> Xc7BitstreamHandler {
        let mut handler = Xc7BitstreamHandler::new(IDCODE).unwrap();
        // Habitat bit in column 0; evolvable bits in column 1 (addresses
        // 0x80, 0x81) plus one overlapping the habitat frame.
        let habitat = [BitPosition::new(0, 3, 4), BitPosition::new(0x81, 50, 1)];
        let evo = [
            BitPosition::new(0x80, 10, 2),
            BitPosition::new(0x81, 20, 12),
        ];
        handler.setup(&part_json(), &evo, Some(&habitat)).unwrap();
        handler
    }

    #[test]
    fn setup_merges_evolvable_over_habitat() {
        let handler = handler_with_habitat_and_evo();
        // Habitat-only bit.
        assert!(handler.get_bit(BitPosition::new(0, 3, 4)).unwrap());
        // Evolvable bit in a frame shared with the habitat: both survive.
        assert!(handler.get_bit(BitPosition::new(0x81, 50, 1)).unwrap());
        assert!(handler.get_bit(BitPosition::new(0x81, 20, 12)).unwrap());
        // Unset bit inside an owned frame reads false.
        assert!(!handler.get_bit(BitPosition::new(0x80, 0, 0)).unwrap());
    }

    #[test]
    fn get_bit_outside_owned_frames_is_an_error() {
        let handler = handler_with_habitat_and_evo();
        assert!(matches!(
            handler.get_bit(BitPosition::new(0x0040_0000, 0, 0)),
            Err(BitstreamError::UnknownBit(_))
        ));
    }

    #[test]
    fn set_bit_is_confined_to_the_evolvable_region() {
        let mut handler = handler_with_habitat_and_evo();
        let inside = BitPosition::new(0x80, 11, 3);
        handler.set_bit(inside, true).unwrap();
        assert!(handler.get_bit(inside).unwrap());
        handler.set_bit(inside, false).unwrap();
        assert!(!handler.get_bit(inside).unwrap());

        // The habitat frame at address 0 is outside the evolvable columns.
        assert!(matches!(
            handler.set_bit(BitPosition::new(0, 3, 5), true),
            Err(BitstreamError::UnknownBit(_))
        ));
    }

    #[test]
    fn set_multi_bits_applies_all() {
        let mut handler = handler_with_habitat_and_evo();
        let bits = [
            (BitPosition::new(0x80, 1, 1), true),
            (BitPosition::new(0x80, 10, 2), false),
        ];
        handler.set_multi_bits(bits).unwrap();
        assert!(handler.get_bit(BitPosition::new(0x80, 1, 1)).unwrap());
        assert!(!handler.get_bit(BitPosition::new(0x80, 10, 2)).unwrap());
    }

    #[test]
    fn evolvable_bits_lists_region_content() {
        let handler = handler_with_habitat_and_evo();
        let bits = handler.evolvable_bits();
        // The evolvable region covers column 1, absorbing the habitat bit
        // at 0x81 as well.
        assert!(bits.contains(&BitPosition::new(0x80, 10, 2)));
        assert!(bits.contains(&BitPosition::new(0x81, 20, 12)));
        assert!(bits.contains(&BitPosition::new(0x81, 50, 1)));
        // The column-0 habitat bit stays outside.
        assert!(!bits.contains(&BitPosition::new(0, 3, 4)));
    }

    #[test]
    fn setup_again_discards_previous_region() {
        let mut handler = handler_with_habitat_and_evo();
        let evo = [BitPosition::new(0, 1, 1)];
        handler.setup(&part_json(), &evo, None).unwrap();
        // The old region's addresses are no longer evolvable.
        assert!(matches!(
            handler.set_bit(BitPosition::new(0x80, 10, 2), true),
            Err(BitstreamError::UnknownBit(_))
        ));
        handler.set_bit(BitPosition::new(0, 1, 2), true).unwrap();
    }

    #[test]
    fn full_bytes_roundtrip_through_parser() {
        let handler = handler_with_habitat_and_evo();
        let bytes = handler.full_bytes().unwrap();
        let reparsed = Xc7BitstreamHandler::from_bytes(&bytes, &part_json()).unwrap();
        assert_eq!(reparsed.idcode(), IDCODE);
        let original: Vec<&Frame> = handler.frames().collect();
        let back: Vec<&Frame> = reparsed.frames().collect();
        assert_eq!(original, back);
    }

    #[test]
    fn full_bytes_respects_declared_length() {
        let handler = handler_with_habitat_and_evo();
        let bytes = handler.full_bytes().unwrap();
        // Field 'e' sits right before the 21-word dummy/bus-detect/sync
        // trailer and declares everything from the trailer onwards.
        let sync = find_sync_word(&bytes).unwrap();
        let trailer_start = sync + 4 - 21 * 4;
        let e_pos = trailer_start - 5;
        assert_eq!(bytes[e_pos], 0x65);
        let declared = u32::from_be_bytes([
            bytes[e_pos + 1],
            bytes[e_pos + 2],
            bytes[e_pos + 3],
            bytes[e_pos + 4],
        ]) as usize;
        assert_eq!(declared, bytes.len() - trailer_start);
    }

    #[test]
    fn habitat_bytes_exclude_evolvable_only_frames() {
        let handler = handler_with_habitat_and_evo();
        let habitat = handler.habitat_bytes().unwrap();
        let reparsed = Xc7BitstreamHandler::from_bytes(&habitat, &part_json()).unwrap();
        let addrs: Vec<u32> = reparsed.frames().map(Frame::addr).collect();
        // 0x80 carried only evolvable bits and is absent from the habitat.
        assert_eq!(addrs, vec![0, 0x81]);
        assert!(reparsed.get_bit(BitPosition::new(0x81, 50, 1)).unwrap());
        // The evolvable overlay at 0x81 is not part of the baseline.
        assert!(!reparsed.get_bit(BitPosition::new(0x81, 20, 12)).unwrap());
    }

    #[test]
    fn partial_bytes_cover_only_the_column_span() {
        let handler = handler_with_habitat_and_evo();
        let bytes = handler.partial_evo_bytes().unwrap();

        let sync = find_sync_word(&bytes).unwrap();
        let packets = decode_packets(&bytes[sync + 4..]).unwrap();
        // The main FAR write seeks the first column address of the span.
        let far = packets
            .iter()
            .find(|p| p.word().register() == Some(Register::Far))
            .unwrap();
        assert_eq!(far.payload(), [0x00, 0x00, 0x00, 0x80]);

        // Column 1 holds 2 frames and ends the top row, so the 2 row
        // padding frames follow; the empirical trailer frame closes the
        // payload.
        let type2 = packets
            .iter()
            .find(|p| p.word().count() as usize >= FRAME_WORDS)
            .unwrap();
        assert_eq!(
            type2.word().count() as usize,
            (2 + 2 + PARTIAL_TRAILER_FRAMES) * FRAME_WORDS
        );
        let frame0 = Frame::from_bytes(0x80, &type2.payload()[..FRAME_BYTES]).unwrap();
        assert!(frame0.get_bit(10, 2));
    }

    #[test]
    fn partial_bytes_require_setup() {
        let handler = Xc7BitstreamHandler::new(IDCODE).unwrap();
        assert!(matches!(
            handler.partial_evo_bytes(),
            Err(BitstreamError::EvolvableRegionNotSetUp)
        ));
        assert!(matches!(
            handler.to_bytes(true),
            Err(BitstreamError::EvolvableRegionNotSetUp)
        ));
    }

    #[test]
    fn full_bytes_require_a_device_table() {
        let handler = Xc7BitstreamHandler::new(IDCODE).unwrap();
        assert!(matches!(
            handler.full_bytes(),
            Err(BitstreamError::NoDeviceTable)
        ));
    }

    #[test]
    fn missing_sync_word_is_an_error() {
        assert!(matches!(
            Xc7BitstreamHandler::from_bytes(&[0u8; 64], &part_json()),
            Err(BitstreamError::MissingSyncWord)
        ));
    }

    #[test]
    fn set_bit_changes_partial_output() {
        let mut handler = handler_with_habitat_and_evo();
        let before = handler.partial_evo_bytes().unwrap();
        handler.set_bit(BitPosition::new(0x80, 33, 31), true).unwrap();
        let after = handler.partial_evo_bytes().unwrap();
        assert_ne!(before, after);
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn empty_habitat_equals_empty_device_image() {
        // A handler whose habitat is empty writes the same baseline as a
        // handler owning no frames at all.
        let mut with_evo = Xc7BitstreamHandler::new(IDCODE).unwrap();
        with_evo
            .setup(&part_json(), &[BitPosition::new(0x80, 10, 2)], Some(&[]))
            .unwrap();
        let mut blank = Xc7BitstreamHandler::new(IDCODE).unwrap();
        blank.setup(&part_json(), &[], Some(&[])).unwrap();
        assert_eq!(with_evo.habitat_bytes().unwrap(), blank.full_bytes().unwrap());
    }

    #[test]
    fn remove_bram_init_packets_strips_four_packets() {
        // Build a stream with a BRAM FAR write followed by 3 packets.
        let bram_far = 0x0080_0000u32;
        let mut packets: Vec<ConfigPacket> = vec![
            nop_packet(),
            crate::header::write_register(Register::Idcode, IDCODE).unwrap(),
            crate::header::set_far(bram_far).unwrap(),
            fdri_write_prep().unwrap(),
            ConfigPacket::new(
                crate::packet::ConfigWord::type2(crate::packet::OpCode::Write, FRAME_WORDS as u32)
                    .unwrap(),
                Frame::from_words(bram_far, vec![Word::new(9); FRAME_WORDS])
                    .unwrap()
                    .to_bytes(),
            )
            .unwrap(),
            nop_packet(),
            crate::header::write_cmd(7).unwrap(),
        ];
        packets.push(nop_packet());

        let payload: Vec<u8> = packets.iter().flat_map(ConfigPacket::to_bytes).collect();
        let input = with_sw_header(payload);

        let output = remove_bram_init_packets(&input, bram_far).unwrap();
        let sync = find_sync_word(&output).unwrap();
        let remaining = decode_packets(&output[sync + 4..]).unwrap();
        // FAR + 3 following packets removed; 4 of the 8 remain.
        assert_eq!(remaining.len(), 4);
        assert_eq!(remaining[0], nop_packet());
        assert_eq!(
            remaining[1],
            crate::header::write_register(Register::Idcode, IDCODE).unwrap()
        );
        assert_eq!(remaining[2], crate::header::write_cmd(7).unwrap());
        assert_eq!(remaining[3], nop_packet());

        // The removed bytes are exactly the 4 packets' encodings.
        let removed: usize = packets[2..6].iter().map(ConfigPacket::encoded_len).sum();
        assert_eq!(output.len(), input.len() - removed);
    }

    #[test]
    fn remove_bram_init_packets_without_match_reheaders_only() {
        let payload: Vec<u8> = [nop_packet(), crate::header::write_cmd(7).unwrap()]
            .iter()
            .flat_map(ConfigPacket::to_bytes)
            .collect();
        let input = with_sw_header(payload.clone());
        let output = remove_bram_init_packets(&input, 0x1234).unwrap();
        assert_eq!(output, with_sw_header(payload));
    }
}
