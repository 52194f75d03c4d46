//! Frame address enumeration.
//!
//! 7-Series frame addresses pack five fields:
//!
//! ```text
//! [25:23] block type   (0 = CLB/IO/CLK, 1 = BRAM content, 2 reserved)
//! [22]    bottom half of the device
//! [21:17] clock-region row
//! [16:7]  configuration column
//! [6:0]   minor (frame offset within the column)
//! ```
//!
//! The order in which the hardware visits addresses is dictated by the
//! silicon layout, not by address arithmetic: minors within a column,
//! columns within a row, rows within a half, top half before bottom half,
//! CLB/IO/CLK before BRAM content. [`FrameAddressGenerator`] walks exactly
//! that order, driven by the per-device [`FrameCountTable`].

use crate::error::DeviceError;
use crate::part::FrameCountTable;
use serde::{Deserialize, Serialize};

/// Shift of the block type field within a frame address.
const BLOCK_TYPE_SHIFT: u32 = 23;
/// Shift of the bottom-half flag within a frame address.
const IS_BOTTOM_SHIFT: u32 = 22;
/// Shift of the row field within a frame address.
const ROW_SHIFT: u32 = 17;
/// Shift of the column field within a frame address.
const COLUMN_SHIFT: u32 = 7;
/// Mask of the row field (5 bits).
const ROW_MASK: u32 = (1 << 5) - 1;
/// Mask of the column field (10 bits).
const COLUMN_MASK: u32 = (1 << 10) - 1;
/// Mask of the minor field (7 bits).
const MINOR_MASK: u32 = (1 << 7) - 1;
/// Block types beyond this value do not exist on 7-Series devices.
const BLOCK_TYPE_LIMIT: u32 = 3;
/// Highest block type the generator walks; type 2 is reserved and empty.
const LAST_WALKED_BLOCK_TYPE: usize = 1;

/// A stateful cursor over every legal frame address of a device.
///
/// `next()` yields addresses in strictly ascending numeric order and returns
/// `None` once the address space is exhausted. After each yield,
/// [`padding_frames_needed`](Self::padding_frames_needed) reports whether the
/// cursor just crossed a row boundary; the hardware requires consumers to
/// account for 2 physical padding frames at every such crossing.
///
/// The cursor is not reentrant: interleaved traversals need either separate
/// generators or explicit `reset()`/`set_start()` discipline.
#[derive(Debug, Clone)]
pub struct FrameAddressGenerator {
    table: FrameCountTable,
    block_type: usize,
    is_bottom: usize,
    row: usize,
    column: usize,
    minor: u32,
    finished: bool,
    padding_frames_needed: bool,
}

impl FrameAddressGenerator {
    /// Creates a generator positioned at the first address of the device.
    pub fn new(table: FrameCountTable) -> Self {
        Self {
            table,
            block_type: 0,
            is_bottom: 0,
            row: 0,
            column: 0,
            minor: 0,
            finished: false,
            padding_frames_needed: false,
        }
    }

    /// Creates a generator from the JSON content of a part description.
    pub fn from_part_json(content: &str) -> Result<Self, DeviceError> {
        Ok(Self::new(FrameCountTable::from_part_json(content)?))
    }

    /// Returns the frame-count table backing this generator.
    pub fn table(&self) -> &FrameCountTable {
        &self.table
    }

    /// Returns the total number of addresses a full traversal yields.
    pub fn total(&self) -> u64 {
        self.table.total()
    }

    /// Returns whether the traversal has run past the last address.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Returns whether the last advance crossed a row boundary.
    ///
    /// 2 padding frames follow every row of frame data in the configuration
    /// payload; this flag tells consumers when to emit or skip them.
    pub fn padding_frames_needed(&self) -> bool {
        self.padding_frames_needed
    }

    /// Moves the cursor back to the first address of the device.
    pub fn reset(&mut self) {
        self.block_type = 0;
        self.is_bottom = 0;
        self.row = 0;
        self.column = 0;
        self.minor = 0;
        self.finished = false;
        self.padding_frames_needed = false;
    }

    /// Returns the address under the cursor without advancing.
    pub fn current_addr(&self) -> Option<u32> {
        if self.finished {
            return None;
        }
        Some(
            (self.block_type as u32) << BLOCK_TYPE_SHIFT
                | (self.is_bottom as u32) << IS_BOTTOM_SHIFT
                | (self.row as u32) << ROW_SHIFT
                | (self.column as u32) << COLUMN_SHIFT
                | self.minor,
        )
    }

    /// Returns the first address of the column under the cursor.
    pub fn first_addr_of_current_column(&self) -> Option<u32> {
        self.current_addr().map(|addr| addr & !MINOR_MASK)
    }

    /// Returns the last address of the column under the cursor.
    pub fn last_addr_of_current_column(&self) -> Option<u32> {
        let first = self.first_addr_of_current_column()?;
        let max_minor =
            self.table
                .max_minor(self.block_type, self.is_bottom, self.row, self.column)?;
        Some(first | max_minor)
    }

    /// Seeks the cursor to an arbitrary frame address.
    ///
    /// Every field of the address is validated against the device table;
    /// out-of-range fields are decode errors. Seeking clears both the
    /// `finished` and the padding flag (a seek never lands on a row
    /// crossing).
    pub fn set_start(&mut self, start: u32) -> Result<(), DeviceError> {
        let block_type = start >> BLOCK_TYPE_SHIFT;
        if block_type >= BLOCK_TYPE_LIMIT {
            return Err(DeviceError::InvalidBlockType {
                addr: start,
                block_type,
            });
        }
        let is_bottom = start >> IS_BOTTOM_SHIFT & 1;
        let row = start >> ROW_SHIFT & ROW_MASK;
        if row as usize >= self.table.row_count(block_type as usize, is_bottom as usize) {
            return Err(DeviceError::InvalidRow { addr: start, row });
        }
        let column = start >> COLUMN_SHIFT & COLUMN_MASK;
        let column_count =
            self.table
                .column_count(block_type as usize, is_bottom as usize, row as usize);
        if column as usize >= column_count {
            return Err(DeviceError::InvalidColumn {
                addr: start,
                column,
            });
        }
        let minor = start & MINOR_MASK;
        let max_minor = self
            .table
            .max_minor(
                block_type as usize,
                is_bottom as usize,
                row as usize,
                column as usize,
            )
            .ok_or(DeviceError::InvalidColumn {
                addr: start,
                column,
            })?;
        if minor > max_minor {
            return Err(DeviceError::InvalidMinor { addr: start, minor });
        }

        self.block_type = block_type as usize;
        self.is_bottom = is_bottom as usize;
        self.row = row as usize;
        self.column = column as usize;
        self.minor = minor;
        self.finished = false;
        self.padding_frames_needed = false;
        Ok(())
    }

    /// Advances the cursor by one address in physical order.
    fn advance(&mut self) {
        self.padding_frames_needed = false;

        let max_minor = self
            .table
            .max_minor(self.block_type, self.is_bottom, self.row, self.column)
            .unwrap_or(0);
        if self.minor < max_minor {
            self.minor += 1;
            return;
        }
        self.minor = 0;

        if self.column + 1 < self.table.column_count(self.block_type, self.is_bottom, self.row) {
            self.column += 1;
            return;
        }
        self.column = 0;

        // Row crossing: the hardware wants 2 padding frames here.
        self.padding_frames_needed = true;
        if self.row + 1 < self.table.row_count(self.block_type, self.is_bottom) {
            self.row += 1;
            return;
        }
        self.row = 0;

        if self.is_bottom == 0 {
            self.is_bottom = 1;
            return;
        }
        self.is_bottom = 0;

        if self.block_type < LAST_WALKED_BLOCK_TYPE {
            self.block_type += 1;
            return;
        }
        self.finished = true;
    }
}

impl Iterator for FrameAddressGenerator {
    type Item = u32;

    /// Yields the address under the cursor, then advances.
    fn next(&mut self) -> Option<u32> {
        let addr = self.current_addr()?;
        self.advance();
        Some(addr)
    }
}

/// A contiguous, inclusive range of frame addresses within one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    /// First address of the range.
    pub start: u32,
    /// Last address of the range, inclusive.
    pub stop: u32,
}

impl FrameRange {
    /// Returns whether the range contains the given address.
    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr <= self.stop
    }
}

/// The column-granular address domain of an evolvable region.
///
/// Holds one inclusive [`FrameRange`] per physical configuration column
/// touched by a set of frame addresses. Partial reconfiguration is
/// column-granular at the hardware level, so a region always covers whole
/// columns even when only a few frames in them carry evolvable bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvoRegionAddrDomain {
    frame_ranges: Vec<FrameRange>,
}

impl EvoRegionAddrDomain {
    /// Derives the domain covering the columns touched by `addrs`.
    pub fn from_addrs(
        addrs: impl IntoIterator<Item = u32>,
        table: &FrameCountTable,
    ) -> Result<Self, DeviceError> {
        let mut sorted: Vec<u32> = addrs.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut cursor = FrameAddressGenerator::new(table.clone());
        let mut frame_ranges: Vec<FrameRange> = Vec::new();
        for addr in sorted {
            if frame_ranges.iter().any(|r| r.contains(addr)) {
                continue;
            }
            cursor.set_start(addr)?;
            if let (Some(start), Some(stop)) = (
                cursor.first_addr_of_current_column(),
                cursor.last_addr_of_current_column(),
            ) {
                frame_ranges.push(FrameRange { start, stop });
            }
        }
        Ok(Self { frame_ranges })
    }

    /// Returns the per-column ranges of this domain.
    pub fn ranges(&self) -> &[FrameRange] {
        &self.frame_ranges
    }

    /// Returns whether the domain contains the given address.
    pub fn contains(&self, addr: u32) -> bool {
        self.frame_ranges.iter().any(|r| r.contains(addr))
    }

    /// Returns the addresses of each range, one list per column.
    pub fn relevant_addrs(&self) -> Vec<Vec<u32>> {
        self.frame_ranges
            .iter()
            .map(|r| (r.start..=r.stop).collect())
            .collect()
    }

    /// Returns every address of the domain as one flat ascending list.
    pub fn relevant_addrs_flat(&self) -> Vec<u32> {
        let mut addrs: Vec<u32> = self.frame_ranges.iter().flat_map(|r| r.start..=r.stop).collect();
        addrs.sort_unstable();
        addrs
    }
}
