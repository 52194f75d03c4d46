//! Part description loading.
//!
//! A part description is the prjxray-style JSON document that lists, per
//! global clock-region half and row, the frame counts of the CLB/IO/CLK and
//! BLOCK_RAM configuration buses for every configuration column. Only the
//! frame counts are consumed here; everything else in the document is
//! ignored.

use crate::error::DeviceError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Number of block-type tables carried by the frame address space.
///
/// Block type 0 is the CLB/IO/CLK bus, block type 1 is BRAM content, and
/// block type 2 is reserved (its table stays empty).
pub const BLOCK_TYPES: usize = 3;

#[derive(Debug, Deserialize)]
struct PartDescription {
    global_clock_regions: GlobalClockRegions,
}

#[derive(Debug, Deserialize)]
struct GlobalClockRegions {
    top: ClockRegionHalf,
    bottom: ClockRegionHalf,
}

#[derive(Debug, Deserialize)]
struct ClockRegionHalf {
    rows: BTreeMap<String, RowDescription>,
}

#[derive(Debug, Deserialize)]
struct RowDescription {
    configuration_buses: ConfigurationBuses,
}

#[derive(Debug, Deserialize)]
struct ConfigurationBuses {
    #[serde(rename = "CLB_IO_CLK")]
    clb_io_clk: ConfigurationBus,
    #[serde(rename = "BLOCK_RAM")]
    block_ram: ConfigurationBus,
}

#[derive(Debug, Deserialize)]
struct ConfigurationBus {
    configuration_columns: BTreeMap<String, ColumnDescription>,
}

#[derive(Debug, Deserialize)]
struct ColumnDescription {
    frame_count: u32,
}

/// The per-device frame-count table backing frame address enumeration.
///
/// Indexed as `block type -> half (0 = top, 1 = bottom) -> row -> column`,
/// storing the maximum minor (frame count minus one) of each configuration
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCountTable {
    counts: Vec<Vec<Vec<Vec<u32>>>>,
}

impl FrameCountTable {
    /// Builds a table from per-bus row tables.
    ///
    /// Each argument holds `[top, bottom]` rows of per-column *maximum minor*
    /// values (frame count minus one). Every half must carry at least one
    /// row and every row at least one column; the address walk has no
    /// meaning over an empty half.
    pub fn new(
        clb_io_clk: [Vec<Vec<u32>>; 2],
        block_ram: [Vec<Vec<u32>>; 2],
    ) -> Result<Self, DeviceError> {
        let counts = vec![clb_io_clk.to_vec(), block_ram.to_vec(), vec![]];
        let dense = counts[..2].iter().flatten().all(|rows| {
            !rows.is_empty() && rows.iter().all(|columns| !columns.is_empty())
        });
        if !dense {
            return Err(DeviceError::EmptyTable);
        }
        Ok(Self { counts })
    }

    /// Parses a table from the JSON content of a part description.
    pub fn from_part_json(content: &str) -> Result<Self, DeviceError> {
        let part: PartDescription = serde_json::from_str(content)?;
        let (top_clb, top_bram) = rows_from_half(&part.global_clock_regions.top)?;
        let (bot_clb, bot_bram) = rows_from_half(&part.global_clock_regions.bottom)?;
        Self::new([top_clb, bot_clb], [top_bram, bot_bram])
    }

    /// Reads and parses a part description file.
    pub fn from_part_file(path: &Path) -> Result<Self, DeviceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_part_json(&content)
    }

    /// Returns the number of rows of a block type's clock-region half.
    pub fn row_count(&self, block_type: usize, is_bottom: usize) -> usize {
        self.counts
            .get(block_type)
            .and_then(|halves| halves.get(is_bottom))
            .map_or(0, Vec::len)
    }

    /// Returns the number of configuration columns in a row.
    pub fn column_count(&self, block_type: usize, is_bottom: usize, row: usize) -> usize {
        self.counts
            .get(block_type)
            .and_then(|halves| halves.get(is_bottom))
            .and_then(|rows| rows.get(row))
            .map_or(0, Vec::len)
    }

    /// Returns the maximum minor of a configuration column, if it exists.
    pub fn max_minor(
        &self,
        block_type: usize,
        is_bottom: usize,
        row: usize,
        column: usize,
    ) -> Option<u32> {
        self.counts
            .get(block_type)
            .and_then(|halves| halves.get(is_bottom))
            .and_then(|rows| rows.get(row))
            .and_then(|columns| columns.get(column))
            .copied()
    }

    /// Returns the total number of frame addresses the device exposes.
    ///
    /// This is the sum of `max minor + 1` over every configuration column of
    /// every block type, and equals the number of addresses the
    /// [`FrameAddressGenerator`](crate::FrameAddressGenerator) yields between
    /// `reset()` and exhaustion.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .map(|&max_minor| u64::from(max_minor) + 1)
            .sum()
    }
}

/// Converts one clock-region half into (CLB/IO/CLK, BLOCK_RAM) row tables.
fn rows_from_half(half: &ClockRegionHalf) -> Result<(Vec<Vec<u32>>, Vec<Vec<u32>>), DeviceError> {
    let mut clb_rows = vec![None; half.rows.len()];
    let mut bram_rows = vec![None; half.rows.len()];

    for (key, row) in &half.rows {
        let idx = parse_table_index(key, half.rows.len())?;
        clb_rows[idx] = Some(columns_from_bus(&row.configuration_buses.clb_io_clk, idx)?);
        bram_rows[idx] = Some(columns_from_bus(&row.configuration_buses.block_ram, idx)?);
    }

    // Duplicate keys are impossible in a map, so a full table means every
    // index in 0..len appeared exactly once.
    let clb = clb_rows.into_iter().collect::<Option<Vec<_>>>();
    let bram = bram_rows.into_iter().collect::<Option<Vec<_>>>();
    match (clb, bram) {
        (Some(clb), Some(bram)) => Ok((clb, bram)),
        _ => Err(DeviceError::EmptyTable),
    }
}

/// Converts one configuration bus into its per-column max-minor list.
fn columns_from_bus(bus: &ConfigurationBus, row: usize) -> Result<Vec<u32>, DeviceError> {
    let mut columns = vec![None; bus.configuration_columns.len()];
    for (key, column) in &bus.configuration_columns {
        let idx = parse_table_index(key, bus.configuration_columns.len())?;
        if column.frame_count == 0 {
            return Err(DeviceError::EmptyColumn { row, column: idx });
        }
        columns[idx] = Some(column.frame_count - 1);
    }
    columns
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(DeviceError::EmptyTable)
}

/// Parses a row/column object key as a dense index into a table of `len`.
fn parse_table_index(key: &str, len: usize) -> Result<usize, DeviceError> {
    key.parse::<usize>()
        .ok()
        .filter(|&idx| idx < len)
        .ok_or_else(|| DeviceError::BadTableIndex(key.to_string()))
}
