//! Relative bit positions from segbit databases and tile grids.

use crate::feature::FasmError;
use serde::{Deserialize, Serialize};

/// A bit position relative to a tile, as listed in a segbit database.
///
/// `frame_offset` selects the frame relative to the tile's base address;
/// `bit_idx` is the flat bit index within the tile's word window (word and
/// in-word bit are recovered against an [`ElementPosition`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegBitPosition {
    /// Frame offset relative to the tile's base frame address.
    pub frame_offset: u32,
    /// Flat bit index within the tile's configuration window.
    pub bit_idx: u32,
}

impl SegBitPosition {
    /// Parses a segbit entry of the form `<frame>_<bit>`, e.g. `28_511`.
    ///
    /// A leading `!` (inversion marker) is accepted and ignored here; the
    /// template parser records the inversion separately.
    pub fn from_segbit_str(s: &str) -> Result<Self, FasmError> {
        let trimmed = s.trim().trim_start_matches('!');
        let (frame, bit) = trimmed
            .split_once('_')
            .ok_or_else(|| FasmError::BadSegbit(s.to_string()))?;
        let frame_offset = frame
            .parse()
            .map_err(|_| FasmError::BadSegbit(s.to_string()))?;
        let bit_idx = bit
            .parse()
            .map_err(|_| FasmError::BadSegbit(s.to_string()))?;
        Ok(Self {
            frame_offset,
            bit_idx,
        })
    }
}

/// The physical position of a tile in the configuration address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPosition {
    /// Grid x coordinate of the tile.
    pub x: u32,
    /// Grid y coordinate of the tile.
    pub y: u32,
    /// First frame word occupied by the tile.
    pub offset: u32,
    /// Base frame address of the tile's column.
    pub base_addr: u32,
}

/// A tile coordinate in the Xilinx `X<n>Y<m>` naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XilinxCoord {
    /// X coordinate.
    pub x: u32,
    /// Y coordinate.
    pub y: u32,
}

impl XilinxCoord {
    /// Extracts the coordinate from a tile name such as `CLBLM_R_X13Y37`.
    pub fn from_tile_name(name: &str) -> Result<Self, FasmError> {
        let err = || FasmError::BadTileName(name.to_string());
        let coord = name.rsplit('_').next().ok_or_else(err)?;
        let rest = coord.strip_prefix('X').ok_or_else(err)?;
        let (x, y) = rest.split_once('Y').ok_or_else(err)?;
        Ok(Self {
            x: x.parse().map_err(|_| err())?,
            y: y.parse().map_err(|_| err())?,
        })
    }
}
