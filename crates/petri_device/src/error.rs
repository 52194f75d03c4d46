//! Error types for part descriptions and frame addressing.

/// Errors raised while loading a part description or decoding frame addresses.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// An I/O error occurred while reading the part description file.
    #[error("failed to read part description: {0}")]
    Io(#[from] std::io::Error),

    /// The part description JSON could not be parsed.
    #[error("failed to parse part description: {0}")]
    Json(#[from] serde_json::Error),

    /// A row or column key was not a dense non-negative integer index.
    #[error("part description key {0:?} is not a dense row/column index")]
    BadTableIndex(String),

    /// A configuration column declared zero frames.
    #[error("configuration column {column} in row {row} declares zero frames")]
    EmptyColumn {
        /// Row index within the clock-region half.
        row: usize,
        /// Column index within the row.
        column: usize,
    },

    /// A clock-region half or row contained no configuration columns at all.
    #[error("part description contains an empty frame-count table")]
    EmptyTable,

    /// The block type field of a frame address is outside the known range.
    #[error("block type {block_type} of address {addr:#010x} is not addressable")]
    InvalidBlockType {
        /// The offending address.
        addr: u32,
        /// Decoded block type field.
        block_type: u32,
    },

    /// The row field of a frame address exceeds the device's row count.
    #[error("row {row} of address {addr:#010x} is out of range")]
    InvalidRow {
        /// The offending address.
        addr: u32,
        /// Decoded row field.
        row: u32,
    },

    /// The column field of a frame address exceeds the row's column count.
    #[error("column {column} of address {addr:#010x} is out of range")]
    InvalidColumn {
        /// The offending address.
        addr: u32,
        /// Decoded column field.
        column: u32,
    },

    /// The minor field of a frame address exceeds the column's frame count.
    #[error("minor {minor} of address {addr:#010x} exceeds the column frame count")]
    InvalidMinor {
        /// The offending address.
        addr: u32,
        /// Decoded minor field.
        minor: u32,
    },
}
