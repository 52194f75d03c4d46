//! Feature tree nodes.

use crate::segbit::{ElementPosition, SegBitPosition};
use petri_common::BitPosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while parsing FASM feature data.
#[derive(Debug, thiserror::Error)]
pub enum FasmError {
    /// A segbit entry could not be parsed.
    #[error("malformed segbit entry {0:?}")]
    BadSegbit(String),

    /// A tile name carried no parsable coordinate.
    #[error("tile name {0:?} carries no X<n>Y<m> coordinate")]
    BadTileName(String),

    /// A feature template line was empty.
    #[error("feature template line has no feature name")]
    EmptyTemplate,
}

/// A node of the feature tree.
///
/// Leaves are the only nodes carrying bit positions; no other variants exist
/// within the bitstream core's scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// A leaf feature with resolved bit positions.
    Leaf(LeafFeature),
}

impl Feature {
    /// Returns the feature's name.
    pub fn name(&self) -> &str {
        match self {
            Feature::Leaf(leaf) => &leaf.name,
        }
    }
}

/// A leaf of the feature tree: a named set of configuration bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafFeature {
    /// Feature name as it appears in FASM output.
    pub name: String,
    /// Absolute positions of the feature's bits.
    pub positions: Vec<BitPosition>,
    /// Whether each position is inverted (active-low) in the feature.
    pub inverted: BTreeMap<BitPosition, bool>,
}

/// A leaf feature before placement: segbits relative to a tile template.
///
/// Instantiating the template against a concrete tile position yields a
/// [`LeafFeature`] with absolute bit positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLeafFeature {
    /// Feature name.
    pub name: String,
    /// Tile-relative segbit positions.
    pub positions: Vec<SegBitPosition>,
    /// Per-position inversion flags, parallel to `positions`.
    pub inverted: Vec<bool>,
}

impl TemplateLeafFeature {
    /// Parses a segbit database line: a feature name followed by segbit
    /// entries, inverted entries prefixed with `!`.
    ///
    /// Example: `CLB.SLICE.AFF.ZINI 31_15 !31_14`.
    pub fn from_template_str(line: &str) -> Result<Self, FasmError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(FasmError::EmptyTemplate)?.to_string();

        let mut positions = Vec::new();
        let mut inverted = Vec::new();
        for entry in parts {
            inverted.push(entry.starts_with('!'));
            positions.push(SegBitPosition::from_segbit_str(entry)?);
        }

        Ok(Self {
            name,
            positions,
            inverted,
        })
    }

    /// Resolves the template against a tile position into absolute bits.
    pub fn instantiate(&self, element: &ElementPosition) -> LeafFeature {
        let positions: Vec<BitPosition> = self
            .positions
            .iter()
            .map(|segbit| {
                BitPosition::new(
                    element.base_addr + segbit.frame_offset,
                    element.offset + segbit.bit_idx / 32,
                    segbit.bit_idx % 32,
                )
            })
            .collect();
        let inverted = positions
            .iter()
            .copied()
            .zip(self.inverted.iter().copied())
            .collect();

        LeafFeature {
            name: self.name.clone(),
            positions,
            inverted,
        }
    }
}
