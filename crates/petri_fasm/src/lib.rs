//! FASM feature model.
//!
//! Features are the named nodes of a design's feature tree; only leaf
//! features carry configuration bit positions. This crate turns segbit
//! database entries plus tile positions into absolute
//! [`BitPosition`](petri_common::BitPosition) lists; the bitstream core
//! consumes those lists without interpreting feature names.

#![warn(missing_docs)]

pub mod feature;
pub mod segbit;

pub use feature::{Feature, FasmError, LeafFeature, TemplateLeafFeature};
pub use segbit::{ElementPosition, SegBitPosition, XilinxCoord};
