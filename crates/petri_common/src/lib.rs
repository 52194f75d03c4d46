//! Shared foundational types for the petri bitstream toolkit.
//!
//! This crate provides the 32-bit configuration word cell used throughout
//! frame and packet handling, and the absolute bit-position type that
//! identifies a single configuration-memory bit on a 7-Series device.

#![warn(missing_docs)]

pub mod position;
pub mod word;

pub use position::{BitPosition, PositionParseError};
pub use word::{Word, WordParseError};
