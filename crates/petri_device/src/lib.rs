//! Device model for Xilinx 7-Series configuration.
//!
//! This crate knows how a 7-Series part lays out its configuration memory:
//! it parses the per-part frame-count description into a
//! [`FrameCountTable`], enumerates every legal frame address in physical
//! order with the [`FrameAddressGenerator`], and derives column-granular
//! address domains for evolvable regions. It also defines the [`Flasher`]
//! interface through which assembled bitstreams reach a physical device.

#![warn(missing_docs)]

pub mod addr;
pub mod error;
pub mod flash;
pub mod part;

pub use addr::{EvoRegionAddrDomain, FrameAddressGenerator, FrameRange};
pub use error::DeviceError;
pub use flash::{FlashError, Flasher};
pub use part::FrameCountTable;
