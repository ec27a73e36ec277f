//! rapid property-based testing library.
//!
//! This is the main entry point for rapid, re-exporting the bitstreams,
//! recorder and generator boundary from `rapid-core`.

pub use rapid_core::*;
