//! Core functionality for rapid property-based testing.
//!
//! This crate provides the entropy layer that generators draw from: a fast
//! seeded PRNG, random and replaying bitstreams, and the group recorder whose
//! pruning drives integrated shrinking.

pub mod data;
pub mod error;
pub mod gen;
pub mod prng;
pub mod recorder;
pub mod stream;

// Re-export the main types
pub use data::*;
pub use error::*;
pub use gen::*;
pub use prng::*;
pub use recorder::*;
pub use stream::*;
