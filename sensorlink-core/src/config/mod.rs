//! Configuration types
//!
//! Board-agnostic source and channel configuration, storable as postcard
//! binary data by the bootstrap layer.

pub mod types;

pub use types::*;
