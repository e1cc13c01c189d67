//! Per-source runtime
//!
//! One [`ReadLoop`] per byte source drives synchronizer, checksum, decoder
//! and store in turn. The loop is cooperative: it only suspends inside
//! source reads and the inter-frame sleep.

mod read_loop;
mod stats;

pub use read_loop::{LoopPhase, LoopState, ReadLoop, Step};
pub use stats::LinkStats;
