//! Board-agnostic sensor stream decoding
//!
//! This crate contains everything between a validated frame and the
//! consumers of sensor readings, independent of any UART implementation:
//!
//! - Typed records for the known frame kinds (particulate, GPS)
//! - Field layouts and the table-driven frame decoder
//! - The shared sensor state store (latest record + rolling average)
//! - The per-source read loop state machine
//! - Configuration type definitions
//!
//! # Data flow
//!
//! ```text
//! ByteSource → FrameSynchronizer → Checksum → FrameDecoder → SensorStateStore
//!                         └───────── ReadLoop (one per source) ─────────┘
//! ```
//!
//! Consumers only ever see [`store::SensorStateStore`]; raw bytes and
//! recoverable protocol errors never leave the read loop.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod decode;
pub mod record;
pub mod runtime;
#[cfg(feature = "serde")]
pub mod snapshot;
pub mod store;
