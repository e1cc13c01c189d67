//! Sensorlink Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the stream decoding
//! crates are written against. Chip-specific code (the firmware crate, or a
//! host tool reading a serial port) implements them; the decoding logic never
//! touches a peripheral directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  sensorlink-core (ReadLoop, store)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sensorlink-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  embassy-rp   │       │  SliceSource  │
//! │  UART adapter │       │  (in memory)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::ByteSource`] - Bounded, cancellable reads from a serial link
//! - [`clock::Clock`] - Monotonic millisecond timestamps

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod memory;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use memory::SliceSource;
pub use uart::{ByteSource, FaultKind, SourceError, UartSettings};
