//! Serial Sensor Stream Protocol Layer
//!
//! This crate turns an unreliable byte stream from a UART-attached sensor
//! into checksum-validated frames. It knows nothing about what the frames
//! mean; decoding into typed records happens in `sensorlink-core`.
//!
//! # Supported framings
//!
//! Binary, marker-prefixed frames with an additive checksum:
//! ```text
//! ┌──────┬──────┬────────┬─────────────┬─────────┬─────────┐
//! │ 0x42 │ 0x4D │ LENGTH │ PAYLOAD     │ SUM_HI  │ SUM_LO  │
//! │ 1B   │ 1B   │ 2B BE  │ LENGTH - 2  │ 1B      │ 1B      │
//! └──────┴──────┴────────┴─────────────┴─────────┴─────────┘
//! ```
//!
//! Text, delimiter-terminated sentences with an XOR checksum:
//! ```text
//! $<talker><id>,<field1>,...,<fieldN>*<XX>\r\n
//! ```
//!
//! # Pipeline
//!
//! [`FrameSynchronizer`] hunts for the start pattern and collects one
//! [`RawFrame`]; [`Checksum::validate`] checks it and yields the payload.
//! A rejected frame is handed back to the synchronizer with
//! [`FrameSynchronizer::rescan`] so scanning resumes at the byte after the
//! rejected frame's first byte.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod checksum;
pub mod command;
pub mod framing;
pub mod sync;

pub use checksum::{Checksum, ChecksumError};
pub use command::{encode_command, encode_command_to_vec, CommandError, MAX_COMMAND_LEN};
pub use framing::{
    read_be, FrameLength, Framing, FramingError, RawFrame, MAX_FRAME_LEN, MAX_START_LEN,
};
pub use sync::{FrameSynchronizer, ResyncReason, SyncError};
