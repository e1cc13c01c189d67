//! Frame layout descriptions and the raw frame buffer.
//!
//! A [`Framing`] says how one frame is delimited on the wire:
//! - START: 1-4 byte synchronization pattern
//! - LENGTH: fixed total, a big-endian length field, or a line terminator
//! - CHECKSUM: which [`Checksum`] strategy guards the frame

use heapless::Vec;

use crate::checksum::Checksum;

/// Maximum complete frame size (NMEA caps sentences at 82 characters)
pub const MAX_FRAME_LEN: usize = 128;

/// Maximum start pattern length
pub const MAX_START_LEN: usize = 4;

/// Line terminator for text framing
pub const LINE_END: u8 = b'\n';

/// How the length of a frame is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameLength {
    /// Every frame has the same total length (start + payload + checksum)
    Fixed(usize),
    /// A big-endian field of `width` bytes directly after the start pattern
    /// counts the bytes that follow it, checksum included
    LengthField { width: usize },
    /// Frame ends at a `\n`; longer lines are abandoned
    Line { max_len: usize },
}

/// Errors in a framing description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingError {
    /// Start pattern is empty
    EmptyStart,
    /// Start pattern exceeds [`MAX_START_LEN`]
    StartTooLong,
    /// Declared length can never hold start pattern and checksum
    LengthTooSmall,
    /// Declared length exceeds [`MAX_FRAME_LEN`]
    LengthTooLarge,
    /// Length field must be one or two bytes wide
    BadLengthWidth,
}

/// Static description of how frames are delimited on one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Framing {
    /// Synchronization pattern every frame begins with
    pub start: &'static [u8],
    /// Length rule
    pub length: FrameLength,
    /// Integrity check
    pub checksum: Checksum,
}

impl Framing {
    /// Check that the description is usable
    pub fn check(&self) -> Result<(), FramingError> {
        if self.start.is_empty() {
            return Err(FramingError::EmptyStart);
        }
        if self.start.len() > MAX_START_LEN {
            return Err(FramingError::StartTooLong);
        }

        let min_len = self.start.len() + self.checksum.min_trailer_len();
        match self.length {
            FrameLength::Fixed(total) | FrameLength::Line { max_len: total } => {
                if total > MAX_FRAME_LEN {
                    return Err(FramingError::LengthTooLarge);
                }
                if total < min_len {
                    return Err(FramingError::LengthTooSmall);
                }
            }
            FrameLength::LengthField { width } => {
                if width == 0 || width > 2 {
                    return Err(FramingError::BadLengthWidth);
                }
                if min_len + width > MAX_FRAME_LEN {
                    return Err(FramingError::LengthTooLarge);
                }
            }
        }
        Ok(())
    }

    /// Total length implied by the bytes collected so far
    ///
    /// Returns `None` if `raw` is too short to tell, or (for line framing)
    /// if it is not terminated.
    pub fn total_length(&self, raw: &[u8]) -> Option<usize> {
        match self.length {
            FrameLength::Fixed(total) => Some(total),
            FrameLength::LengthField { width } => {
                let field = raw.get(self.start.len()..self.start.len() + width)?;
                Some(self.start.len() + width + read_be(field) as usize)
            }
            FrameLength::Line { .. } => raw
                .iter()
                .position(|&b| b == LINE_END)
                .map(|pos| pos + 1),
        }
    }
}

/// Read a big-endian unsigned integer of up to 4 bytes
pub fn read_be(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// One candidate frame as collected from the stream
///
/// Holds the start pattern, payload and checksum bytes of exactly one
/// synchronization attempt. Discarded after the decode attempt whatever
/// its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl RawFrame {
    /// Create an empty frame buffer
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Copy a complete frame from a slice
    ///
    /// Returns `None` if `bytes` exceeds [`MAX_FRAME_LEN`].
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes).ok().map(|bytes| Self { bytes })
    }

    /// Append a byte; `false` if the buffer is full
    pub fn push(&mut self, byte: u8) -> bool {
        self.bytes.push(byte).is_ok()
    }

    /// Append a slice; `false` (and nothing appended) if it does not fit
    pub fn extend(&mut self, bytes: &[u8]) -> bool {
        self.bytes.extend_from_slice(bytes).is_ok()
    }

    /// Frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether no bytes have been collected
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
