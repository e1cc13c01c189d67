//! Frame checksum strategies
//!
//! Two interchangeable strategies, selected per [`Framing`]:
//! - Additive 16-bit sum (binary frames): sum of every byte before the
//!   trailing two, truncated to 16 bits, compared with the big-endian trailer
//! - XOR of characters (text sentences): XOR of every byte between `$` and
//!   `*`, compared with the two hex digits after `*`

use core::ops::Range;

use crate::framing::{Framing, RawFrame};

/// Checksum strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Checksum {
    /// 16-bit additive sum in the last two bytes, big-endian
    Additive16,
    /// NMEA `*XX` XOR checksum before the line terminator
    NmeaXor,
}

/// Reasons a frame fails validation
///
/// Never fatal: the caller discards the frame and resumes scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumError {
    /// Computed and transmitted checksums differ
    Mismatch { computed: u16, received: u16 },
    /// Checksum delimiter, hex digits or terminator missing
    Structure,
    /// Frame length disagrees with the framing
    Length,
}

impl Checksum {
    /// Smallest number of bytes the checksum adds after the payload
    pub const fn min_trailer_len(self) -> usize {
        match self {
            Checksum::Additive16 => 2,
            // "*XX\n"
            Checksum::NmeaXor => 4,
        }
    }

    /// Validate a collected frame and return its payload
    ///
    /// For additive frames the payload is everything between the start
    /// pattern and the checksum. For text sentences it is everything between
    /// the leading `$` and the `*` (talker and sentence id included).
    pub fn validate<'a>(
        self,
        framing: &Framing,
        raw: &'a RawFrame,
    ) -> Result<&'a [u8], ChecksumError> {
        let range = self.payload_range(framing, raw)?;
        Ok(&raw.as_bytes()[range])
    }

    /// Validate a collected frame and return where its payload lies
    pub fn payload_range(
        self,
        framing: &Framing,
        raw: &RawFrame,
    ) -> Result<Range<usize>, ChecksumError> {
        let bytes = raw.as_bytes();
        if framing.total_length(bytes) != Some(bytes.len()) {
            return Err(ChecksumError::Length);
        }
        if !bytes.starts_with(framing.start) {
            return Err(ChecksumError::Structure);
        }

        match self {
            Checksum::Additive16 => validate_additive(framing.start.len(), bytes),
            Checksum::NmeaXor => validate_nmea(bytes),
        }
    }

    /// 16-bit wrapping sum of `bytes`
    pub fn additive16(bytes: &[u8]) -> u16 {
        bytes
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
    }

    /// XOR of `bytes`
    pub fn xor8(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |acc, &b| acc ^ b)
    }
}

fn validate_additive(start_len: usize, bytes: &[u8]) -> Result<Range<usize>, ChecksumError> {
    if bytes.len() < start_len + 2 {
        return Err(ChecksumError::Length);
    }
    let split = bytes.len() - 2;
    let computed = Checksum::additive16(&bytes[..split]);
    let received = u16::from_be_bytes([bytes[split], bytes[split + 1]]);

    if computed != received {
        return Err(ChecksumError::Mismatch { computed, received });
    }
    Ok(start_len..split)
}

fn validate_nmea(bytes: &[u8]) -> Result<Range<usize>, ChecksumError> {
    let end = if bytes.ends_with(b"\r\n") {
        bytes.len() - 2
    } else if bytes.ends_with(b"\n") {
        bytes.len() - 1
    } else {
        return Err(ChecksumError::Structure);
    };

    // '$' + at least one body byte + "*XX"
    if end < 5 || bytes[end - 3] != b'*' {
        return Err(ChecksumError::Structure);
    }

    let received = match (hex_nibble(bytes[end - 2]), hex_nibble(bytes[end - 1])) {
        (Some(hi), Some(lo)) => (hi << 4) | lo,
        _ => return Err(ChecksumError::Structure),
    };

    let body = 1..end - 3;
    let computed = Checksum::xor8(&bytes[body.clone()]);
    if computed != received {
        return Err(ChecksumError::Mismatch {
            computed: u16::from(computed),
            received: u16::from(received),
        });
    }
    Ok(body)
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
