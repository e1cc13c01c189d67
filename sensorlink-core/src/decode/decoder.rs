//! Frame decoder
//!
//! Holds the frame kinds registered for one link and dispatches each
//! validated payload to the first kind whose selector accepts it.

use heapless::Vec;

use super::fields::Fields;
use super::layout::FrameSpec;
use crate::config::ConfigError;
use crate::record::DecodedRecord;

/// Maximum frame kinds per link
pub const MAX_SPECS: usize = 8;

/// Decode errors
///
/// All of them are recoverable and stay inside the read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload of a recognized kind has the wrong shape or unparsable fields
    Malformed,
    /// No registered frame kind accepts the payload
    Unsupported,
    /// Extractor asked for a field missing from the layout table
    UnknownField,
    /// Extractor asked for a field with a different semantic type
    TypeMismatch,
}

/// Successful decode: which registered kind matched and what it produced
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decoded {
    /// Registration index of the matching frame kind
    pub index: usize,
    pub record: DecodedRecord,
}

/// Table-driven decoder for the frame kinds sharing one link
#[derive(Debug)]
pub struct FrameDecoder<const N: usize = MAX_SPECS> {
    specs: Vec<&'static FrameSpec, N>,
}

impl<const N: usize> FrameDecoder<N> {
    pub const fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// Register a frame kind and return its index
    ///
    /// Every kind on one link must use the same framing, since the
    /// synchronizer only knows one.
    pub fn register(&mut self, spec: &'static FrameSpec) -> Result<usize, ConfigError> {
        spec.framing.check().map_err(ConfigError::InvalidFraming)?;
        if let Some(first) = self.specs.first() {
            if first.framing != spec.framing {
                return Err(ConfigError::FramingMismatch);
            }
        }
        self.specs.push(spec).map_err(|_| ConfigError::TooManyRoutes)?;
        Ok(self.specs.len() - 1)
    }

    /// Registered kind at `index`
    pub fn spec(&self, index: usize) -> Option<&'static FrameSpec> {
        self.specs.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Decode one validated payload
    pub fn decode(&self, payload: &[u8]) -> Result<Decoded, DecodeError> {
        let (index, spec) = self
            .specs
            .iter()
            .enumerate()
            .find(|(_, spec)| spec.matches(payload))
            .ok_or(DecodeError::Unsupported)?;

        let record = decode(spec, payload)?;
        Ok(Decoded { index, record })
    }
}

impl<const N: usize> Default for FrameDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a payload known to belong to `spec`
pub fn decode(spec: &FrameSpec, payload: &[u8]) -> Result<DecodedRecord, DecodeError> {
    let fields = Fields::new(spec, payload)?;
    (spec.extract)(&fields)
}
