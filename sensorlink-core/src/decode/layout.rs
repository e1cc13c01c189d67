//! Frame kind descriptions
//!
//! A [`FrameSpec`] is immutable and usually a `static` in a driver crate.
//! Offsets for binary fields are relative to the validated payload, i.e.
//! the bytes after the start pattern and before the checksum. Token indices
//! for text fields count comma-separated tokens of the payload, with the
//! address (`GPGGA`) as token 0.

use sensorlink_protocol::Framing;

use super::decoder::DecodeError;
use super::fields::Fields;
use crate::record::DecodedRecord;

/// Builds a record from the laid-out fields of one validated payload
pub type Extractor = fn(&Fields<'_>) -> Result<DecodedRecord, DecodeError>;

/// Where a field lives in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldAt {
    /// Byte range in a binary payload
    Bytes { offset: usize, width: usize },
    /// Comma-separated token in a text payload
    Token(usize),
}

/// Semantic conversion applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldType {
    /// Big-endian unsigned integer (binary, 1-4 bytes)
    UnsignedBe,
    /// Decimal unsigned integer (text)
    Unsigned,
    /// Decimal number (text)
    Decimal,
    /// NMEA `dddmm.mmmm` coordinate; `hemisphere` is the token holding N/S/E/W
    /// and `max_degrees` bounds the magnitude (90 for latitude, 180 for longitude)
    Coordinate { hemisphere: usize, max_degrees: u8 },
    /// NMEA `hhmmss[.sss]` time (text)
    Time,
    /// NMEA `ddmmyy` date (text)
    Date,
    /// Single status character (text)
    Char,
}

/// Largest latitude magnitude in degrees
pub const MAX_LATITUDE: u8 = 90;

/// Largest longitude magnitude in degrees
pub const MAX_LONGITUDE: u8 = 180;

/// One entry of a field layout table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSpec {
    pub name: &'static str,
    pub at: FieldAt,
    pub ty: FieldType,
}

impl FieldSpec {
    /// Big-endian unsigned field in a binary payload
    pub const fn be(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            at: FieldAt::Bytes { offset, width },
            ty: FieldType::UnsignedBe,
        }
    }

    /// Latitude token with its N/S hemisphere token
    pub const fn latitude(name: &'static str, index: usize, hemisphere: usize) -> Self {
        Self::token(
            name,
            index,
            FieldType::Coordinate {
                hemisphere,
                max_degrees: MAX_LATITUDE,
            },
        )
    }

    /// Longitude token with its E/W hemisphere token
    pub const fn longitude(name: &'static str, index: usize, hemisphere: usize) -> Self {
        Self::token(
            name,
            index,
            FieldType::Coordinate {
                hemisphere,
                max_degrees: MAX_LONGITUDE,
            },
        )
    }

    /// Text token field
    pub const fn token(name: &'static str, index: usize, ty: FieldType) -> Self {
        Self {
            name,
            at: FieldAt::Token(index),
            ty,
        }
    }
}

/// How a frame kind is told apart from others sharing a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Selector {
    /// Every payload on the link is this kind
    Any,
    /// Text payload whose address token ends with this sentence id
    Sentence(&'static str),
}

/// Expected payload shape; anything else is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    /// Binary payload of exactly this many bytes
    Bytes(usize),
    /// Text payload with a token count in `min..=max`
    Tokens { min: usize, max: usize },
}

/// Static description of one frame kind
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec {
    /// Name used in logs
    pub name: &'static str,
    /// Wire framing shared by every kind on the same link
    pub framing: Framing,
    pub selector: Selector,
    pub shape: Shape,
    /// Field layout table
    pub fields: &'static [FieldSpec],
    /// Registered extractor for this kind
    pub extract: Extractor,
}

impl FrameSpec {
    /// Whether a validated payload belongs to this frame kind
    pub fn matches(&self, payload: &[u8]) -> bool {
        match self.selector {
            Selector::Any => true,
            Selector::Sentence(id) => {
                let address = payload.split(|&b| b == b',').next().unwrap_or(&[]);
                !id.is_empty() && address.ends_with(id.as_bytes())
            }
        }
    }

    /// Look up a layout entry by name
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorlink_protocol::{Checksum, FrameLength};

    fn never(_: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
        Err(DecodeError::Unsupported)
    }

    const NMEA: Framing = Framing {
        start: b"$GP",
        length: FrameLength::Line { max_len: 82 },
        checksum: Checksum::NmeaXor,
    };

    static VTG: FrameSpec = FrameSpec {
        name: "vtg",
        framing: NMEA,
        selector: Selector::Sentence("VTG"),
        shape: Shape::Tokens { min: 9, max: 10 },
        fields: &[FieldSpec::token("speed_kph", 7, FieldType::Decimal)],
        extract: never,
    };

    #[test]
    fn test_sentence_selector() {
        assert!(VTG.matches(b"GPVTG,054.7,T,034.4,M,005.5,N,010.2,K"));
        assert!(VTG.matches(b"GNVTG"));
        assert!(!VTG.matches(b"GPGGA,123519"));
        // Only the address token counts
        assert!(!VTG.matches(b"GPTXT,VTG"));
    }

    #[test]
    fn test_field_lookup() {
        let field = VTG.field("speed_kph").unwrap();
        assert_eq!(field.at, FieldAt::Token(7));
        assert!(VTG.field("speed_knots").is_none());
    }
}
