//! Field extraction and semantic conversion
//!
//! [`Fields`] gives an extractor typed access to one validated payload
//! through the frame kind's layout table. Every accessor checks that the
//! layout declares the type it converts to, so a layout/extractor mismatch
//! is reported instead of producing garbage.

use heapless::Vec;
use sensorlink_protocol::read_be;

use super::decoder::DecodeError;
use super::layout::{FieldAt, FieldSpec, FieldType, FrameSpec};
use crate::record::{UtcDate, UtcTime};

/// Maximum comma-separated tokens in a text payload
pub const MAX_TOKENS: usize = 24;

/// Typed view of one validated payload
#[derive(Debug)]
pub struct Fields<'a> {
    spec: &'a FrameSpec,
    payload: &'a [u8],
    tokens: Vec<&'a [u8], MAX_TOKENS>,
}

impl<'a> Fields<'a> {
    /// Split `payload` according to the frame kind's shape
    ///
    /// Fails with [`DecodeError::Malformed`] when the payload does not have
    /// the expected length or token count.
    pub fn new(spec: &'a FrameSpec, payload: &'a [u8]) -> Result<Self, DecodeError> {
        let mut tokens = Vec::new();
        match spec.shape {
            super::layout::Shape::Bytes(len) => {
                if payload.len() != len {
                    return Err(DecodeError::Malformed);
                }
            }
            super::layout::Shape::Tokens { min, max } => {
                for token in payload.split(|&b| b == b',') {
                    tokens.push(token).map_err(|_| DecodeError::Malformed)?;
                }
                if tokens.len() < min || tokens.len() > max {
                    return Err(DecodeError::Malformed);
                }
            }
        }

        Ok(Self {
            spec,
            payload,
            tokens,
        })
    }

    /// Frame kind being decoded
    pub fn spec(&self) -> &FrameSpec {
        self.spec
    }

    /// Number of text tokens (0 for binary payloads)
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Unsigned integer field (binary big-endian or decimal text)
    ///
    /// An empty text field is malformed; use [`opt_unsigned`](Self::opt_unsigned)
    /// where blanks are legal.
    pub fn unsigned(&self, name: &str) -> Result<u32, DecodeError> {
        let field = self.lookup(name)?;
        match field.ty {
            FieldType::UnsignedBe => {
                let bytes = self.raw(field)?;
                if bytes.is_empty() || bytes.len() > 4 {
                    return Err(DecodeError::TypeMismatch);
                }
                Ok(read_be(bytes))
            }
            FieldType::Unsigned => self.opt_unsigned(name)?.ok_or(DecodeError::Malformed),
            _ => Err(DecodeError::TypeMismatch),
        }
    }

    /// Decimal unsigned text field; blank decodes to `None`
    pub fn opt_unsigned(&self, name: &str) -> Result<Option<u32>, DecodeError> {
        let field = self.expect(name, FieldType::Unsigned)?;
        match text(self.raw(field)?)? {
            None => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| DecodeError::Malformed),
        }
    }

    /// Decimal text field; blank decodes to `None`
    pub fn decimal(&self, name: &str) -> Result<Option<f64>, DecodeError> {
        let field = self.expect(name, FieldType::Decimal)?;
        parse_decimal(self.raw(field)?)
    }

    /// NMEA coordinate converted to signed decimal degrees
    pub fn coordinate(&self, name: &str) -> Result<Option<f64>, DecodeError> {
        let field = self.lookup(name)?;
        let (hemisphere, max_degrees) = match field.ty {
            FieldType::Coordinate {
                hemisphere,
                max_degrees,
            } => (hemisphere, max_degrees),
            _ => return Err(DecodeError::TypeMismatch),
        };

        let raw = match parse_decimal(self.raw(field)?)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let degrees = parse_coordinate(raw, max_degrees).ok_or(DecodeError::Malformed)?;

        match self.tokens.get(hemisphere).copied() {
            Some(b"N") | Some(b"E") => Ok(Some(degrees)),
            Some(b"S") | Some(b"W") => Ok(Some(-degrees)),
            _ => Err(DecodeError::Malformed),
        }
    }

    /// NMEA `hhmmss[.sss]` time; blank decodes to `None`
    pub fn time(&self, name: &str) -> Result<Option<UtcTime>, DecodeError> {
        let field = self.expect(name, FieldType::Time)?;
        let raw = self.raw(field)?;
        if raw.is_empty() {
            return Ok(None);
        }
        if raw.len() < 6 {
            return Err(DecodeError::Malformed);
        }

        let hour = two_digits(&raw[0..2])?;
        let minute = two_digits(&raw[2..4])?;
        let second = two_digits(&raw[4..6])?;
        if hour > 23 || minute > 59 || second > 60 {
            return Err(DecodeError::Malformed);
        }

        let millis = match &raw[6..] {
            [] => 0,
            [b'.', frac @ ..] if !frac.is_empty() => fraction_millis(frac)?,
            _ => return Err(DecodeError::Malformed),
        };

        Ok(Some(UtcTime {
            hour,
            minute,
            second,
            millis,
        }))
    }

    /// NMEA `ddmmyy` date; blank decodes to `None`
    pub fn date(&self, name: &str) -> Result<Option<UtcDate>, DecodeError> {
        let field = self.expect(name, FieldType::Date)?;
        let raw = self.raw(field)?;
        if raw.is_empty() {
            return Ok(None);
        }
        if raw.len() != 6 {
            return Err(DecodeError::Malformed);
        }

        let day = two_digits(&raw[0..2])?;
        let month = two_digits(&raw[2..4])?;
        let yy = u16::from(two_digits(&raw[4..6])?);
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return Err(DecodeError::Malformed);
        }
        let year = if yy >= 80 { 1900 + yy } else { 2000 + yy };

        Ok(Some(UtcDate { year, month, day }))
    }

    /// Single-character text field; blank decodes to `None`
    pub fn flag(&self, name: &str) -> Result<Option<u8>, DecodeError> {
        let field = self.expect(name, FieldType::Char)?;
        match self.raw(field)? {
            [] => Ok(None),
            [c] => Ok(Some(*c)),
            _ => Err(DecodeError::Malformed),
        }
    }

    fn lookup(&self, name: &str) -> Result<&'static FieldSpec, DecodeError> {
        self.spec.field(name).ok_or(DecodeError::UnknownField)
    }

    fn expect(&self, name: &str, ty: FieldType) -> Result<&'static FieldSpec, DecodeError> {
        let field = self.lookup(name)?;
        if field.ty != ty {
            return Err(DecodeError::TypeMismatch);
        }
        Ok(field)
    }

    fn raw(&self, field: &FieldSpec) -> Result<&'a [u8], DecodeError> {
        match field.at {
            FieldAt::Bytes { offset, width } => self
                .payload
                .get(offset..offset + width)
                .ok_or(DecodeError::Malformed),
            FieldAt::Token(index) => self.tokens.get(index).copied().ok_or(DecodeError::Malformed),
        }
    }
}

/// Convert an NMEA `dddmm.mmmm` value to decimal degrees
///
/// `degrees = floor(raw / 100) + (raw - floor(raw / 100) * 100) / 60`.
/// Returns `None` for negative input, a minutes part of 60 or more, or a
/// result beyond `max_degrees`.
pub fn parse_coordinate(raw: f64, max_degrees: u8) -> Option<f64> {
    if !(0.0..=f64::from(max_degrees) * 100.0).contains(&raw) {
        return None;
    }
    // Non-negative, so truncation is floor
    let whole = (raw / 100.0) as u32 as f64;
    let minutes = raw - whole * 100.0;
    if minutes >= 60.0 {
        return None;
    }
    let degrees = whole + minutes / 60.0;
    (degrees <= f64::from(max_degrees)).then_some(degrees)
}

fn text(raw: &[u8]) -> Result<Option<&str>, DecodeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    core::str::from_utf8(raw)
        .map(Some)
        .map_err(|_| DecodeError::Malformed)
}

fn parse_decimal(raw: &[u8]) -> Result<Option<f64>, DecodeError> {
    let s = match text(raw)? {
        Some(s) => s,
        None => return Ok(None),
    };
    // Reject forms the float parser accepts but NMEA never sends
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-' || b == b'+')
    {
        return Err(DecodeError::Malformed);
    }
    s.parse::<f64>().map(Some).map_err(|_| DecodeError::Malformed)
}

fn two_digits(raw: &[u8]) -> Result<u8, DecodeError> {
    match raw {
        [hi, lo] if hi.is_ascii_digit() && lo.is_ascii_digit() => Ok((hi - b'0') * 10 + (lo - b'0')),
        _ => Err(DecodeError::Malformed),
    }
}

fn fraction_millis(frac: &[u8]) -> Result<u16, DecodeError> {
    let mut millis = 0u16;
    let mut scale = 100u16;
    for &digit in frac {
        if !digit.is_ascii_digit() {
            return Err(DecodeError::Malformed);
        }
        millis += u16::from(digit - b'0') * scale;
        scale /= 10;
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::layout::{Selector, Shape};
    use crate::record::DecodedRecord;
    use sensorlink_protocol::{Checksum, FrameLength, Framing};

    fn never(_: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
        Err(DecodeError::Unsupported)
    }

    static BINARY: FrameSpec = FrameSpec {
        name: "binary",
        framing: Framing {
            start: &[0x42, 0x4D],
            length: FrameLength::Fixed(10),
            checksum: Checksum::Additive16,
        },
        selector: Selector::Any,
        shape: Shape::Bytes(6),
        fields: &[
            FieldSpec::be("word", 0, 2),
            FieldSpec::be("byte", 2, 1),
            FieldSpec::be("triple", 3, 3),
            FieldSpec::be("past_end", 5, 2),
        ],
        extract: never,
    };

    static TEXT: FrameSpec = FrameSpec {
        name: "text",
        framing: Framing {
            start: b"$GP",
            length: FrameLength::Line { max_len: 82 },
            checksum: Checksum::NmeaXor,
        },
        selector: Selector::Sentence("TST"),
        shape: Shape::Tokens { min: 8, max: 8 },
        fields: &[
            FieldSpec::token("time", 1, FieldType::Time),
            FieldSpec::latitude("lat", 2, 3),
            FieldSpec::token("count", 4, FieldType::Unsigned),
            FieldSpec::token("value", 5, FieldType::Decimal),
            FieldSpec::token("status", 6, FieldType::Char),
            FieldSpec::token("date", 7, FieldType::Date),
        ],
        extract: never,
    };

    #[test]
    fn test_binary_fields_are_big_endian() {
        let payload = [0x01, 0x02, 0x03, 0x0A, 0x0B, 0x0C];
        let fields = Fields::new(&BINARY, &payload).unwrap();

        assert_eq!(fields.unsigned("word"), Ok(0x0102));
        assert_eq!(fields.unsigned("byte"), Ok(0x03));
        assert_eq!(fields.unsigned("triple"), Ok(0x0A0B0C));
        assert_eq!(fields.unsigned("past_end"), Err(DecodeError::Malformed));
        assert_eq!(fields.unsigned("missing"), Err(DecodeError::UnknownField));
        assert_eq!(fields.decimal("word"), Err(DecodeError::TypeMismatch));
    }

    #[test]
    fn test_binary_wrong_length_is_malformed() {
        assert_eq!(
            Fields::new(&BINARY, &[0u8; 5]).unwrap_err(),
            DecodeError::Malformed
        );
    }

    #[test]
    fn test_text_fields() {
        let payload = b"GPTST,123519.25,4807.038,S,08,0.9,A,230394";
        let fields = Fields::new(&TEXT, payload).unwrap();

        let time = fields.time("time").unwrap().unwrap();
        assert_eq!((time.hour, time.minute, time.second, time.millis), (12, 35, 19, 250));

        let lat = fields.coordinate("lat").unwrap().unwrap();
        assert!((lat + 48.1173).abs() < 1e-4);

        assert_eq!(fields.unsigned("count"), Ok(8));
        assert_eq!(fields.decimal("value"), Ok(Some(0.9)));
        assert_eq!(fields.flag("status"), Ok(Some(b'A')));
        assert_eq!(
            fields.date("date"),
            Ok(Some(UtcDate {
                year: 1994,
                month: 3,
                day: 23
            }))
        );
    }

    #[test]
    fn test_blank_text_fields_are_none() {
        let payload = b"GPTST,,,,,,,";
        let fields = Fields::new(&TEXT, payload).unwrap();

        assert_eq!(fields.time("time"), Ok(None));
        assert_eq!(fields.coordinate("lat"), Ok(None));
        assert_eq!(fields.opt_unsigned("count"), Ok(None));
        assert_eq!(fields.unsigned("count"), Err(DecodeError::Malformed));
        assert_eq!(fields.decimal("value"), Ok(None));
        assert_eq!(fields.flag("status"), Ok(None));
        assert_eq!(fields.date("date"), Ok(None));
    }

    #[test]
    fn test_garbage_text_fields_are_malformed() {
        let payload = b"GPTST,12x519,48o7.038,N,8a,inf,AB,321394";
        let fields = Fields::new(&TEXT, payload).unwrap();

        assert_eq!(fields.time("time"), Err(DecodeError::Malformed));
        assert_eq!(fields.coordinate("lat"), Err(DecodeError::Malformed));
        assert_eq!(fields.unsigned("count"), Err(DecodeError::Malformed));
        assert_eq!(fields.decimal("value"), Err(DecodeError::Malformed));
        assert_eq!(fields.flag("status"), Err(DecodeError::Malformed));
        assert_eq!(fields.date("date"), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_token_count_is_checked() {
        assert_eq!(
            Fields::new(&TEXT, b"GPTST,1,2,3").unwrap_err(),
            DecodeError::Malformed
        );
        assert_eq!(
            Fields::new(&TEXT, b"GPTST,1,2,3,4,5,6,7,8").unwrap_err(),
            DecodeError::Malformed
        );
    }

    #[test]
    fn test_missing_hemisphere_is_malformed() {
        let payload = b"GPTST,,4807.038,,,,,";
        let fields = Fields::new(&TEXT, payload).unwrap();
        assert_eq!(fields.coordinate("lat"), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_parse_coordinate() {
        assert!((parse_coordinate(4807.038, 90).unwrap() - 48.1173).abs() < 1e-4);
        assert!((parse_coordinate(1131.000, 180).unwrap() - 11.516_666).abs() < 1e-5);
        assert!((parse_coordinate(12_000.5, 180).unwrap() - 120.008_333).abs() < 1e-5);
        assert_eq!(parse_coordinate(18_000.0, 180), Some(180.0));
        assert_eq!(parse_coordinate(4875.0, 90), None);
        assert_eq!(parse_coordinate(-1.0, 90), None);
    }

    #[test]
    fn test_coordinate_respects_axis_limit() {
        assert_eq!(parse_coordinate(9000.0, 90), Some(90.0));
        assert_eq!(parse_coordinate(9000.5, 90), None);
        assert_eq!(parse_coordinate(9500.0, 90), None);
        assert!((parse_coordinate(9500.0, 180).unwrap() - 95.0).abs() < 1e-9);

        let fields = Fields::new(&TEXT, b"GPTST,,9500.000,N,,,,").unwrap();
        assert_eq!(fields.coordinate("lat"), Err(DecodeError::Malformed));
    }
}
