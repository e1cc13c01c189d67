//! NMEA 0183 GPS receivers (u-blox NEO-6M class)
//!
//! The receiver streams ASCII sentences at 9600 baud:
//!
//! ```text
//! $GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n
//! ```
//!
//! GGA, VTG and RMC are decoded; every other sentence passes the checksum
//! and is dropped as unsupported. Multi-constellation receivers use the
//! `GN` talker, which needs [`GN_FRAMING`] and the matching `GN_*` specs.

mod catalogue;

pub use catalogue::{sentence_description, sentence_id};

use sensorlink_core::config::{ConfigError, SourceConfig};
use sensorlink_core::decode::{
    DecodeError, FieldSpec, FieldType, Fields, FrameSpec, Selector, Shape,
};
use sensorlink_core::record::{DecodedRecord, GpsFix, GpsRecommended, GpsVelocity};
use sensorlink_protocol::{Checksum, FrameLength, Framing};

/// UART baud rate
pub const BAUDRATE: u32 = 9600;

/// Longest sentence, `$` through `\n`
pub const MAX_SENTENCE_LEN: usize = 82;

/// Sentences from a GPS-only receiver
pub const GP_FRAMING: Framing = Framing {
    start: b"$GP",
    length: FrameLength::Line {
        max_len: MAX_SENTENCE_LEN,
    },
    checksum: Checksum::NmeaXor,
};

/// Sentences from a multi-constellation receiver
pub const GN_FRAMING: Framing = Framing {
    start: b"$GN",
    ..GP_FRAMING
};

const GGA_FIELDS: &[FieldSpec] = &[
    FieldSpec::token("fix_time", 1, FieldType::Time),
    FieldSpec::latitude("latitude", 2, 3),
    FieldSpec::longitude("longitude", 4, 5),
    FieldSpec::token("quality", 6, FieldType::Unsigned),
    FieldSpec::token("satellites", 7, FieldType::Unsigned),
    FieldSpec::token("hdop", 8, FieldType::Decimal),
    FieldSpec::token("altitude", 9, FieldType::Decimal),
];

const VTG_FIELDS: &[FieldSpec] = &[
    FieldSpec::token("track_true", 1, FieldType::Decimal),
    FieldSpec::token("track_magnetic", 3, FieldType::Decimal),
    FieldSpec::token("speed_knots", 5, FieldType::Decimal),
    FieldSpec::token("speed_kph", 7, FieldType::Decimal),
];

const RMC_FIELDS: &[FieldSpec] = &[
    FieldSpec::token("fix_time", 1, FieldType::Time),
    FieldSpec::token("status", 2, FieldType::Char),
    FieldSpec::latitude("latitude", 3, 4),
    FieldSpec::longitude("longitude", 5, 6),
    FieldSpec::token("speed_knots", 7, FieldType::Decimal),
    FieldSpec::token("track_true", 8, FieldType::Decimal),
    FieldSpec::token("date", 9, FieldType::Date),
];

const fn gga(framing: Framing) -> FrameSpec {
    FrameSpec {
        name: "gga",
        framing,
        selector: Selector::Sentence("GGA"),
        shape: Shape::Tokens { min: 15, max: 15 },
        fields: GGA_FIELDS,
        extract: extract_fix,
    }
}

const fn vtg(framing: Framing) -> FrameSpec {
    FrameSpec {
        name: "vtg",
        framing,
        selector: Selector::Sentence("VTG"),
        // NMEA 2.3 appends a mode indicator
        shape: Shape::Tokens { min: 9, max: 10 },
        fields: VTG_FIELDS,
        extract: extract_velocity,
    }
}

const fn rmc(framing: Framing) -> FrameSpec {
    FrameSpec {
        name: "rmc",
        framing,
        selector: Selector::Sentence("RMC"),
        // NMEA 2.3 appends a mode indicator, NMEA 4.1 a navigational status
        shape: Shape::Tokens { min: 12, max: 14 },
        fields: RMC_FIELDS,
        extract: extract_recommended,
    }
}

/// GGA: fix data
pub static GGA: FrameSpec = gga(GP_FRAMING);
/// VTG: course and speed over ground
pub static VTG: FrameSpec = vtg(GP_FRAMING);
/// RMC: recommended minimum data
pub static RMC: FrameSpec = rmc(GP_FRAMING);

pub static GN_GGA: FrameSpec = gga(GN_FRAMING);
pub static GN_VTG: FrameSpec = vtg(GN_FRAMING);
pub static GN_RMC: FrameSpec = rmc(GN_FRAMING);

/// Source configuration with the receiver's defaults
///
/// No inter-sentence sleep: the receiver sends a burst of sentences each
/// second and sleeping would drop most of them.
pub fn source_config(label: &str) -> Result<SourceConfig, ConfigError> {
    SourceConfig::new(label, BAUDRATE)
}

fn small(fields: &Fields<'_>, name: &str) -> Result<u8, DecodeError> {
    let value = fields.opt_unsigned(name)?.unwrap_or(0);
    u8::try_from(value).map_err(|_| DecodeError::Malformed)
}

fn single(fields: &Fields<'_>, name: &str) -> Result<Option<f32>, DecodeError> {
    Ok(fields.decimal(name)?.map(|v| v as f32))
}

fn extract_fix(fields: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
    Ok(GpsFix {
        fix_time: fields.time("fix_time")?,
        latitude: fields.coordinate("latitude")?,
        longitude: fields.coordinate("longitude")?,
        quality: small(fields, "quality")?,
        satellites: small(fields, "satellites")?,
        hdop: single(fields, "hdop")?,
        altitude: single(fields, "altitude")?,
    }
    .into())
}

fn extract_velocity(fields: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
    Ok(GpsVelocity {
        track_true: single(fields, "track_true")?,
        track_magnetic: single(fields, "track_magnetic")?,
        speed_knots: single(fields, "speed_knots")?,
        speed_kph: single(fields, "speed_kph")?,
    }
    .into())
}

fn extract_recommended(fields: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
    Ok(GpsRecommended {
        fix_time: fields.time("fix_time")?,
        active: fields.flag("status")? == Some(b'A'),
        latitude: fields.coordinate("latitude")?,
        longitude: fields.coordinate("longitude")?,
        speed_knots: single(fields, "speed_knots")?,
        track_true: single(fields, "track_true")?,
        date: fields.date("date")?,
    }
    .into())
}
