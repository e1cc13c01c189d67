//! Plantower PMS particulate matter sensors
//!
//! PMS5003, PMS7003 and PMS9103M share one UART protocol (9600 8N1). In
//! active mode the sensor sends a 32-byte frame roughly every second:
//!
//! ```text
//! 42 4D | len (2) | 13 × u16 data | version | error | checksum (2)
//! ```
//!
//! All multi-byte values are big-endian; `len` is 28 (bytes after it) and
//! the checksum is the 16-bit sum of every preceding byte.

mod command;

pub use command::{send_command, PmsCommand, SendError, COMMAND_LEN};

use sensorlink_core::config::{ConfigError, SourceConfig};
use sensorlink_core::decode::{DecodeError, FieldSpec, Fields, FrameSpec, Selector, Shape};
use sensorlink_core::record::{DecodedRecord, ParticulateReading};
use sensorlink_protocol::{Checksum, FrameLength, Framing};

/// Start pattern of every frame, data and command
pub const START: [u8; 2] = [0x42, 0x4D];

/// UART baud rate
pub const BAUDRATE: u32 = 9600;

/// Publish at most one reading per 30 s
pub const PUBLISH_INTERVAL_MS: u32 = 30_000;

/// Data frame payload length (after the start pattern, before the checksum)
pub const PAYLOAD_LEN: usize = 28;

/// Wire framing of PMS data frames
pub const FRAMING: Framing = Framing {
    start: &START,
    length: FrameLength::LengthField { width: 2 },
    checksum: Checksum::Additive16,
};

/// Active-mode data frame
pub static PARTICULATE: FrameSpec = FrameSpec {
    name: "pms",
    framing: FRAMING,
    selector: Selector::Any,
    shape: Shape::Bytes(PAYLOAD_LEN),
    fields: &[
        FieldSpec::be("frame_length", 0, 2),
        FieldSpec::be("pm1_0", 2, 2),
        FieldSpec::be("pm2_5", 4, 2),
        FieldSpec::be("pm10_0", 6, 2),
        FieldSpec::be("pm1_0_atm", 8, 2),
        FieldSpec::be("pm2_5_atm", 10, 2),
        FieldSpec::be("pm10_0_atm", 12, 2),
        FieldSpec::be("count_0_3", 14, 2),
        FieldSpec::be("count_0_5", 16, 2),
        FieldSpec::be("count_1_0", 18, 2),
        FieldSpec::be("count_2_5", 20, 2),
        FieldSpec::be("count_5_0", 22, 2),
        FieldSpec::be("count_10_0", 24, 2),
        FieldSpec::be("firmware_version", 26, 1),
        FieldSpec::be("error_code", 27, 1),
    ],
    extract: extract_particulate,
};

/// Source configuration with the sensor's defaults
pub fn source_config(label: &str) -> Result<SourceConfig, ConfigError> {
    Ok(SourceConfig::new(label, BAUDRATE)?.with_min_interval(PUBLISH_INTERVAL_MS))
}

fn word(fields: &Fields<'_>, name: &str) -> Result<u16, DecodeError> {
    u16::try_from(fields.unsigned(name)?).map_err(|_| DecodeError::Malformed)
}

fn byte(fields: &Fields<'_>, name: &str) -> Result<u8, DecodeError> {
    u8::try_from(fields.unsigned(name)?).map_err(|_| DecodeError::Malformed)
}

fn extract_particulate(fields: &Fields<'_>) -> Result<DecodedRecord, DecodeError> {
    Ok(ParticulateReading {
        frame_length: word(fields, "frame_length")?,
        pm1_0: word(fields, "pm1_0")?,
        pm2_5: word(fields, "pm2_5")?,
        pm10_0: word(fields, "pm10_0")?,
        pm1_0_atm: word(fields, "pm1_0_atm")?,
        pm2_5_atm: word(fields, "pm2_5_atm")?,
        pm10_0_atm: word(fields, "pm10_0_atm")?,
        count_0_3: word(fields, "count_0_3")?,
        count_0_5: word(fields, "count_0_5")?,
        count_1_0: word(fields, "count_1_0")?,
        count_2_5: word(fields, "count_2_5")?,
        count_5_0: word(fields, "count_5_0")?,
        count_10_0: word(fields, "count_10_0")?,
        firmware_version: byte(fields, "firmware_version")?,
        error_code: byte(fields, "error_code")?,
    }
    .into())
}
