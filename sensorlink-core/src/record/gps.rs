//! GPS records decoded from NMEA sentences
//!
//! Empty NMEA fields decode to `None`: a receiver without a fix still sends
//! well-formed sentences, just with blank position fields.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// UTC time of day from an NMEA `hhmmss[.sss]` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

impl UtcTime {
    /// Seconds since midnight
    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }
}

/// Formats as `hh:mm:ss`
impl fmt::Display for UtcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// UTC calendar date from an NMEA `ddmmyy` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtcDate {
    /// Full year; two-digit years 80-99 are 1980-1999 (GPS epoch), 00-79 are 2000-2079
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Formats as `yyyy-mm-dd`
impl fmt::Display for UtcDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// GGA: global positioning system fix data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsFix {
    pub fix_time: Option<UtcTime>,
    /// Decimal degrees, negative south of the equator
    pub latitude: Option<f64>,
    /// Decimal degrees, negative west of Greenwich
    pub longitude: Option<f64>,
    /// 0 = invalid, 1 = GPS, 2 = DGPS, 4/5 = RTK, 6 = dead reckoning
    pub quality: u8,
    /// Satellites used in the solution
    pub satellites: u8,
    /// Horizontal dilution of precision
    pub hdop: Option<f32>,
    /// Altitude above mean sea level in metres
    pub altitude: Option<f32>,
}

impl GpsFix {
    /// Whether the receiver reports a usable position
    pub fn has_fix(&self) -> bool {
        self.quality != 0 && self.latitude.is_some() && self.longitude.is_some()
    }

    pub(crate) fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "latitude" => self.latitude,
            "longitude" => self.longitude,
            "quality" => Some(f64::from(self.quality)),
            "satellites" => Some(f64::from(self.satellites)),
            "hdop" => self.hdop.map(f64::from),
            "altitude" => self.altitude.map(f64::from),
            _ => None,
        }
    }
}

/// VTG: track made good and ground speed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsVelocity {
    /// Degrees relative to true north
    pub track_true: Option<f32>,
    /// Degrees relative to magnetic north
    pub track_magnetic: Option<f32>,
    pub speed_knots: Option<f32>,
    pub speed_kph: Option<f32>,
}

impl GpsVelocity {
    pub(crate) fn numeric(&self, field: &str) -> Option<f64> {
        let value = match field {
            "track_true" => self.track_true,
            "track_magnetic" => self.track_magnetic,
            "speed_knots" => self.speed_knots,
            "speed_kph" => self.speed_kph,
            _ => None,
        };
        value.map(f64::from)
    }
}

/// RMC: recommended minimum specific GNSS data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsRecommended {
    pub fix_time: Option<UtcTime>,
    /// Status `A` (active); `V` (void) sentences decode with `active = false`
    pub active: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_knots: Option<f32>,
    pub track_true: Option<f32>,
    pub date: Option<UtcDate>,
}

impl GpsRecommended {
    pub(crate) fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "latitude" => self.latitude,
            "longitude" => self.longitude,
            "speed_knots" => self.speed_knots.map(f64::from),
            "track_true" => self.track_true.map(f64::from),
            _ => None,
        }
    }
}
