//! Decoded sensor records
//!
//! A record is immutable once built by an extractor. Consumers read records
//! out of the state store; they never see the frames they came from.

mod gps;
mod particulate;

pub use gps::{GpsFix, GpsRecommended, GpsVelocity, UtcDate, UtcTime};
pub use particulate::ParticulateReading;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One decoded frame, tagged by frame kind
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecodedRecord {
    /// Particulate matter sensor data frame
    Particulate(ParticulateReading),
    /// NMEA GGA: position fix
    GpsFix(GpsFix),
    /// NMEA VTG: course and speed over ground
    GpsVelocity(GpsVelocity),
    /// NMEA RMC: recommended minimum data
    GpsRecommended(GpsRecommended),
}

impl DecodedRecord {
    /// Short name of the record kind
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedRecord::Particulate(_) => "particulate",
            DecodedRecord::GpsFix(_) => "gps_fix",
            DecodedRecord::GpsVelocity(_) => "gps_velocity",
            DecodedRecord::GpsRecommended(_) => "gps_recommended",
        }
    }

    /// Numeric value of a named field, if the record has it and it is present
    ///
    /// Field names match the layout table names, e.g. `"pm2_5_atm"` or
    /// `"satellites"`. Used to feed the store's rolling average.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match self {
            DecodedRecord::Particulate(r) => r.numeric(field),
            DecodedRecord::GpsFix(r) => r.numeric(field),
            DecodedRecord::GpsVelocity(r) => r.numeric(field),
            DecodedRecord::GpsRecommended(r) => r.numeric(field),
        }
    }
}

impl From<ParticulateReading> for DecodedRecord {
    fn from(r: ParticulateReading) -> Self {
        DecodedRecord::Particulate(r)
    }
}

impl From<GpsFix> for DecodedRecord {
    fn from(r: GpsFix) -> Self {
        DecodedRecord::GpsFix(r)
    }
}

impl From<GpsVelocity> for DecodedRecord {
    fn from(r: GpsVelocity) -> Self {
        DecodedRecord::GpsVelocity(r)
    }
}

impl From<GpsRecommended> for DecodedRecord {
    fn from(r: GpsRecommended) -> Self {
        DecodedRecord::GpsRecommended(r)
    }
}
