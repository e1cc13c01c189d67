//! Particulate matter sensor reading

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One data frame from a PMS5003/7003/9103M class particulate sensor
///
/// Concentrations are in µg/m³; `*_atm` values are corrected for
/// atmospheric environment, the others use the factory (CF=1) calibration.
/// Particle counts are per 0.1 L of air, for particles above the given
/// diameter in µm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticulateReading {
    /// Length field as transmitted (bytes following it)
    pub frame_length: u16,
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10_0: u16,
    pub pm1_0_atm: u16,
    pub pm2_5_atm: u16,
    pub pm10_0_atm: u16,
    pub count_0_3: u16,
    pub count_0_5: u16,
    pub count_1_0: u16,
    pub count_2_5: u16,
    pub count_5_0: u16,
    pub count_10_0: u16,
    pub firmware_version: u8,
    /// Non-zero when the sensor reports an internal fault
    pub error_code: u8,
}

impl ParticulateReading {
    /// Whether the sensor flagged an internal error in this frame
    pub fn has_error(&self) -> bool {
        self.error_code != 0
    }

    pub(crate) fn numeric(&self, field: &str) -> Option<f64> {
        let value = match field {
            "frame_length" => self.frame_length,
            "pm1_0" => self.pm1_0,
            "pm2_5" => self.pm2_5,
            "pm10_0" => self.pm10_0,
            "pm1_0_atm" => self.pm1_0_atm,
            "pm2_5_atm" => self.pm2_5_atm,
            "pm10_0_atm" => self.pm10_0_atm,
            "count_0_3" => self.count_0_3,
            "count_0_5" => self.count_0_5,
            "count_1_0" => self.count_1_0,
            "count_2_5" => self.count_2_5,
            "count_5_0" => self.count_5_0,
            "count_10_0" => self.count_10_0,
            "firmware_version" => u16::from(self.firmware_version),
            "error_code" => u16::from(self.error_code),
            _ => return None,
        };
        Some(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields() {
        let reading = ParticulateReading {
            pm2_5_atm: 12,
            count_0_3: 900,
            firmware_version: 0x91,
            ..Default::default()
        };
        assert_eq!(reading.numeric("pm2_5_atm"), Some(12.0));
        assert_eq!(reading.numeric("count_0_3"), Some(900.0));
        assert_eq!(reading.numeric("firmware_version"), Some(145.0));
        assert_eq!(reading.numeric("latitude"), None);
        assert!(!reading.has_error());
    }
}
