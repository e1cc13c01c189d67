//! Descriptions of NMEA sentence identifiers, for diagnostics

const SENTENCES: &[(&str, &str)] = &[
    ("AAM", "Waypoint Arrival Alarm"),
    ("ALM", "GPS Almanac Data"),
    ("APB", "Autopilot Sentence B"),
    ("BOD", "Bearing, Origin to Destination"),
    ("BWC", "Bearing & Distance to Waypoint, Great Circle"),
    ("DBT", "Depth Below Transducer"),
    ("DPT", "Depth"),
    ("GGA", "Global Positioning System Fix Data"),
    ("GLL", "Geographic Position, Latitude/Longitude"),
    ("GNS", "GNSS Fix Data"),
    ("GSA", "GPS DOP and Active Satellites"),
    ("GSV", "GPS Satellites in View"),
    ("HDG", "Heading, Deviation & Variation"),
    ("HDT", "Heading, True"),
    ("MWV", "Wind Speed and Angle"),
    ("RMB", "Recommended Minimum Navigation Information"),
    ("RMC", "Recommended Minimum Specific GPS/TRANSIT Data"),
    ("ROT", "Rate of Turn"),
    ("RTE", "Routes"),
    ("TXT", "Text"),
    ("VHW", "Water Speed and Heading"),
    ("VTG", "Track Made Good and Ground Speed"),
    ("WPL", "Waypoint Location"),
    ("XTE", "Cross-Track Error, Measured"),
    ("ZDA", "Time & Date"),
];

/// Sentence identifier of a payload, talker stripped (`GPGGA,...` → `GGA`)
pub fn sentence_id(payload: &[u8]) -> Option<&str> {
    let address = payload.split(|&b| b == b',').next()?;
    // Talker is two characters, proprietary sentences start with P
    let id = match address {
        [b'P', ..] => address,
        [_, _, rest @ ..] if rest.len() == 3 => rest,
        _ => return None,
    };
    core::str::from_utf8(id).ok()
}

/// Human-readable description of a sentence identifier
///
/// Accepts the bare identifier (`GGA`) or a full address (`GPGGA`).
pub fn sentence_description(id: &str) -> Option<&'static str> {
    let id = if id.len() == 5 { id.get(2..)? } else { id };
    SENTENCES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, description)| *description)
}
