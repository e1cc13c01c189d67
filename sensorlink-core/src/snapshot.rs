//! Channel snapshots for publish and display layers
//!
//! A snapshot is a self-contained copy of one channel's state, encoded as
//! postcard binary so it can cross a link or be queued without borrowing
//! the store.

use embassy_sync::blocking_mutex::raw::RawMutex;
use serde::{Deserialize, Serialize};

use crate::record::DecodedRecord;
use crate::store::{ChannelId, ChannelStatus, SensorStateStore};

/// Largest encoded snapshot (bytes)
pub const MAX_SNAPSHOT_LEN: usize = 96;

/// Point-in-time copy of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    pub status: ChannelStatus,
    pub record: DecodedRecord,
    pub received_at_ms: u64,
    pub average: Option<f64>,
}

/// Snapshot encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SnapshotError {
    Serialize,
    Deserialize,
}

impl ChannelSnapshot {
    /// Encode into `buf`, returning the used prefix
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], SnapshotError> {
        postcard::to_slice(self, buf).map_err(|_| SnapshotError::Serialize)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        postcard::from_bytes(bytes).map_err(|_| SnapshotError::Deserialize)
    }
}

impl<M: RawMutex, const CHANNELS: usize, const WINDOW: usize>
    SensorStateStore<M, CHANNELS, WINDOW>
{
    /// Copy out a channel's state; `None` until it has a record
    pub fn snapshot(&self, channel: ChannelId, now_ms: u64) -> Option<ChannelSnapshot> {
        let reading = self.reading(channel)?;
        Some(ChannelSnapshot {
            channel,
            status: self.status(channel, now_ms),
            record: reading.record,
            received_at_ms: reading.received_at_ms,
            average: self.average(channel),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::record::{GpsFix, UtcTime};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_snapshot_round_trip() {
        let store: SensorStateStore<NoopRawMutex, 2> = SensorStateStore::new();
        let gps = store
            .register(ChannelConfig::new("gps").unwrap().averaging("satellites").unwrap())
            .unwrap();
        assert_eq!(store.snapshot(gps, 0), None);

        let fix = GpsFix {
            fix_time: Some(UtcTime {
                hour: 12,
                minute: 35,
                second: 19,
                millis: 0,
            }),
            latitude: Some(48.1173),
            longitude: Some(11.516_666),
            quality: 1,
            satellites: 8,
            hdop: Some(0.9),
            altitude: Some(545.4),
        };
        store.update(gps, fix.into(), 1_000).unwrap();
        store.update(gps, fix.into(), 2_000).unwrap();

        let snapshot = store.snapshot(gps, 2_500).unwrap();
        assert_eq!(snapshot.average, Some(8.0));
        assert_eq!(snapshot.status, ChannelStatus::Fresh);

        let mut buf = [0u8; MAX_SNAPSHOT_LEN];
        let encoded = snapshot.encode(&mut buf).unwrap();
        assert_eq!(ChannelSnapshot::decode(encoded), Ok(snapshot));
    }

    #[test]
    fn test_buffer_too_small() {
        let snapshot = ChannelSnapshot {
            channel: ChannelId(0),
            status: ChannelStatus::Fresh,
            record: GpsFix::default().into(),
            received_at_ms: 0,
            average: None,
        };
        let mut buf = [0u8; 4];
        assert_eq!(snapshot.encode(&mut buf), Err(SnapshotError::Serialize));
    }
}
