//! Shared sensor state
//!
//! Every link task publishes into [`SENSORS`]; the monitor and any other
//! consumer read from it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use sensorlink_core::config::{ChannelConfig, ConfigError};
use sensorlink_core::store::{ChannelId, SensorStateStore, StoreError};

/// Number of channels on the board
pub const MAX_CHANNELS: usize = 4;

/// A particulate channel is stale after three missed publish intervals
const PMS_STALE_MS: u32 = 90_000;

/// GPS sentences arrive every second
const GPS_STALE_MS: u32 = 5_000;

/// Latest record and rolling average per channel
pub static SENSORS: SensorStateStore<CriticalSectionRawMutex, MAX_CHANNELS> =
    SensorStateStore::new();

/// Errors registering the board's channels
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum SetupError {
    Config(ConfigError),
    Store(StoreError),
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        SetupError::Config(e)
    }
}

impl From<StoreError> for SetupError {
    fn from(e: StoreError) -> Self {
        SetupError::Store(e)
    }
}

/// Channel ids handed to the tasks
#[derive(Debug, Clone, Copy)]
pub struct Channels {
    pub particulate: ChannelId,
    pub gps_fix: ChannelId,
    pub gps_velocity: ChannelId,
    pub gps_recommended: ChannelId,
}

impl Channels {
    /// Register the board's channels in [`SENSORS`]
    pub fn register() -> Result<Self, SetupError> {
        Ok(Self {
            particulate: SENSORS.register(channel("pms", "pm2_5_atm", PMS_STALE_MS)?)?,
            gps_fix: SENSORS.register(channel("gps.fix", "satellites", GPS_STALE_MS)?)?,
            gps_velocity: SENSORS.register(channel("gps.vtg", "speed_kph", GPS_STALE_MS)?)?,
            gps_recommended: SENSORS.register(channel("gps.rmc", "speed_knots", GPS_STALE_MS)?)?,
        })
    }

    pub fn all(&self) -> [ChannelId; MAX_CHANNELS] {
        [
            self.particulate,
            self.gps_fix,
            self.gps_velocity,
            self.gps_recommended,
        ]
    }
}

fn channel(name: &str, averaged: &str, stale_ms: u32) -> Result<ChannelConfig, ConfigError> {
    Ok(ChannelConfig::new(name)?
        .averaging(averaged)?
        .stale_after(stale_ms))
}
