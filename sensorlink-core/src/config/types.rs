//! Configuration type definitions

use heapless::String;
use sensorlink_hal::UartSettings;
use sensorlink_protocol::FramingError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Default read timeout before a partial frame is abandoned (ms)
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 2_000;

/// Configuration errors, reported at construction time only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Label longer than [`MAX_LABEL_LEN`]
    LabelTooLong,
    /// Frame kind or channel table is full
    TooManyRoutes,
    /// Frame kind does not share the link's framing
    FramingMismatch,
    /// Framing description is unusable
    InvalidFraming(FramingError),
}

impl From<FramingError> for ConfigError {
    fn from(e: FramingError) -> Self {
        ConfigError::InvalidFraming(e)
    }
}

fn label(s: &str) -> Result<String<MAX_LABEL_LEN>, ConfigError> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| ConfigError::LabelTooLong)?;
    Ok(out)
}

/// One serial sensor source
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceConfig {
    /// Name used in logs
    pub label: String<MAX_LABEL_LEN>,
    /// UART baud rate (always 8N1 for the supported sensors)
    pub baudrate: u32,
    /// Longest wait for the next byte of a frame (ms)
    pub read_timeout_ms: u32,
    /// Sleep after each published record (ms)
    pub min_interval_ms: u32,
}

impl SourceConfig {
    pub fn new(name: &str, baudrate: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            label: label(name)?,
            baudrate,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            min_interval_ms: 0,
        })
    }

    pub fn with_read_timeout(mut self, ms: u32) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    pub fn with_min_interval(mut self, ms: u32) -> Self {
        self.min_interval_ms = ms;
        self
    }

    /// Serial settings to open the UART with
    pub fn uart_settings(&self) -> UartSettings {
        UartSettings::new_8n1(self.baudrate)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            baudrate: 9600,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            min_interval_ms: 0,
        }
    }
}

/// One named slot in the sensor state store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelConfig {
    /// Channel name/identifier
    pub name: String<MAX_LABEL_LEN>,
    /// Record field fed into the rolling average, e.g. `pm2_5_atm`
    pub averaged: Option<String<MAX_LABEL_LEN>>,
    /// Age after which the latest record counts as stale (ms, 0 = never)
    pub stale_after_ms: u32,
}

impl ChannelConfig {
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: label(name)?,
            averaged: None,
            stale_after_ms: 0,
        })
    }

    /// Average the named numeric field
    pub fn averaging(mut self, field: &str) -> Result<Self, ConfigError> {
        self.averaged = Some(label(field)?);
        Ok(self)
    }

    pub fn stale_after(mut self, ms: u32) -> Self {
        self.stale_after_ms = ms;
        self
    }
}
