//! Shared sensor state
//!
//! The store holds one slot per sensor channel: the most recently validated
//! record, when it arrived, and a bounded window of one numeric field for
//! averaging. Each channel has a single writer (the read loop for its
//! source) and any number of readers.
//!
//! A record replacement happens in one assignment under a blocking mutex,
//! so readers either see the previous record or the new one, never a mix.
//! The critical sections never await.

mod window;

pub use window::SampleWindow;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::{String, Vec};

use crate::config::{ChannelConfig, MAX_LABEL_LEN};
use crate::record::DecodedRecord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default averaging window (samples)
pub const DEFAULT_WINDOW: usize = 60;

/// Handle to a registered channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Latest record of a channel with its receipt metadata
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub record: DecodedRecord,
    /// Clock value when the record was published (ms)
    pub received_at_ms: u64,
    /// Number of updates this channel has seen, starting at 1
    pub sequence: u32,
}

/// Externally observable channel health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelStatus {
    /// No record received yet
    Absent,
    /// Latest record is within the staleness threshold
    Fresh,
    /// Latest record is older than the staleness threshold
    Stale,
}

/// Store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Channel table is full
    Full,
    /// A channel with this name already exists
    DuplicateName,
    /// Channel id was not issued by this store
    UnknownChannel,
}

/// Destination for decoded records
///
/// Implemented by [`SensorStateStore`]; the read loop only needs this.
pub trait RecordSink {
    fn publish(
        &self,
        channel: ChannelId,
        record: DecodedRecord,
        now_ms: u64,
    ) -> Result<(), StoreError>;
}

impl<T: RecordSink + ?Sized> RecordSink for &T {
    fn publish(
        &self,
        channel: ChannelId,
        record: DecodedRecord,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        (**self).publish(channel, record, now_ms)
    }
}

#[derive(Debug)]
struct Slot<const W: usize> {
    config: ChannelConfig,
    latest: Option<Reading>,
    window: SampleWindow<W>,
}

/// Latest record and rolling average per sensor channel
///
/// `CHANNELS` bounds the number of channels, `WINDOW` the averaging window.
pub struct SensorStateStore<M: RawMutex, const CHANNELS: usize, const WINDOW: usize = DEFAULT_WINDOW>
{
    slots: Mutex<M, RefCell<Vec<Slot<WINDOW>, CHANNELS>>>,
    updated: Signal<M, ChannelId>,
}

impl<M: RawMutex, const CHANNELS: usize, const WINDOW: usize>
    SensorStateStore<M, CHANNELS, WINDOW>
{
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Vec::new())),
            updated: Signal::new(),
        }
    }

    /// Add a channel
    pub fn register(&self, config: ChannelConfig) -> Result<ChannelId, StoreError> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if slots.iter().any(|s| s.config.name == config.name) {
                return Err(StoreError::DuplicateName);
            }
            let id = u8::try_from(slots.len()).map_err(|_| StoreError::Full)?;
            slots
                .push(Slot {
                    config,
                    latest: None,
                    window: SampleWindow::new(),
                })
                .map_err(|_| StoreError::Full)?;
            Ok(ChannelId(id))
        })
    }

    /// Look up a channel by name
    pub fn find(&self, name: &str) -> Option<ChannelId> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .position(|s| s.config.name == name)
                .and_then(|i| u8::try_from(i).ok())
                .map(ChannelId)
        })
    }

    /// Name of a registered channel
    pub fn name(&self, channel: ChannelId) -> Option<String<MAX_LABEL_LEN>> {
        self.with_slot(channel, |slot| slot.config.name.clone())
    }

    pub fn channel_count(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().len())
    }

    /// Replace a channel's latest record
    ///
    /// If the channel averages a field and the record carries it, the value
    /// is pushed into the window, evicting the oldest sample when full.
    pub fn update(
        &self,
        channel: ChannelId,
        record: DecodedRecord,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = slots
                .get_mut(channel.index())
                .ok_or(StoreError::UnknownChannel)?;

            let sequence = slot
                .latest
                .map(|r| r.sequence.wrapping_add(1))
                .unwrap_or(1);
            slot.latest = Some(Reading {
                record,
                received_at_ms: now_ms,
                sequence,
            });

            if let Some(field) = &slot.config.averaged {
                if let Some(value) = record.numeric(field) {
                    slot.window.push(value);
                }
            }
            Ok(())
        })?;

        self.updated.signal(channel);
        Ok(())
    }

    /// Most recent record, if any
    pub fn latest(&self, channel: ChannelId) -> Option<DecodedRecord> {
        self.reading(channel).map(|r| r.record)
    }

    /// Most recent record with receipt metadata
    pub fn reading(&self, channel: ChannelId) -> Option<Reading> {
        self.with_slot(channel, |slot| slot.latest).flatten()
    }

    /// Mean of the averaging window, `None` with fewer than 2 samples
    pub fn average(&self, channel: ChannelId) -> Option<f64> {
        self.with_slot(channel, |slot| slot.window.mean()).flatten()
    }

    /// Samples currently in the averaging window
    pub fn sample_count(&self, channel: ChannelId) -> usize {
        self.with_slot(channel, |slot| slot.window.len())
            .unwrap_or(0)
    }

    /// Staleness of the latest record at time `now_ms`
    pub fn status(&self, channel: ChannelId, now_ms: u64) -> ChannelStatus {
        self.with_slot(channel, |slot| match slot.latest {
            None => ChannelStatus::Absent,
            Some(_) if slot.config.stale_after_ms == 0 => ChannelStatus::Fresh,
            Some(reading) => {
                let age = now_ms.saturating_sub(reading.received_at_ms);
                if age > u64::from(slot.config.stale_after_ms) {
                    ChannelStatus::Stale
                } else {
                    ChannelStatus::Fresh
                }
            }
        })
        .unwrap_or(ChannelStatus::Absent)
    }

    /// Wait until any channel is updated and return which one
    ///
    /// Updates that happen while nobody waits collapse into the latest
    /// channel id. Meant for a single consumer task.
    pub async fn wait_update(&self) -> ChannelId {
        self.updated.wait().await
    }

    fn with_slot<R>(&self, channel: ChannelId, f: impl FnOnce(&Slot<WINDOW>) -> R) -> Option<R> {
        self.slots
            .lock(|slots| slots.borrow().get(channel.index()).map(f))
    }
}

impl<M: RawMutex, const CHANNELS: usize, const WINDOW: usize> Default
    for SensorStateStore<M, CHANNELS, WINDOW>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const CHANNELS: usize, const WINDOW: usize> RecordSink
    for SensorStateStore<M, CHANNELS, WINDOW>
{
    fn publish(
        &self,
        channel: ChannelId,
        record: DecodedRecord,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.update(channel, record, now_ms)
    }
}
