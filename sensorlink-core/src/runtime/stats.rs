//! Link health counters

use sensorlink_protocol::ResyncReason;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters kept by one read loop
///
/// All counters wrap on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkStats {
    /// Records accepted by the store
    pub published: u32,
    /// Records the store refused
    pub rejected: u32,
    /// Frames failing checksum validation
    pub checksum_errors: u32,
    /// Valid frames with an unusable payload
    pub malformed: u32,
    /// Valid frames of a kind nobody registered
    pub unsupported: u32,
    pub resync_timeout: u32,
    pub resync_overflow: u32,
    pub resync_truncated: u32,
    pub resync_bad_length: u32,
    /// Link faults (each one ends a `run`)
    pub faults: u32,
}

impl LinkStats {
    pub(crate) fn record_resync(&mut self, reason: ResyncReason) {
        let counter = match reason {
            ResyncReason::Timeout => &mut self.resync_timeout,
            ResyncReason::Overflow => &mut self.resync_overflow,
            ResyncReason::Truncated => &mut self.resync_truncated,
            ResyncReason::BadLength => &mut self.resync_bad_length,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Resyncs for any reason
    pub fn resyncs(&self) -> u32 {
        self.resync_timeout
            .wrapping_add(self.resync_overflow)
            .wrapping_add(self.resync_truncated)
            .wrapping_add(self.resync_bad_length)
    }

    /// Frames discarded after synchronization (checksum or payload errors)
    ///
    /// Unrelated to `rejected`, which counts decoded records the store refused.
    pub fn bad_frames(&self) -> u32 {
        self.checksum_errors.wrapping_add(self.malformed)
    }
}
