//! Read loop state machine
//!
//! ```text
//! Syncing ──frame──▶ Validating ──valid──▶ Decoding ──record──▶ Publishing
//!    ▲  ▲                │                    │                     │
//!    │  └───invalid──────┘                    │                     │
//!    │  └───malformed / unsupported───────────┘                     │
//!    └──────────────────── store update + inter-frame sleep ────────┘
//! ```
//!
//! Every recoverable error returns to `Syncing`. Checksum and payload
//! failures hand the candidate back to the synchronizer so scanning resumes
//! at the byte after its first one. Only link faults leave the loop.

use core::ops::Range;

use embedded_hal_async::delay::DelayNs;
use heapless::{String, Vec};
use sensorlink_hal::{ByteSource, Clock, FaultKind, SourceError};
use sensorlink_protocol::{
    ChecksumError, FrameSynchronizer, Framing, RawFrame, ResyncReason, SyncError,
};

use super::stats::LinkStats;
use crate::config::{ConfigError, SourceConfig, MAX_LABEL_LEN};
use crate::decode::{DecodeError, FrameDecoder, FrameSpec, MAX_SPECS};
use crate::record::DecodedRecord;
use crate::store::{ChannelId, RecordSink, StoreError};

/// Where the loop is in the current frame cycle
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Waiting for the synchronizer to deliver a candidate frame
    Syncing,
    /// Candidate frame awaiting checksum validation
    Validating(RawFrame),
    /// Validated frame; `payload` locates the checksummed payload
    Decoding { frame: RawFrame, payload: Range<usize> },
    /// Decoded record awaiting publication
    Publishing {
        channel: ChannelId,
        record: DecodedRecord,
    },
}

/// [`LoopState`] without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopPhase {
    Syncing,
    Validating,
    Decoding,
    Publishing,
}

impl LoopState {
    pub fn phase(&self) -> LoopPhase {
        match self {
            LoopState::Syncing => LoopPhase::Syncing,
            LoopState::Validating(_) => LoopPhase::Validating,
            LoopState::Decoding { .. } => LoopPhase::Decoding,
            LoopState::Publishing { .. } => LoopPhase::Publishing,
        }
    }
}

/// Outcome of one state transition
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Candidate frame collected
    Synced,
    /// Synchronization attempt abandoned
    Resync(ResyncReason),
    /// Checksum matched
    Validated,
    /// Checksum failed; scanning resumes at the next byte
    Invalid(ChecksumError),
    /// Record decoded for this channel
    Decoded(ChannelId),
    /// Payload unusable; scanning resumes at the next byte
    Malformed(DecodeError),
    /// Valid frame of a kind with no route; dropped
    Unsupported,
    /// Record stored
    Published(ChannelId),
    /// Store refused the record
    Rejected(StoreError),
}

/// Cooperative read loop for one byte source
///
/// `N` bounds the number of frame kinds routed from this source.
pub struct ReadLoop<'a, S, D, C, P: ?Sized, const N: usize = MAX_SPECS> {
    label: String<MAX_LABEL_LEN>,
    source: S,
    delay: D,
    clock: C,
    sink: &'a P,
    sync: FrameSynchronizer,
    decoder: FrameDecoder<N>,
    /// Target channel per registered frame kind, index-aligned with `decoder`
    routes: Vec<ChannelId, N>,
    min_interval_ms: u32,
    state: LoopState,
    stats: LinkStats,
}

impl<'a, S, D, C, P, const N: usize> ReadLoop<'a, S, D, C, P, N>
where
    S: ByteSource,
    D: DelayNs,
    C: Clock,
    P: RecordSink + ?Sized,
{
    pub fn new(
        source: S,
        delay: D,
        clock: C,
        sink: &'a P,
        framing: Framing,
        config: &SourceConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            label: config.label.clone(),
            source,
            delay,
            clock,
            sink,
            sync: FrameSynchronizer::new(framing, config.read_timeout_ms)?,
            decoder: FrameDecoder::new(),
            routes: Vec::new(),
            min_interval_ms: config.min_interval_ms,
            state: LoopState::Syncing,
            stats: LinkStats::default(),
        })
    }

    /// Publish records of kind `spec` to `channel`
    pub fn route(&mut self, spec: &'static FrameSpec, channel: ChannelId) -> Result<(), ConfigError> {
        if spec.framing != *self.sync.framing() {
            return Err(ConfigError::FramingMismatch);
        }
        if self.routes.is_full() {
            return Err(ConfigError::TooManyRoutes);
        }
        self.decoder.register(spec)?;
        self.routes
            .push(channel)
            .map_err(|_| ConfigError::TooManyRoutes)
    }

    /// Perform one state transition
    ///
    /// Recoverable errors are absorbed and reported as a [`Step`]. A link
    /// fault resets the loop and is returned; the caller must reinitialize
    /// the link before stepping again.
    pub async fn step(&mut self) -> Result<Step, FaultKind> {
        // Leave the loop in Syncing while suspended so a cancelled step
        // restarts cleanly.
        let state = core::mem::replace(&mut self.state, LoopState::Syncing);

        match state {
            LoopState::Syncing => self.sync_frame().await,
            LoopState::Validating(frame) => Ok(self.validate(frame)),
            LoopState::Decoding { frame, payload } => Ok(self.decode(frame, payload)),
            LoopState::Publishing { channel, record } => self.publish(channel, record).await,
        }
    }

    /// Step until a record is published or the link faults
    pub async fn next_record(&mut self) -> Result<(ChannelId, DecodedRecord), FaultKind> {
        loop {
            let pending = match self.state {
                LoopState::Publishing { record, .. } => Some(record),
                _ => None,
            };
            if let (Step::Published(channel), Some(record)) = (self.step().await?, pending) {
                return Ok((channel, record));
            }
        }
    }

    /// Run until the link faults
    pub async fn run(&mut self) -> FaultKind {
        #[cfg(feature = "defmt")]
        defmt::info!("{}: read loop started", self.label.as_str());

        loop {
            if let Err(kind) = self.step().await {
                return kind;
            }
        }
    }

    /// Drop the current frame cycle and any bytes held for rescanning
    pub fn reset(&mut self) {
        self.state = LoopState::Syncing;
        self.sync.reset();
    }

    /// Reinitialize the source after a fault and start over
    ///
    /// Nothing received before the fault is decoded afterwards.
    pub async fn recover(&mut self) -> Result<(), FaultKind> {
        self.reset();
        self.source.reinit().await
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bytes handed back to the synchronizer and not yet rescanned
    pub fn pending(&self) -> usize {
        self.sync.pending()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give the source back, e.g. to reinitialize it after a fault
    pub fn into_source(self) -> S {
        self.source
    }

    async fn sync_frame(&mut self) -> Result<Step, FaultKind> {
        match self.sync.next_frame(&mut self.source).await {
            Ok(frame) => {
                self.state = LoopState::Validating(frame);
                Ok(Step::Synced)
            }
            Err(SyncError::Resync(reason)) => {
                self.stats.record_resync(reason);
                #[cfg(feature = "defmt")]
                if reason != ResyncReason::Timeout {
                    defmt::debug!("{}: resync ({})", self.label.as_str(), reason);
                }
                Ok(Step::Resync(reason))
            }
            Err(SyncError::Fault(kind)) => Err(self.fault(kind)),
        }
    }

    fn fault(&mut self, kind: FaultKind) -> FaultKind {
        self.reset();
        self.stats.faults = self.stats.faults.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::warn!("{}: link fault {}", self.label.as_str(), kind);
        kind
    }

    fn validate(&mut self, frame: RawFrame) -> Step {
        let framing = *self.sync.framing();
        match framing.checksum.payload_range(&framing, &frame) {
            Ok(payload) => {
                self.state = LoopState::Decoding { frame, payload };
                Step::Validated
            }
            Err(e) => {
                self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: checksum error {}", self.label.as_str(), e);
                self.sync.rescan(&frame);
                Step::Invalid(e)
            }
        }
    }

    fn decode(&mut self, frame: RawFrame, payload: Range<usize>) -> Step {
        let bytes = frame.as_bytes().get(payload).unwrap_or(&[]);
        match self.decoder.decode(bytes) {
            Ok(decoded) => match self.routes.get(decoded.index) {
                Some(&channel) => {
                    self.state = LoopState::Publishing {
                        channel,
                        record: decoded.record,
                    };
                    Step::Decoded(channel)
                }
                None => self.unsupported(),
            },
            Err(DecodeError::Unsupported) => self.unsupported(),
            Err(e) => {
                self.stats.malformed = self.stats.malformed.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: malformed record {}", self.label.as_str(), e);
                self.sync.rescan(&frame);
                Step::Malformed(e)
            }
        }
    }

    fn unsupported(&mut self) -> Step {
        self.stats.unsupported = self.stats.unsupported.wrapping_add(1);
        Step::Unsupported
    }

    async fn publish(
        &mut self,
        channel: ChannelId,
        record: DecodedRecord,
    ) -> Result<Step, FaultKind> {
        let now = self.clock.now_ms();
        let step = match self.sink.publish(channel, record, now) {
            Ok(()) => {
                self.stats.published = self.stats.published.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::debug!("{}: {} -> channel {}", self.label.as_str(), record.kind(), channel);
                Step::Published(channel)
            }
            Err(e) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: store rejected record {}", self.label.as_str(), e);
                Step::Rejected(e)
            }
        };

        if self.min_interval_ms > 0 {
            self.delay.delay_ms(self.min_interval_ms).await;
            // Whatever queued up during the sleep is stale
            self.sync.reset();
            match self.source.discard_backlog().await {
                Ok(()) | Err(SourceError::Timeout) => {}
                Err(SourceError::Fault(kind)) => return Err(self.fault(kind)),
            }
        }
        Ok(step)
    }
}
