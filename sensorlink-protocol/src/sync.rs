//! Frame synchronization over a [`ByteSource`].
//!
//! The synchronizer locates the next start pattern in the stream, even when
//! the preceding bytes were noise or a truncated frame, then collects the
//! rest of the frame according to the [`Framing`] length rule.
//!
//! Partial frames never survive a failed attempt: a read timeout drops
//! everything collected so far. The only bytes carried between attempts are
//! the ones explicitly handed back with [`FrameSynchronizer::rescan`].

use heapless::Deque;
use sensorlink_hal::{ByteSource, FaultKind, SourceError};

use crate::framing::{
    FrameLength, Framing, FramingError, RawFrame, LINE_END, MAX_FRAME_LEN, MAX_START_LEN,
};

/// Why a synchronization attempt was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResyncReason {
    /// A read did not complete within the timeout
    Timeout,
    /// Line exceeded the maximum length without a terminator
    Overflow,
    /// A new start marker appeared before the line terminator
    Truncated,
    /// Length field value cannot describe a valid frame
    BadLength,
}

/// Result of a failed synchronization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Recoverable: try again from the top
    Resync(ResyncReason),
    /// Fatal for this source: the link must be reinitialized
    Fault(FaultKind),
}

impl From<SourceError> for SyncError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Timeout => SyncError::Resync(ResyncReason::Timeout),
            SourceError::Fault(kind) => SyncError::Fault(kind),
        }
    }
}

/// Streaming frame synchronizer for one link
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    framing: Framing,
    timeout_ms: u32,
    /// Bytes handed back for rescanning, consumed before the source
    replay: Deque<u8, MAX_FRAME_LEN>,
}

impl FrameSynchronizer {
    /// Create a synchronizer for `framing`
    ///
    /// `timeout_ms` bounds every individual read from the source.
    pub fn new(framing: Framing, timeout_ms: u32) -> Result<Self, FramingError> {
        framing.check()?;
        Ok(Self {
            framing,
            timeout_ms,
            replay: Deque::new(),
        })
    }

    /// Framing this synchronizer was built for
    pub fn framing(&self) -> &Framing {
        &self.framing
    }

    /// Number of handed-back bytes still waiting to be rescanned
    pub fn pending(&self) -> usize {
        self.replay.len()
    }

    /// Forget any handed-back bytes
    ///
    /// Call after reinitializing the link: bytes from before a fault must not
    /// be spliced onto bytes read after it.
    pub fn reset(&mut self) {
        self.replay.clear();
    }

    /// Hand a rejected frame back so scanning resumes at its second byte
    ///
    /// This lets a start pattern embedded in a corrupted frame's payload be
    /// found on the next attempt.
    pub fn rescan(&mut self, frame: &RawFrame) {
        let tail = match frame.as_bytes().split_first() {
            Some((_, tail)) => tail,
            None => return,
        };

        // The frame was assembled from the front of the replay queue, so this
        // only overflows if the queue was already holding unrelated bytes;
        // those are older than the frame and get dropped.
        if self.replay.len() + tail.len() > self.replay.capacity() {
            self.replay.clear();
        }
        for &byte in tail.iter().rev() {
            if self.replay.push_front(byte).is_err() {
                break;
            }
        }
    }

    /// Collect the next candidate frame from `source`
    ///
    /// The returned frame has exactly the length the framing requires but
    /// has not been checksum-validated.
    pub async fn next_frame<S: ByteSource>(
        &mut self,
        source: &mut S,
    ) -> Result<RawFrame, SyncError> {
        self.hunt(source).await?;

        let start = self.framing.start;
        let mut frame = RawFrame::new();
        frame.extend(start);

        match self.framing.length {
            FrameLength::Fixed(total) => {
                self.fill(source, &mut frame, total).await?;
            }
            FrameLength::LengthField { width } => {
                self.fill(source, &mut frame, start.len() + width).await?;

                let min_total = start.len() + width + self.framing.checksum.min_trailer_len();
                let total = self.framing.total_length(frame.as_bytes()).unwrap_or(0);
                if total < min_total || total > MAX_FRAME_LEN {
                    self.rescan(&frame);
                    return Err(SyncError::Resync(ResyncReason::BadLength));
                }
                self.fill(source, &mut frame, total).await?;
            }
            FrameLength::Line { max_len } => {
                self.read_line(source, &mut frame, max_len).await?;
            }
        }

        Ok(frame)
    }

    /// Consume bytes until the last `start.len()` bytes equal the start pattern
    async fn hunt<S: ByteSource>(&mut self, source: &mut S) -> Result<(), SyncError> {
        let start = self.framing.start;
        let n = start.len();
        let mut window = [0u8; MAX_START_LEN];
        let mut filled = 0;

        loop {
            let byte = self.next_byte(source).await?;
            if filled == n {
                window.copy_within(1..n, 0);
                window[n - 1] = byte;
            } else {
                window[filled] = byte;
                filled += 1;
            }

            if filled == n && window[..n] == *start {
                return Ok(());
            }
        }
    }

    /// Extend `frame` to exactly `total` bytes
    async fn fill<S: ByteSource>(
        &mut self,
        source: &mut S,
        frame: &mut RawFrame,
        total: usize,
    ) -> Result<(), SyncError> {
        while frame.len() < total {
            match self.replay.pop_front() {
                Some(byte) => {
                    frame.push(byte);
                }
                None => break,
            }
        }

        let need = total.saturating_sub(frame.len());
        if need > 0 {
            let mut buf = [0u8; MAX_FRAME_LEN];
            source.read(&mut buf[..need], self.timeout_ms).await?;
            frame.extend(&buf[..need]);
        }
        Ok(())
    }

    /// Collect bytes up to and including the line terminator
    async fn read_line<S: ByteSource>(
        &mut self,
        source: &mut S,
        frame: &mut RawFrame,
        max_len: usize,
    ) -> Result<(), SyncError> {
        let marker = self.framing.start[0];

        loop {
            let byte = self.next_byte(source).await?;

            if byte == marker {
                // Resume the hunt at this marker, not after it
                let _ = self.replay.push_front(byte);
                return Err(SyncError::Resync(ResyncReason::Truncated));
            }
            if frame.len() >= max_len || !frame.push(byte) {
                return Err(SyncError::Resync(ResyncReason::Overflow));
            }
            if byte == LINE_END {
                return Ok(());
            }
        }
    }

    async fn next_byte<S: ByteSource>(&mut self, source: &mut S) -> Result<u8, SyncError> {
        if let Some(byte) = self.replay.pop_front() {
            return Ok(byte);
        }
        Ok(source.read_byte(self.timeout_ms).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use embassy_futures::block_on;
    use proptest::prelude::*;
    use sensorlink_hal::SliceSource;

    const PMS: Framing = Framing {
        start: &[0x42, 0x4D],
        length: FrameLength::LengthField { width: 2 },
        checksum: Checksum::Additive16,
    };

    const NMEA: Framing = Framing {
        start: b"$GP",
        length: FrameLength::Line { max_len: 82 },
        checksum: Checksum::NmeaXor,
    };

    const SHORT: Framing = Framing {
        start: &[0xAA, 0x55],
        length: FrameLength::Fixed(8),
        checksum: Checksum::Additive16,
    };

    fn pms_frame(pm2_5: u16) -> [u8; 32] {
        let mut frame = [0u8; 32];
        frame[0] = 0x42;
        frame[1] = 0x4D;
        frame[3] = 0x1C;
        frame[6..8].copy_from_slice(&pm2_5.to_be_bytes());
        let sum = Checksum::additive16(&frame[..30]);
        frame[30..].copy_from_slice(&sum.to_be_bytes());
        frame
    }

    fn short_frame(payload: [u8; 4]) -> [u8; 8] {
        let mut frame = [0xAA, 0x55, payload[0], payload[1], payload[2], payload[3], 0, 0];
        let sum = Checksum::additive16(&frame[..6]);
        frame[6..].copy_from_slice(&sum.to_be_bytes());
        frame
    }

    fn stream(parts: &[&[u8]]) -> heapless::Vec<u8, 512> {
        let mut out = heapless::Vec::new();
        for part in parts {
            out.extend_from_slice(part).unwrap();
        }
        out
    }

    #[test]
    fn test_finds_frame_after_garbage() {
        let frame = pms_frame(10);
        let data = stream(&[&[0x00, 0xFF, 0x4D, 0x12], &frame]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(PMS, 100).unwrap();

        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &frame[..]);
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_repeated_first_start_byte() {
        let frame = pms_frame(10);
        let data = stream(&[&[0x42, 0x42], &frame]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(PMS, 100).unwrap();

        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &frame[..]);
    }

    #[test]
    fn test_timeout_mid_frame_discards_partial() {
        let first = pms_frame(1);
        let second = pms_frame(2);
        let data = stream(&[&first, &second]);
        // Line goes quiet 10 bytes into the first frame
        let mut src = SliceSource::new(&data).with_stall_at(10);
        let mut sync = FrameSynchronizer::new(PMS, 100).unwrap();

        assert_eq!(
            block_on(sync.next_frame(&mut src)),
            Err(SyncError::Resync(ResyncReason::Timeout))
        );
        assert_eq!(sync.pending(), 0);

        // Tail of the abandoned frame holds no start pattern; the next
        // attempt lands on the second frame
        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &second[..]);
    }

    #[test]
    fn test_rescan_finds_start_inside_rejected_frame() {
        let good = short_frame([1, 2, 3, 4]);
        let data = stream(&[&[0xAA, 0x55], &good]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(SHORT, 100).unwrap();

        let candidate = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(&candidate.as_bytes()[..4], &[0xAA, 0x55, 0xAA, 0x55]);
        assert!(Checksum::Additive16.validate(&SHORT, &candidate).is_err());

        sync.rescan(&candidate);
        assert_eq!(sync.pending(), 7);

        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &good[..]);
        assert!(Checksum::Additive16.validate(&SHORT, &raw).is_ok());
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn test_bad_length_field_is_rescanned() {
        let frame = pms_frame(7);
        let data = stream(&[&[0x42, 0x4D, 0x00, 0x00], &frame]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(PMS, 100).unwrap();

        assert_eq!(
            block_on(sync.next_frame(&mut src)),
            Err(SyncError::Resync(ResyncReason::BadLength))
        );
        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &frame[..]);
    }

    #[test]
    fn test_line_frame() {
        let line = b"$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n";
        let data = stream(&[b"\r\nM,,*47\r\n", line]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(NMEA, 100).unwrap();

        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &line[..]);
    }

    #[test]
    fn test_line_restarts_at_new_marker() {
        let line = b"$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n";
        let data = stream(&[b"$GPGGA,1235", line]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(NMEA, 100).unwrap();

        assert_eq!(
            block_on(sync.next_frame(&mut src)),
            Err(SyncError::Resync(ResyncReason::Truncated))
        );
        let raw = block_on(sync.next_frame(&mut src)).unwrap();
        assert_eq!(raw.as_bytes(), &line[..]);
    }

    #[test]
    fn test_line_overflow() {
        let framing = Framing {
            length: FrameLength::Line { max_len: 16 },
            ..NMEA
        };
        let data = stream(&[b"$GPGSV,1,1,00,00,00,00*79\r\n"]);
        let mut src = SliceSource::new(&data);
        let mut sync = FrameSynchronizer::new(framing, 100).unwrap();

        assert_eq!(
            block_on(sync.next_frame(&mut src)),
            Err(SyncError::Resync(ResyncReason::Overflow))
        );
    }

    #[test]
    fn test_fault_propagates() {
        let frame = pms_frame(3);
        let mut src = SliceSource::new(&frame).with_fault_at(5, FaultKind::Overrun);
        let mut sync = FrameSynchronizer::new(PMS, 100).unwrap();

        assert_eq!(
            block_on(sync.next_frame(&mut src)),
            Err(SyncError::Fault(FaultKind::Overrun))
        );
    }

    #[test]
    fn test_invalid_framing_rejected() {
        let framing = Framing { start: &[], ..PMS };
        assert!(FrameSynchronizer::new(framing, 100).is_err());
    }

    /// Drive synchronize + validate until the source runs dry
    fn collect_valid(data: &[u8], framing: Framing) -> heapless::Vec<RawFrame, 8> {
        let mut src = SliceSource::new(data);
        let mut sync = FrameSynchronizer::new(framing, 100).unwrap();
        let mut valid = heapless::Vec::new();

        while !src.is_exhausted() || sync.pending() > 0 {
            match block_on(sync.next_frame(&mut src)) {
                Ok(raw) => match framing.checksum.validate(&framing, &raw) {
                    Ok(_) => valid.push(raw).unwrap(),
                    Err(_) => sync.rescan(&raw),
                },
                Err(SyncError::Resync(_)) => {}
                Err(SyncError::Fault(_)) => unreachable!(),
            }
        }
        valid
    }

    proptest! {
        #[test]
        fn prop_garbage_then_frame_yields_exactly_that_frame(
            garbage in proptest::collection::vec(any::<u8>(), 0..200),
            pm2_5 in any::<u16>(),
        ) {
            // Noise never contains the full start pattern
            let garbage: std::vec::Vec<u8> = garbage
                .into_iter()
                .map(|b| if b == 0x4D { 0x4E } else { b })
                .collect();
            let frame = pms_frame(pm2_5);
            let mut data = garbage.clone();
            data.extend_from_slice(&frame);

            let valid = collect_valid(&data, PMS);
            prop_assert_eq!(valid.len(), 1);
            prop_assert_eq!(valid[0].as_bytes(), &frame[..]);
        }
    }
}
