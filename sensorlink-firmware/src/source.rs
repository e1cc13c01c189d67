//! embassy-rp adapters for the hardware abstraction traits

use embassy_rp::uart::{BufferedUartRx, Error as UartError};
use embassy_time::{with_timeout, Duration, Instant};
use embedded_io_async::{Read, ReadExactError};

use sensorlink_hal::{ByteSource, Clock, FaultKind, SourceError};

/// Idle gap that ends a drain: a few character times at 9600 baud
const DRAIN_IDLE_MS: u64 = 5;

/// Drain ceiling, so a line that never goes quiet cannot stall the loop
const DRAIN_MAX_BYTES: usize = 4096;

/// Receive half of a buffered RP2040 UART
pub struct UartSource {
    rx: BufferedUartRx,
}

impl UartSource {
    pub fn new(rx: BufferedUartRx) -> Self {
        Self { rx }
    }
}

impl ByteSource for UartSource {
    async fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), SourceError> {
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        match with_timeout(timeout, self.rx.read_exact(buf)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(ReadExactError::UnexpectedEof)) => Err(SourceError::Fault(FaultKind::Detached)),
            Ok(Err(ReadExactError::Other(e))) => Err(SourceError::Fault(fault_kind(e))),
            Err(_) => Err(SourceError::Timeout),
        }
    }

    /// Empty the RX ring buffer until the line goes idle
    ///
    /// An overrun reported while draining belongs to the discarded backlog
    /// and is cleared by the read that reports it.
    async fn discard_backlog(&mut self) -> Result<(), SourceError> {
        let mut scratch = [0u8; 64];
        let mut dropped = 0;

        while dropped < DRAIN_MAX_BYTES {
            match with_timeout(Duration::from_millis(DRAIN_IDLE_MS), self.rx.read(&mut scratch)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => dropped += n,
                Ok(Err(UartError::Overrun)) => {}
                Ok(Err(e)) => return Err(SourceError::Fault(fault_kind(e))),
            }
        }
        Ok(())
    }

    /// Clear error state and drop everything received before the fault
    async fn reinit(&mut self) -> Result<(), FaultKind> {
        match self.discard_backlog().await {
            Ok(()) | Err(SourceError::Timeout) => Ok(()),
            Err(SourceError::Fault(kind)) => Err(kind),
        }
    }
}

fn fault_kind(error: UartError) -> FaultKind {
    match error {
        UartError::Overrun => FaultKind::Overrun,
        // A line held low is what an unplugged sensor looks like
        UartError::Break => FaultKind::Detached,
        _ => FaultKind::LineError,
    }
}

/// Milliseconds since boot from the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
