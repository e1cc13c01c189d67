//! UART serial byte sources
//!
//! Provides the receive-side abstraction every sensor link is decoded from.
//! Implementations wrap a chip-specific UART driver (or a recorded capture)
//! and enforce the read timeout themselves.

/// Lower-level link failures
///
/// A fault means the link can no longer be trusted to deliver bytes in order;
/// the owner must reinitialize the UART before reading again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Receive FIFO overflowed, bytes were lost
    Overrun,
    /// Framing or parity error on the line
    LineError,
    /// Device detached or peripheral unavailable
    Detached,
}

/// Errors returned by [`ByteSource::read`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// The requested bytes did not arrive within the timeout (recoverable)
    Timeout,
    /// The link failed (fatal for this source)
    Fault(FaultKind),
}

/// Receive side of a serial link
///
/// Reads are all-or-nothing: [`read`](ByteSource::read) either fills the
/// whole buffer or fails. A short read is never reported as success.
///
/// Dropping an in-flight `read` future must be safe; bytes it may already
/// have pulled from the peripheral are simply lost.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    /// Fill `buf` completely, waiting at most `timeout_ms` for all bytes
    ///
    /// Advances the stream cursor by `buf.len()` on success.
    async fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), SourceError>;

    /// Read a single byte
    async fn read_byte(&mut self, timeout_ms: u32) -> Result<u8, SourceError> {
        let mut buf = [0u8; 1];
        self.read(&mut buf, timeout_ms).await?;
        Ok(buf[0])
    }

    /// Drop bytes already received but not yet read
    ///
    /// Called after a deliberate pause so the next frame is current rather
    /// than whatever queued up meanwhile. Sources without a receive queue
    /// keep the default.
    async fn discard_backlog(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Bring the link back to a known state after a fault
    ///
    /// Nothing received before the call may be returned by a later read.
    async fn reinit(&mut self) -> Result<(), FaultKind> {
        Ok(())
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    async fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), SourceError> {
        (**self).read(buf, timeout_ms).await
    }

    async fn discard_backlog(&mut self) -> Result<(), SourceError> {
        (**self).discard_backlog().await
    }

    async fn reinit(&mut self) -> Result<(), FaultKind> {
        (**self).reinit().await
    }
}

/// UART line settings
///
/// Opaque to the decoding crates; carried so the bootstrap layer can set up
/// the peripheral from the same configuration that names the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartSettings {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartSettings {
    /// 8N1 at the given baud rate
    pub const fn new_8n1(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Time to shift one character onto the line, in microseconds
    ///
    /// Counts the start bit, data bits, parity bit and stop bits.
    pub fn char_time_us(&self) -> u32 {
        let bits = 1
            + self.data_bits.count()
            + u32::from(self.parity != Parity::None)
            + self.stop_bits.count();
        (bits * 1_000_000).div_ceil(self.baudrate.max(1))
    }
}

impl Default for UartSettings {
    fn default() -> Self {
        // Every sensor in this family ships at 9600 8N1
        Self::new_8n1(9600)
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

impl DataBits {
    fn count(self) -> u32 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    fn count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}
