//! In-memory byte source
//!
//! Replays a recorded capture through the [`ByteSource`] interface. Used for
//! host-side testing and for decoding logs captured from a live link.

use crate::uart::{ByteSource, FaultKind, SourceError};

/// [`ByteSource`] over a byte slice
///
/// Reads behave like a UART that stops transmitting: when fewer bytes remain
/// than requested, the remaining bytes are consumed and the read times out.
/// A stall point can be scripted to simulate the line going quiet mid-frame,
/// and a fault point to simulate the device detaching. A backlog mark
/// stands for bytes queued in a receive buffer: the next
/// [`discard_backlog`](ByteSource::discard_backlog) or
/// [`reinit`](ByteSource::reinit) skips past it.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
    stall_at: Option<usize>,
    fault_at: Option<(usize, FaultKind)>,
    backlog_until: Option<usize>,
    reads: usize,
    reinits: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a source that yields `data` and then times out forever
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            stall_at: None,
            fault_at: None,
            backlog_until: None,
            reads: 0,
            reinits: 0,
        }
    }

    /// Time out once when a read reaches byte offset `pos`
    pub fn with_stall_at(mut self, pos: usize) -> Self {
        self.stall_at = Some(pos);
        self
    }

    /// Fail with a link fault once a read reaches byte offset `pos`
    pub fn with_fault_at(mut self, pos: usize, kind: FaultKind) -> Self {
        self.fault_at = Some((pos, kind));
        self
    }

    /// Treat everything before byte offset `pos` as queued backlog
    pub fn with_backlog_until(mut self, pos: usize) -> Self {
        self.backlog_until = Some(pos);
        self
    }

    /// Current stream cursor
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the whole capture has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Number of read calls served so far
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Number of times the source was reinitialized
    pub fn reinit_count(&self) -> usize {
        self.reinits
    }

    fn skip_backlog(&mut self) {
        if let Some(end) = self.backlog_until.take() {
            self.pos = self.pos.max(end.min(self.data.len()));
        }
    }
}

impl ByteSource for SliceSource<'_> {
    async fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<(), SourceError> {
        self.reads += 1;
        let end = self.pos + buf.len();

        if let Some((at, kind)) = self.fault_at {
            if end > at {
                self.fault_at = None;
                self.pos = at.min(self.data.len());
                return Err(SourceError::Fault(kind));
            }
        }

        if let Some(at) = self.stall_at {
            if end > at {
                // Bytes up to the stall are pulled off the line and lost
                self.stall_at = None;
                self.pos = at.min(self.data.len());
                return Err(SourceError::Timeout);
            }
        }

        if end > self.data.len() {
            self.pos = self.data.len();
            return Err(SourceError::Timeout);
        }

        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    async fn discard_backlog(&mut self) -> Result<(), SourceError> {
        self.skip_backlog();
        Ok(())
    }

    async fn reinit(&mut self) -> Result<(), FaultKind> {
        self.reinits += 1;
        self.skip_backlog();
        Ok(())
    }
}
