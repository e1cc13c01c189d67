//! Host to sensor commands
//!
//! Command frames are `42 4D cmd data_hi data_lo chk_hi chk_lo`. After a
//! wake-up the fan needs about 30 s before readings are stable.

use embedded_io_async::Write;
use sensorlink_protocol::{encode_command, CommandError};

use super::START;

/// Encoded command frame length
pub const COMMAND_LEN: usize = 7;

/// Commands understood by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmsCommand {
    /// Leave sleep mode (fan on)
    Wakeup,
    /// Enter sleep mode (fan off)
    Sleep,
    /// Stream frames continuously
    ActiveMode,
    /// Only send a frame when asked
    PassiveMode,
    /// Request one frame in passive mode
    PassiveRead,
}

/// Errors sending a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError<E> {
    Encode(CommandError),
    Io(E),
}

impl PmsCommand {
    /// Command byte and 16-bit argument
    pub const fn body(self) -> [u8; 3] {
        match self {
            PmsCommand::Wakeup => [0xE4, 0x00, 0x01],
            PmsCommand::Sleep => [0xE4, 0x00, 0x00],
            PmsCommand::ActiveMode => [0xE1, 0x00, 0x01],
            PmsCommand::PassiveMode => [0xE1, 0x00, 0x00],
            PmsCommand::PassiveRead => [0xE2, 0x00, 0x00],
        }
    }

    /// Encode the complete frame
    pub fn encode(self) -> Result<[u8; COMMAND_LEN], CommandError> {
        let mut frame = [0u8; COMMAND_LEN];
        encode_command(&START, &self.body(), &mut frame)?;
        Ok(frame)
    }
}

/// Write one command frame to the sensor's receive line
pub async fn send_command<W: Write>(tx: &mut W, command: PmsCommand) -> Result<(), SendError<W::Error>> {
    let frame = command.encode().map_err(SendError::Encode)?;
    tx.write_all(&frame).await.map_err(SendError::Io)?;
    tx.flush().await.map_err(SendError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_io_async::ErrorType;
    use std::vec::Vec;

    #[derive(Default)]
    struct Wire {
        bytes: Vec<u8>,
        flushes: usize,
    }

    impl ErrorType for Wire {
        type Error = Infallible;
    }

    impl Write for Wire {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_known_command_frames() {
        assert_eq!(
            PmsCommand::Wakeup.encode(),
            Ok([0x42, 0x4D, 0xE4, 0x00, 0x01, 0x01, 0x74])
        );
        assert_eq!(
            PmsCommand::ActiveMode.encode(),
            Ok([0x42, 0x4D, 0xE1, 0x00, 0x01, 0x01, 0x71])
        );
        assert_eq!(
            PmsCommand::Sleep.encode(),
            Ok([0x42, 0x4D, 0xE4, 0x00, 0x00, 0x01, 0x73])
        );
        assert_eq!(
            PmsCommand::PassiveRead.encode(),
            Ok([0x42, 0x4D, 0xE2, 0x00, 0x00, 0x01, 0x71])
        );
    }

    #[test]
    fn test_send_writes_and_flushes() {
        let mut wire = Wire::default();
        block_on(send_command(&mut wire, PmsCommand::Wakeup)).unwrap();
        block_on(send_command(&mut wire, PmsCommand::ActiveMode)).unwrap();

        assert_eq!(wire.bytes.len(), 2 * COMMAND_LEN);
        assert_eq!(&wire.bytes[7..], &[0x42, 0x4D, 0xE1, 0x00, 0x01, 0x01, 0x71]);
        assert_eq!(wire.flushes, 2);
    }
}
