//! Command frame encoding for the host → sensor direction.
//!
//! Binary sensors in this family accept short command frames with the same
//! start pattern and additive checksum as their data frames:
//! - START (n bytes): synchronization pattern
//! - BODY: command-specific bytes
//! - CHECKSUM (2 bytes): big-endian 16-bit sum of START and BODY

use heapless::Vec;

use crate::checksum::Checksum;

/// Maximum encoded command frame size
pub const MAX_COMMAND_LEN: usize = 16;

/// Errors that can occur during command encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Buffer too small for the encoded frame
    BufferTooSmall,
}

/// Encode a command frame into `buffer`
///
/// Returns the number of bytes written.
pub fn encode_command(start: &[u8], body: &[u8], buffer: &mut [u8]) -> Result<usize, CommandError> {
    let frame_len = start.len() + body.len() + 2;
    if buffer.len() < frame_len {
        return Err(CommandError::BufferTooSmall);
    }

    buffer[..start.len()].copy_from_slice(start);
    buffer[start.len()..start.len() + body.len()].copy_from_slice(body);

    let checksum = Checksum::additive16(&buffer[..frame_len - 2]);
    buffer[frame_len - 2..frame_len].copy_from_slice(&checksum.to_be_bytes());

    Ok(frame_len)
}

/// Encode a command frame into a heapless Vec
pub fn encode_command_to_vec(
    start: &[u8],
    body: &[u8],
) -> Result<Vec<u8, MAX_COMMAND_LEN>, CommandError> {
    let mut buffer = [0u8; MAX_COMMAND_LEN];
    let len = encode_command(start, body, &mut buffer)?;
    Vec::from_slice(&buffer[..len]).map_err(|_| CommandError::BufferTooSmall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wakeup() {
        let mut buffer = [0u8; 10];
        let len = encode_command(&[0x42, 0x4D], &[0xE4, 0x00, 0x01], &mut buffer).unwrap();

        assert_eq!(len, 7);
        assert_eq!(&buffer[..7], &[0x42, 0x4D, 0xE4, 0x00, 0x01, 0x01, 0x74]);
    }

    #[test]
    fn test_encode_to_vec() {
        let frame = encode_command_to_vec(&[0x42, 0x4D], &[0xE1, 0x00, 0x01]).unwrap();
        assert_eq!(frame.as_slice(), &[0x42, 0x4D, 0xE1, 0x00, 0x01, 0x01, 0x71]);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buffer = [0u8; 6];
        assert_eq!(
            encode_command(&[0x42, 0x4D], &[0xE1, 0x00, 0x01], &mut buffer),
            Err(CommandError::BufferTooSmall)
        );
        let body = [0u8; MAX_COMMAND_LEN];
        assert_eq!(
            encode_command_to_vec(&[0x42, 0x4D], &body),
            Err(CommandError::BufferTooSmall)
        );
    }
}
