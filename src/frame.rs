/*!
 * A CAN or CAN FD frame as handed to and produced by the codec
 */

use std::fmt;

use crate::error::{CodecError, Result};
use crate::signal_layout::MAX_PAYLOAD_LEN;

/// Payloads longer than this need CAN FD.
pub const CLASSIC_PAYLOAD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    // CAN ID: 11-bit standard or 29-bit extended ID
    pub id: u32,
    pub is_extended: bool,
    pub is_fd: bool,
    // Payload length in bytes, 0 to 8 for CAN, 0 to 64 for CAN FD
    pub len: u8,
    // Only the first `len` bytes are meaningful
    pub data: [u8; MAX_PAYLOAD_LEN],
}

impl Default for CanFrame {
    fn default() -> Self {
        CanFrame {
            id: 0,
            is_extended: false,
            is_fd: false,
            len: 0,
            data: [0; MAX_PAYLOAD_LEN],
        }
    }
}

impl CanFrame {
    /// Build a frame around `payload`. Payloads over 8 bytes mark the frame
    /// as CAN FD.
    pub fn new(id: u32, is_extended: bool, payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLong(payload.len()));
        }
        let mut frame = CanFrame {
            id,
            is_extended,
            is_fd: payload.len() > CLASSIC_PAYLOAD_LEN,
            len: payload.len() as u8,
            ..CanFrame::default()
        };
        frame.data[..payload.len()].copy_from_slice(payload);
        Ok(frame)
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// candump style, `1F0#A5B6D90000000000` (`##` for FD frames).
impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended {
            write!(f, "{:08X}", self.id)?;
        } else {
            write!(f, "{:03X}", self.id)?;
        }
        f.write_str(if self.is_fd { "##0" } else { "#" })?;
        for byte in self.payload() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
