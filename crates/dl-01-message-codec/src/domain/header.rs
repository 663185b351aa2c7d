//! # Frame Header
//!
//! Six bytes: `payload_type: u16 BE`, `payload_length: u32 BE`.

/// Header length in bytes.
pub const HEADER_LEN: usize = 6;

/// Binary key/value payload, the only payload type this node understands.
pub const PAYLOAD_TYPE_BINARY: u16 = 0x0001;

/// Largest payload accepted from a peer (16 MiB).
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_type: u16,
    pub payload_length: u32,
}

impl FrameHeader {
    pub fn binary(payload_length: u32) -> Self {
        Self {
            payload_type: PAYLOAD_TYPE_BINARY,
            payload_length,
        }
    }

    /// Parse the first [`HEADER_LEN`] bytes of `buf`; `None` if too short.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            payload_type: u16::from_be_bytes([buf[0], buf[1]]),
            payload_length: u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]),
        })
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..2].copy_from_slice(&self.payload_type.to_be_bytes());
        out[2..].copy_from_slice(&self.payload_length.to_be_bytes());
        out
    }

    /// Total frame length including the header.
    pub fn frame_len(self) -> usize {
        HEADER_LEN + self.payload_length as usize
    }
}
