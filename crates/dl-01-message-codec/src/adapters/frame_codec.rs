//! # Frame Codec
//!
//! `tokio_util::codec` implementation used on both sides of a connection.
//! A single read may carry any number of frames or a partial one; partial
//! bytes stay in the buffer until the rest arrives.

use bytes::{Buf, BytesMut};
use shared_types::Message;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::domain::{
    decode_payload, encode_payload, CodecError, FrameHeader, HEADER_LEN, MAX_PAYLOAD_LEN,
    PAYLOAD_TYPE_BINARY,
};

/// Frames [`Message`]s over a byte stream.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    max_payload_len: usize,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }

    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        Self { max_payload_len }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        loop {
            let Some(header) = FrameHeader::parse(src) else {
                return Ok(None);
            };
            let len = header.payload_length as usize;
            if len > self.max_payload_len {
                return Err(CodecError::FrameTooLarge {
                    len,
                    max: self.max_payload_len,
                });
            }
            if src.len() < header.frame_len() {
                src.reserve(header.frame_len() - src.len());
                return Ok(None);
            }

            src.advance(HEADER_LEN);
            let payload = src.split_to(len);

            if header.payload_type != PAYLOAD_TYPE_BINARY {
                warn!(
                    payload_type = header.payload_type,
                    len, "Dropping frame with unsupported payload type"
                );
                continue;
            }

            match decode_payload(&payload) {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => {
                    warn!(error = %e, len, "Dropping malformed frame");
                    continue;
                }
            }
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let payload = encode_payload(&msg)?;
        if payload.len() > self.max_payload_len {
            return Err(CodecError::FrameTooLarge {
                len: payload.len(),
                max: self.max_payload_len,
            });
        }
        let header = FrameHeader::binary(payload.len() as u32);
        dst.reserve(header.frame_len());
        dst.extend_from_slice(&header.to_bytes());
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
