//! # Message Codec (dl-01)
//!
//! Frames and parses the wire protocol into keyed [`Message`] records and
//! serialises response records back to bytes.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────────────┬──────────────────────┬─────────────────────────────┐
//! │ payload_type u16 │ payload_length u32   │ payload (length bytes)      │
//! └──────────────────┴──────────────────────┴─────────────────────────────┘
//! payload = { key u32 | len u32 | value[len] }*
//! ```
//!
//! All integers are big-endian. The value layout of each entry is fixed by
//! the key's declared kind (see [`shared_types::ValueKind`]).
//!
//! ## Failure Handling
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Unknown payload type | frame consumed, logged, dropped |
//! | Unknown key | entry skipped |
//! | Value does not match key kind | frame logged and dropped |
//! | Payload length above the limit | decoder error, connection closes |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): header layout and payload (de)serialisation,
//!   no I/O
//! - **Adapters Layer** (`adapters/`): `tokio-util` codec for framed streams

pub mod adapters;
pub mod domain;

pub use adapters::MessageCodec;
pub use domain::{
    decode_payload, encode_frame, encode_payload, CodecError, FrameHeader, HEADER_LEN,
    MAX_PAYLOAD_LEN, PAYLOAD_TYPE_BINARY,
};
pub use shared_types::Message;
