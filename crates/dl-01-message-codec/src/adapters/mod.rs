//! # Adapters
//!
//! Stream framing on top of `tokio-util`.

pub mod frame_codec;

pub use frame_codec::MessageCodec;
