//! # Domain Layer
//!
//! Pure framing logic. Nothing here touches a socket.

pub mod errors;
pub mod header;
pub mod payload;

pub use errors::*;
pub use header::*;
pub use payload::*;
