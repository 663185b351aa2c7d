//! # Domain Layer

pub mod builder;
pub mod entities;
pub mod errors;
pub mod validation;

pub use builder::*;
pub use entities::*;
pub use errors::*;
pub use validation::*;
