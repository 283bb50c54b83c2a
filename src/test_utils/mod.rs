//! Payloads and transition builders shared by the unit tests.
mod entry_builder;
mod payload;

pub use entry_builder::*;
pub use payload::*;
