pub mod ordinal;
pub mod time;
