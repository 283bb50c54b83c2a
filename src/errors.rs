//! Notification Core Error Hierarchy
//!
//! Only contract violations surface as errors. Races between concurrent
//! callers (double removal, group pruned under a registration) are resolved
//! locally and reported through ordinary return values.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid watcher registration requests
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Invalid transitions handed over by the write path
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Template payload reported an empty type name
    #[error("Template type name must not be empty")]
    EmptyTypeName,

    /// Watcher already reached a terminal state (cancelled, expired or delivered)
    #[error("Watcher {ordinal} is no longer active")]
    WatcherInactive { ordinal: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// Entry payload reported an empty type name
    #[error("Entry type name must not be empty")]
    EmptyTypeName,

    /// Ordinal 0 is reserved and never minted by the write path
    #[error("Transition ordinal must be greater than 0")]
    InvalidOrdinal,
}
