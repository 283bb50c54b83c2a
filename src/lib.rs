//! Notification core of a tuple space.
//!
//! Clients register [`Watcher`]s against entry templates; the write path
//! reports every observable [`EntryTransition`] and asks the
//! [`TransitionDispatcher`] which watchers to notify.
//!
//! ```rust,ignore
//! let dispatcher = Arc::new(TransitionDispatcher::new(settings.dispatch.clone()));
//! let reaper = spawn_reaper(Arc::clone(&dispatcher), &settings.reaper, shutdown_rx)?;
//!
//! let watcher = Watcher::builder(ordinals.next()).lease(Duration::from_secs(30)).build();
//! dispatcher.register(&watcher, Arc::new(template))?;
//!
//! for watcher in dispatcher.matches_for(&transition, transition.ordinal())? {
//!     notify(watcher.ordinal(), &transition);
//! }
//! ```

mod config;
mod dispatch;
mod errors;
mod interest;
pub mod metrics;
pub mod registry;
mod transition;
pub mod utils;
mod watcher;

pub use config::*;
pub use dispatch::*;
pub use errors::*;
pub use interest::*;
pub use transition::*;
pub use utils::*;
pub use watcher::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
