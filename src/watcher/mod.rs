//! Registered interests and their lifecycle.
//!
//! ```text
//! Active ──match (Repeat)──> Active
//!   │
//!   ├──match (OneShot)──> Delivered ─┐
//!   ├──cancel()─────────> Cancelled ─┼─> detached from every group,
//!   └──lease runs out───> Expired ───┘   removal callback fired once
//! ```
//!
//! Expiration and cancellation are equivalent from the engine's point of
//! view: both remove the watcher from every template group it was linked to.

mod interest;
mod lifecycle;
#[allow(clippy::module_inception)]
mod watcher;


pub use interest::*;
pub use lifecycle::*;
pub(crate) use watcher::LinkOutcome;
pub use watcher::Watcher;
pub use watcher::WatcherBuilder;
