//! Storage backbone for handles that must be traversed while they mutate.
//!
//! A [`ConcurrentRegistry`] holds [`Handle`]s in insertion order. Removal is
//! logical (an atomic flag on the handle) and physical unlinking is deferred
//! to an explicit [`ConcurrentRegistry::reap`] pass, so iterators running
//! concurrently with removals never observe a torn collection.

mod concurrent_registry;
mod handle;


pub use concurrent_registry::ConcurrentRegistry;
pub use concurrent_registry::RegistryIter;
pub use handle::Handle;
