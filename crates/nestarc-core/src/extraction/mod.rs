//! Recursive extraction across nested archives.

pub mod entry;
pub(crate) mod probe;
pub mod walker;

pub use entry::Entry;
pub use entry::NestedProbe;
pub use entry::Visit;
pub use walker::Handler;
