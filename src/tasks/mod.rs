//! Background tasks module
//!
//! The display ticker that runs alongside the command loop while the
//! stopwatch is running.

pub mod ticker;

// Re-export main types
pub use ticker::TickHandle;
pub(crate) use ticker::spawn_ticker;
