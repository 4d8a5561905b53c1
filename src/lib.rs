//! keeptime - a terminal stopwatch that survives restarts
//!
//! The engine persists a start timestamp rather than a counter, so elapsed
//! time is reconstructed from the wall clock on every recovery: pausing,
//! stop/continue cycles, and full process restarts all land on the same
//! display.

pub mod config;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{DisplaySnapshot, TimerEngine, TimerState};
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use utils::{Clock, LifecycleEvent, LifecycleEvents, ManualClock, SystemClock};
