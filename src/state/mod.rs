//! State management module
//!
//! The pure stopwatch state machine, its display projection, and the
//! engine that runs them against a store and a clock.

pub mod display;
pub mod engine;
pub mod timer;

// Re-export main types
pub use display::{format_elapsed, DisplaySnapshot, StatusReport};
pub use engine::TimerEngine;
pub use timer::{apply, StoreEffect, TimerEvent, TimerState, Transition};
