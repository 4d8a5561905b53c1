//! Utility modules
//!
//! The clock seam and the lifecycle signal subscription.

pub mod clock;
pub mod signals;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use signals::{LifecycleEvent, LifecycleEvents};
