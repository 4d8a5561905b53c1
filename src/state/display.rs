//! Display projection: elapsed-time formatting and the rendered snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimerState;

/// Format a millisecond total as `H:MM:SS.mmm`.
///
/// Hours carry no leading zero and no upper bound; minutes and seconds are
/// zero-padded to two digits, milliseconds to three.
pub fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Everything a front-end needs to render one frame of the stopwatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    /// `H:MM:SS.mmm` rendering of the elapsed total.
    pub formatted: String,
    /// Raw elapsed milliseconds behind `formatted`.
    pub elapsed_ms: u64,
    pub running: bool,
    /// Whether a reset control should be offered (any time on the clock).
    pub show_reset: bool,
}

impl DisplaySnapshot {
    /// Project the live state at `now_ms`.
    pub fn capture(state: &TimerState, now_ms: u64) -> Self {
        let elapsed_ms = state.elapsed_at(now_ms);
        Self {
            formatted: format_elapsed(elapsed_ms),
            elapsed_ms,
            running: state.is_running(),
            show_reset: elapsed_ms > 0,
        }
    }

    /// Running/paused label for status output.
    pub fn label(&self) -> &'static str {
        if self.running {
            "running"
        } else {
            "paused"
        }
    }
}

impl Default for DisplaySnapshot {
    fn default() -> Self {
        Self::capture(&TimerState::new(), 0)
    }
}

/// Machine-readable status line payload.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub display: String,
    pub elapsed_ms: u64,
    pub show_reset: bool,
    pub timestamp: DateTime<Utc>,
}

impl StatusReport {
    /// Build a report from a snapshot, stamped with the current time.
    pub fn new(snapshot: &DisplaySnapshot) -> Self {
        Self {
            status: snapshot.label(),
            display: snapshot.formatted.clone(),
            elapsed_ms: snapshot.elapsed_ms,
            show_reset: snapshot.show_reset,
            timestamp: Utc::now(),
        }
    }
}
