//! Display ticker background task.
//!
//! While the stopwatch runs, a ticker re-derives the display snapshot every
//! tick period and publishes it. Ticks never mutate timer state; elapsed
//! time is always recomputed from the start instant and the clock, so a
//! missed or duplicated tick can change at most how often the display
//! refreshes, never what it adds up to.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::state::engine::EngineInner;
use crate::utils::Clock;

/// Handle to one live tick loop.
///
/// The engine keeps at most one of these at any time. Cancellation is
/// unconditional: the loop's select favors the stop branch, and the engine
/// swaps in the new (frozen) state before cancelling, so a racing tick can
/// only re-publish an already-correct display.
pub struct TickHandle {
    stop_tx: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

impl TickHandle {
    /// Stop the tick loop.
    pub fn cancel(self) {
        if self.stop_tx.send(true).is_err() {
            debug!("Ticker already stopped");
        }
    }
}

/// Spawn the tick loop for the current running interval.
pub(crate) fn spawn_ticker<C: Clock>(inner: Arc<EngineInner<C>>, period: Duration) -> TickHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        debug!("Ticker started with period {:?}", period);
        let mut ticks = interval(period);
        // Display refresh, not accounting: skip missed ticks instead of
        // bursting to catch up.
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                // Explicit cancel, or the engine dropped the handle.
                _ = stop_rx.changed() => break,
                _ = ticks.tick() => {
                    if let Err(e) = inner.publish_display() {
                        warn!("Tick failed to publish display: {}", e);
                    }
                }
            }
        }
        debug!("Ticker stopped");
    });
    TickHandle {
        stop_tx,
        _task: task,
    }
}
