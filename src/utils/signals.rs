//! Lifecycle signal handling.
//!
//! Maps OS signals onto the two lifecycle events the stopwatch reacts to:
//! coming back to the foreground (SIGCONT, delivered after `fg` or
//! `kill -CONT`) and being asked to exit (SIGINT/SIGTERM).

use futures::stream::StreamExt;
use signal_hook::consts::{SIGCONT, SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::{debug, info};

/// Process lifecycle changes delivered to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The process came back to the foreground; persisted state may be
    /// stale relative to the wall clock and needs reconciling.
    Resumed,
    /// The process was asked to shut down.
    Shutdown,
}

/// Scoped subscription to lifecycle signals.
///
/// Dropping this closes the underlying signal handle, so no callback can
/// outlive the engine it feeds.
pub struct LifecycleEvents {
    signals: Signals,
}

impl LifecycleEvents {
    /// Register for lifecycle signals. Call once at startup.
    pub fn subscribe() -> anyhow::Result<Self> {
        let signals = Signals::new(&[SIGCONT, SIGINT, SIGTERM])?;
        Ok(Self { signals })
    }

    /// Wait for the next lifecycle event; `None` once the stream closes.
    pub async fn next(&mut self) -> Option<LifecycleEvent> {
        while let Some(signal) = self.signals.next().await {
            match signal {
                SIGCONT => {
                    debug!("SIGCONT received, treating as foreground resume");
                    return Some(LifecycleEvent::Resumed);
                }
                SIGINT | SIGTERM => {
                    info!("Received signal: {}", signal);
                    return Some(LifecycleEvent::Shutdown);
                }
                _ => {}
            }
        }
        None
    }
}

impl Drop for LifecycleEvents {
    fn drop(&mut self) {
        self.signals.handle().close();
    }
}
