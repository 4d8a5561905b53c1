//! Engine runtime around the pure state machine.
//!
//! Owns the live state, runs reducer transitions, issues the resulting
//! store effects best-effort, publishes display snapshots on a watch
//! channel, and manages the single ticker task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{apply, DisplaySnapshot, StoreEffect, TimerEvent, TimerState};
use crate::store::{PersistedRecord, StateStore};
use crate::tasks::{spawn_ticker, TickHandle};
use crate::utils::{Clock, SystemClock};

/// State shared between the engine and its ticker task.
pub(crate) struct EngineInner<C: Clock> {
    state: Mutex<TimerState>,
    clock: C,
    display_tx: watch::Sender<DisplaySnapshot>,
}

impl<C: Clock> EngineInner<C> {
    /// Re-derive the display from live state and publish it.
    pub(crate) fn publish_display(&self) -> Result<DisplaySnapshot, String> {
        let now_ms = self.clock.now_ms();
        let snapshot = {
            let state = self
                .state
                .lock()
                .map_err(|e| format!("Failed to lock timer state: {}", e))?;
            DisplaySnapshot::capture(&state, now_ms)
        };
        if let Err(e) = self.display_tx.send(snapshot.clone()) {
            warn!("Failed to publish display update: {}", e);
        }
        Ok(snapshot)
    }
}

/// The stopwatch engine.
///
/// All transitions funnel through the pure reducer; this wrapper supplies
/// the clock, applies the store effects, and keeps at most one ticker
/// alive at any time.
pub struct TimerEngine<C: Clock = SystemClock> {
    inner: Arc<EngineInner<C>>,
    store: Arc<dyn StateStore>,
    tick_period: Duration,
    ticker: Mutex<Option<TickHandle>>,
    /// Keep the receiver alive to prevent channel closure.
    _display_rx: watch::Receiver<DisplaySnapshot>,
}

impl TimerEngine<SystemClock> {
    /// Create an engine driven by the host wall clock.
    pub fn new(store: Arc<dyn StateStore>, tick_period: Duration) -> Self {
        Self::with_clock(store, SystemClock, tick_period)
    }
}

impl<C: Clock> TimerEngine<C> {
    /// Create an engine with an explicit clock.
    pub fn with_clock(store: Arc<dyn StateStore>, clock: C, tick_period: Duration) -> Self {
        let (display_tx, display_rx) = watch::channel(DisplaySnapshot::default());
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(TimerState::new()),
                clock,
                display_tx,
            }),
            store,
            tick_period,
            ticker: Mutex::new(None),
            _display_rx: display_rx,
        }
    }

    /// Subscribe to display snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.inner.display_tx.subscribe()
    }

    /// Current display without publishing.
    pub fn snapshot(&self) -> Result<DisplaySnapshot, String> {
        let now_ms = self.inner.clock.now_ms();
        let state = self
            .inner
            .state
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;
        Ok(DisplaySnapshot::capture(&state, now_ms))
    }

    /// Begin (or resume) accumulating time.
    pub async fn start(&self) -> Result<DisplaySnapshot, String> {
        let now_ms = self.inner.clock.now_ms();
        info!("Starting stopwatch at {}", now_ms);
        self.transition(TimerEvent::Start { now_ms }).await
    }

    /// Freeze the elapsed total.
    pub async fn pause(&self) -> Result<DisplaySnapshot, String> {
        let now_ms = self.inner.clock.now_ms();
        info!("Pausing stopwatch at {}", now_ms);
        self.transition(TimerEvent::Pause { now_ms }).await
    }

    /// The single start/pause control: start when idle, pause when running.
    pub async fn toggle(&self) -> Result<DisplaySnapshot, String> {
        let running = self
            .inner
            .state
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?
            .is_running();
        if running {
            self.pause().await
        } else {
            self.start().await
        }
    }

    /// Return to zero and drop the persisted record.
    pub async fn reset(&self) -> Result<DisplaySnapshot, String> {
        info!("Resetting stopwatch");
        self.transition(TimerEvent::Reset).await
    }

    /// Rebuild live state from the persisted record.
    ///
    /// Called on cold start and on every foreground resume. Safe to call
    /// repeatedly: the reducer re-persists the start instant it folds from,
    /// so back-to-back reconciles land on the same wall-clock total.
    pub async fn reconcile(&self) -> Result<DisplaySnapshot, String> {
        let record = PersistedRecord::load(self.store.as_ref()).await;
        let now_ms = self.inner.clock.now_ms();
        debug!("Reconciling at {} against {:?}", now_ms, record);
        self.transition(TimerEvent::Reconcile { now_ms, record }).await
    }

    /// Stop the ticker. The engine can keep serving snapshots afterwards,
    /// but nothing refreshes the display.
    pub fn shutdown(&self) -> Result<(), String> {
        let mut slot = self
            .ticker
            .lock()
            .map_err(|e| format!("Failed to lock ticker slot: {}", e))?;
        if let Some(handle) = slot.take() {
            debug!("Stopping ticker on shutdown");
            handle.cancel();
        }
        Ok(())
    }

    async fn transition(&self, event: TimerEvent) -> Result<DisplaySnapshot, String> {
        let transition = {
            let mut state = self
                .inner
                .state
                .lock()
                .map_err(|e| format!("Failed to lock timer state: {}", e))?;
            let transition = apply(&state, event);
            *state = transition.state.clone();
            transition
        };

        self.retune_ticker(transition.state.is_running())?;
        self.apply_effects(&transition.effects).await;
        self.inner.publish_display()
    }

    /// Cancel any live ticker, then spawn a fresh one iff the stopwatch is
    /// running. Doing both under the slot lock means two tick loops can
    /// never overlap, however quickly transitions arrive.
    fn retune_ticker(&self, running: bool) -> Result<(), String> {
        let mut slot = self
            .ticker
            .lock()
            .map_err(|e| format!("Failed to lock ticker slot: {}", e))?;
        if let Some(handle) = slot.take() {
            handle.cancel();
        }
        if running {
            *slot = Some(spawn_ticker(Arc::clone(&self.inner), self.tick_period));
        }
        Ok(())
    }

    async fn apply_effects(&self, effects: &[StoreEffect]) {
        for effect in effects {
            let result = match effect {
                StoreEffect::Put(key, value) => self.store.set(*key, value.clone()).await,
                StoreEffect::Delete(key) => self.store.remove(*key).await,
            };
            if let Err(e) = result {
                // Best-effort only: the live session never depends on the
                // store, so a failed write is logged and forgotten.
                warn!("Persistence write failed for {:?}: {}", effect, e);
            }
        }
    }
}
