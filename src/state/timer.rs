//! Pure stopwatch state machine.
//!
//! Transitions are expressed as a reducer: [`apply`] takes the current state
//! and one event and returns the next state plus the persistence effects the
//! caller should issue. Wall-clock time arrives inside the event, so nothing
//! here reads a clock or touches I/O.

use crate::store::{PersistedRecord, StoreKey};

/// Live stopwatch state.
///
/// `accumulated_ms` only covers completed running intervals; the open
/// interval is represented by `started_at_ms` and folded in on demand by
/// [`TimerState::elapsed_at`]. Pausing moves the open interval into the
/// accumulator, which is why a paused display never moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    running: bool,
    started_at_ms: Option<u64>,
    accumulated_ms: u64,
}

impl TimerState {
    /// Create the initial state: idle, nothing accumulated.
    pub fn new() -> Self {
        Self {
            running: false,
            started_at_ms: None,
            accumulated_ms: 0,
        }
    }

    /// Check if the stopwatch is actively accumulating time.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Epoch-ms start of the open running interval, if any.
    pub fn started_at_ms(&self) -> Option<u64> {
        if self.running {
            self.started_at_ms
        } else {
            None
        }
    }

    /// Total elapsed milliseconds as of `now_ms`.
    ///
    /// While running this is the accumulator plus the open interval; a start
    /// instant in the future (host clock stepped backwards) contributes
    /// nothing rather than underflowing.
    pub fn elapsed_at(&self, now_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(start) if self.running => self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(start)),
            _ => self.accumulated_ms,
        }
    }

    /// True once the stopwatch has never run and holds no time.
    fn is_pristine(&self) -> bool {
        !self.running && self.accumulated_ms == 0
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// State machine inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Begin (or resume) accumulating from `now_ms`.
    Start { now_ms: u64 },
    /// Freeze the elapsed total as of `now_ms`.
    Pause { now_ms: u64 },
    /// Return to the initial state and drop the persisted record.
    Reset,
    /// Rebuild live state from a loaded record, on cold start or on a
    /// foreground-resume event.
    Reconcile { now_ms: u64, record: PersistedRecord },
}

/// Persistence side effect requested by a transition. The caller applies
/// these best-effort after swapping in the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEffect {
    Put(StoreKey, String),
    Delete(StoreKey),
}

/// Outcome of applying one event: the next state and the store writes that
/// keep the persisted record consistent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: TimerState,
    pub effects: Vec<StoreEffect>,
}

impl Transition {
    fn unchanged(state: &TimerState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

/// Apply one event to the current state.
pub fn apply(state: &TimerState, event: TimerEvent) -> Transition {
    match event {
        TimerEvent::Start { now_ms } => start(state, now_ms),
        TimerEvent::Pause { now_ms } => pause(state, now_ms),
        TimerEvent::Reset => reset(),
        TimerEvent::Reconcile { now_ms, record } => reconcile(state, now_ms, record),
    }
}

fn start(state: &TimerState, now_ms: u64) -> Transition {
    if state.running {
        return Transition::unchanged(state);
    }
    Transition {
        state: TimerState {
            running: true,
            started_at_ms: Some(now_ms),
            accumulated_ms: state.accumulated_ms,
        },
        effects: vec![
            StoreEffect::Put(StoreKey::StartTime, now_ms.to_string()),
            StoreEffect::Put(StoreKey::IsRunning, "true".to_string()),
        ],
    }
}

fn pause(state: &TimerState, now_ms: u64) -> Transition {
    if !state.running {
        return Transition::unchanged(state);
    }
    let frozen = state.elapsed_at(now_ms);
    Transition {
        state: TimerState {
            running: false,
            started_at_ms: None,
            accumulated_ms: frozen,
        },
        effects: vec![
            StoreEffect::Put(StoreKey::ElapsedTime, frozen.to_string()),
            StoreEffect::Put(StoreKey::IsRunning, "false".to_string()),
            StoreEffect::Delete(StoreKey::StartTime),
        ],
    }
}

fn reset() -> Transition {
    Transition {
        state: TimerState::new(),
        effects: vec![
            StoreEffect::Delete(StoreKey::StartTime),
            StoreEffect::Delete(StoreKey::ElapsedTime),
            StoreEffect::Delete(StoreKey::IsRunning),
        ],
    }
}

fn reconcile(state: &TimerState, now_ms: u64, record: PersistedRecord) -> Transition {
    match (record.is_running, record.start_time_ms) {
        (true, Some(start)) => {
            // The stored elapsed covers runs before the stored start instant,
            // never the open one, so folding the wall-clock gap on top is
            // exact. Moving the start instant to `now_ms` and re-persisting
            // makes a repeated reconcile compute the same total.
            let folded = record
                .elapsed_ms
                .unwrap_or(0)
                .saturating_add(now_ms.saturating_sub(start));
            Transition {
                state: TimerState {
                    running: true,
                    started_at_ms: Some(now_ms),
                    accumulated_ms: folded,
                },
                effects: vec![
                    StoreEffect::Put(StoreKey::StartTime, now_ms.to_string()),
                    StoreEffect::Put(StoreKey::ElapsedTime, folded.to_string()),
                    StoreEffect::Put(StoreKey::IsRunning, "true".to_string()),
                ],
            }
        }
        _ if state.is_pristine() => {
            // Cold start: adopt whatever a previous session paused at.
            Transition {
                state: TimerState {
                    running: false,
                    started_at_ms: None,
                    accumulated_ms: record.elapsed_ms.unwrap_or(0),
                },
                effects: Vec::new(),
            }
        }
        // A live session outranks an idle record: while running, the truth
        // is the in-memory start instant plus the wall clock, and a paused
        // total is fresher than whatever last reached the store.
        _ => Transition::unchanged(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        start_time_ms: Option<u64>,
        elapsed_ms: Option<u64>,
        is_running: bool,
    ) -> PersistedRecord {
        PersistedRecord {
            start_time_ms,
            elapsed_ms,
            is_running,
        }
    }

    #[test]
    fn start_pause_resume_accumulates() {
        let s0 = TimerState::new();
        assert_eq!(s0.elapsed_at(0), 0);
        assert!(!s0.is_running());

        let s1 = apply(&s0, TimerEvent::Start { now_ms: 1000 }).state;
        assert!(s1.is_running());
        assert_eq!(s1.elapsed_at(1500), 500);
        assert_eq!(s1.elapsed_at(2000), 1000);

        let s2 = apply(&s1, TimerEvent::Pause { now_ms: 2000 }).state;
        assert!(!s2.is_running());
        assert_eq!(s2.elapsed_at(5000), 1000); // Frozen while paused

        let s3 = apply(&s2, TimerEvent::Start { now_ms: 5000 }).state;
        assert_eq!(s3.elapsed_at(5500), 1500);

        let s4 = apply(&s3, TimerEvent::Reset).state;
        assert!(!s4.is_running());
        assert_eq!(s4.elapsed_at(10_000), 0);
    }

    #[test]
    fn pause_twice_leaves_elapsed_unchanged() {
        let running = apply(&TimerState::new(), TimerEvent::Start { now_ms: 0 }).state;
        let paused = apply(&running, TimerEvent::Pause { now_ms: 800 }).state;
        let again = apply(&paused, TimerEvent::Pause { now_ms: 2000 });

        assert_eq!(again.state, paused);
        assert!(again.effects.is_empty());
        assert_eq!(again.state.elapsed_at(9999), 800);
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let running = apply(&TimerState::new(), TimerEvent::Start { now_ms: 100 }).state;
        let again = apply(&running, TimerEvent::Start { now_ms: 700 });

        assert_eq!(again.state, running);
        assert!(again.effects.is_empty());
        // The original start instant still governs the total.
        assert_eq!(again.state.elapsed_at(1100), 1000);
    }

    #[test]
    fn start_persists_start_instant_and_running_flag() {
        let t = apply(&TimerState::new(), TimerEvent::Start { now_ms: 1234 });
        assert_eq!(
            t.effects,
            vec![
                StoreEffect::Put(StoreKey::StartTime, "1234".to_string()),
                StoreEffect::Put(StoreKey::IsRunning, "true".to_string()),
            ]
        );
    }

    #[test]
    fn pause_persists_frozen_elapsed_and_drops_start_instant() {
        let running = apply(&TimerState::new(), TimerEvent::Start { now_ms: 1000 }).state;
        let t = apply(&running, TimerEvent::Pause { now_ms: 3500 });
        assert_eq!(
            t.effects,
            vec![
                StoreEffect::Put(StoreKey::ElapsedTime, "2500".to_string()),
                StoreEffect::Put(StoreKey::IsRunning, "false".to_string()),
                StoreEffect::Delete(StoreKey::StartTime),
            ]
        );
    }

    #[test]
    fn reset_removes_every_persisted_key() {
        let running = apply(&TimerState::new(), TimerEvent::Start { now_ms: 1000 }).state;
        let t = apply(&running, TimerEvent::Reset);
        assert_eq!(
            t.effects,
            vec![
                StoreEffect::Delete(StoreKey::StartTime),
                StoreEffect::Delete(StoreKey::ElapsedTime),
                StoreEffect::Delete(StoreKey::IsRunning),
            ]
        );
        assert_eq!(t.state, TimerState::new());
    }

    #[test]
    fn reconcile_running_record_equals_wall_clock_gap() {
        let t = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 9000,
                record: record(Some(4000), None, true),
            },
        );
        assert!(t.state.is_running());
        assert_eq!(t.state.elapsed_at(9000), 5000);
        assert_eq!(t.state.started_at_ms(), Some(9000));
        assert_eq!(
            t.effects,
            vec![
                StoreEffect::Put(StoreKey::StartTime, "9000".to_string()),
                StoreEffect::Put(StoreKey::ElapsedTime, "5000".to_string()),
                StoreEffect::Put(StoreKey::IsRunning, "true".to_string()),
            ]
        );
    }

    #[test]
    fn repeated_reconciles_compute_the_same_total() {
        // First reconcile at t=9000 against a run started at t=4000.
        let first = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 9000,
                record: record(Some(4000), None, true),
            },
        );
        // A second delivery sees the record the first one wrote out.
        let second = apply(
            &first.state,
            TimerEvent::Reconcile {
                now_ms: 11_000,
                record: record(Some(9000), Some(5000), true),
            },
        );
        assert_eq!(second.state.elapsed_at(11_000), 7000); // 11_000 - 4000
    }

    #[test]
    fn reconcile_folds_only_the_open_interval() {
        // Session history: ran 0..500 (paused, 500 persisted), restarted at
        // 1000, then the process died. The accumulate-and-persist-per-tick
        // legacy variant would have stored a tick-inflated elapsed and then
        // added the gap again on resume, double-counting the open run.
        let t = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 3000,
                record: record(Some(1000), Some(500), true),
            },
        );
        assert_eq!(t.state.elapsed_at(3000), 2500); // 500 + (3000 - 1000)
    }

    #[test]
    fn reconcile_idle_record_restores_paused_total_on_cold_start() {
        let t = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 50_000,
                record: record(None, Some(700), false),
            },
        );
        assert!(!t.state.is_running());
        assert_eq!(t.state.elapsed_at(60_000), 700);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn reconcile_empty_record_keeps_live_session() {
        let running = apply(&TimerState::new(), TimerEvent::Start { now_ms: 1000 }).state;
        let t = apply(
            &running,
            TimerEvent::Reconcile {
                now_ms: 4000,
                record: record(None, None, false),
            },
        );
        assert_eq!(t.state, running);
        assert!(t.effects.is_empty());

        let paused = apply(&running, TimerEvent::Pause { now_ms: 1500 }).state;
        let t = apply(
            &paused,
            TimerEvent::Reconcile {
                now_ms: 9000,
                record: record(None, None, false),
            },
        );
        assert_eq!(t.state, paused);
        assert_eq!(t.state.elapsed_at(9000), 500);
    }

    #[test]
    fn future_start_instant_contributes_nothing() {
        let t = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 9000,
                record: record(Some(10_000), Some(300), true),
            },
        );
        assert!(t.state.is_running());
        assert_eq!(t.state.elapsed_at(9000), 300);
    }

    #[test]
    fn running_record_without_start_instant_falls_back_to_idle() {
        // A crash between the two start writes can leave isRunning=true with
        // no startTime; recovery treats that as a paused record.
        let t = apply(
            &TimerState::new(),
            TimerEvent::Reconcile {
                now_ms: 5000,
                record: record(None, Some(250), true),
            },
        );
        assert!(!t.state.is_running());
        assert_eq!(t.state.elapsed_at(5000), 250);
    }
}
