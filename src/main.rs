//! keeptime - a terminal stopwatch that survives restarts
//!
//! This is the main entry point: it wires the timer engine to a persistence
//! store, the terminal, and the process lifecycle signals.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use keeptime::{
    config::Config,
    state::{DisplaySnapshot, StatusReport, TimerEngine},
    store::{JsonFileStore, MemoryStore, StateStore},
    utils::{LifecycleEvent, LifecycleEvents},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so the ticking display line keeps stdout to itself.
    tracing_subscriber::fmt()
        .with_env_filter(format!("keeptime={}", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting keeptime v0.1.0");

    let store: Arc<dyn StateStore> = if config.ephemeral {
        info!("Using in-memory state; nothing will survive exit");
        Arc::new(MemoryStore::new())
    } else {
        info!("Persisting state to {}", config.state_file.display());
        Arc::new(JsonFileStore::new(config.state_file.clone()))
    };

    let engine = Arc::new(TimerEngine::new(store, config.tick_period()));

    // Subscribe to lifecycle signals before recovering state, so a resume
    // delivered during startup is not lost.
    let mut lifecycle = LifecycleEvents::subscribe()?;

    // Cold load: rebuild state from whatever the last run persisted.
    match engine.reconcile().await {
        Ok(snapshot) => info!(
            "Recovered state: {} [{}]",
            snapshot.formatted,
            snapshot.label()
        ),
        Err(e) => warn!("Failed to recover persisted state: {}", e),
    }

    // Render task: repaint the display line whenever a snapshot arrives.
    let mut display_rx = engine.subscribe();
    let render = tokio::spawn(async move {
        render_line(&display_rx.borrow().clone());
        while display_rx.changed().await.is_ok() {
            let snapshot = display_rx.borrow_and_update().clone();
            render_line(&snapshot);
        }
    });

    info!("Commands:");
    info!("  <Enter>  - Toggle start/pause");
    info!("  start    - Start accumulating time");
    info!("  pause    - Freeze the elapsed total");
    info!("  reset    - Return to zero and clear saved state");
    info!("  status   - Print a JSON status line");
    info!("  quit     - Exit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            event = lifecycle.next() => {
                match event {
                    Some(LifecycleEvent::Resumed) => {
                        info!("Foreground resume, reconciling persisted state");
                        if let Err(e) = engine.reconcile().await {
                            warn!("Failed to reconcile after resume: {}", e);
                        }
                    }
                    Some(LifecycleEvent::Shutdown) | None => break,
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&engine, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break, // stdin closed
                    Err(e) => {
                        warn!("Failed to read command: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Release the signal subscription before tearing the engine down.
    drop(lifecycle);
    if let Err(e) = engine.shutdown() {
        warn!("Failed to stop ticker: {}", e);
    }
    render.abort();
    println!();
    info!("Shutdown complete");
    Ok(())
}

/// Apply one command line; returns false when the loop should exit.
async fn handle_command(engine: &TimerEngine, command: &str) -> bool {
    let result = match command {
        "" | "toggle" => engine.toggle().await,
        "start" => engine.start().await,
        "pause" => engine.pause().await,
        "reset" => engine.reset().await,
        "status" => {
            print_status(engine);
            return true;
        }
        "quit" | "exit" | "q" => return false,
        other => {
            println!();
            println!(
                "Unknown command: {} (try start, pause, reset, status, quit)",
                other
            );
            return true;
        }
    };

    match result {
        Ok(snapshot) => debug!("Command '{}' applied: {}", command, snapshot.formatted),
        Err(e) => warn!("Command '{}' failed: {}", command, e),
    }
    true
}

/// Print a one-line JSON status report on its own line.
fn print_status(engine: &TimerEngine) {
    let snapshot = match engine.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to read status: {}", e);
            return;
        }
    };
    match serde_json::to_string(&StatusReport::new(&snapshot)) {
        Ok(json) => {
            println!();
            println!("{}", json);
        }
        Err(e) => warn!("Failed to serialize status: {}", e),
    }
}

/// Repaint the single display line in place.
fn render_line(snapshot: &DisplaySnapshot) {
    let mut stdout = std::io::stdout();
    write!(stdout, "\r{} [{}]  ", snapshot.formatted, snapshot.label()).ok();
    stdout.flush().ok();
}
