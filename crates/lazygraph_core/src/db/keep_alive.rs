//! Background keep-alive probe for the shared store.
//!
//! # Responsibility
//! - Periodically run a no-op liveness query on a dedicated thread.
//! - Keep probe failures away from request handling.
//!
//! # Invariants
//! - A failed probe is logged and the loop continues on the next interval.
//! - The probe never holds the connection lock while sleeping.
//! - Stopping (explicitly or on drop) joins the thread promptly.

use super::{DbResult, SharedDb};
use log::{debug, error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const KEEP_ALIVE_THREAD_NAME: &str = "lazygraph-keep-alive";

/// Liveness check executed by the keep-alive loop.
pub trait LivenessProbe: Send + 'static {
    fn probe(&self) -> DbResult<()>;
}

impl LivenessProbe for SharedDb {
    fn probe(&self) -> DbResult<()> {
        self.ping()
    }
}

#[derive(Debug, Default)]
struct ProbeStats {
    attempts: AtomicU64,
    failures: AtomicU64,
}

/// Owner of a running keep-alive thread.
pub struct KeepAliveHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
    stats: Arc<ProbeStats>,
}

impl KeepAliveHandle {
    /// Number of probes run so far.
    pub fn attempts(&self) -> u64 {
        self.stats.attempts.load(Ordering::SeqCst)
    }

    /// Number of probes that returned an error.
    pub fn failures(&self) -> u64 {
        self.stats.failures.load(Ordering::SeqCst)
    }

    /// Stops the loop and waits for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender wakes the loop with `Disconnected`.
        self.stop_tx.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("event=keep_alive_stop module=keep_alive status=error reason=thread_panicked");
            }
        }
    }
}

impl Drop for KeepAliveHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns the keep-alive loop running `probe` every `interval`.
///
/// # Errors
/// - Returns the OS error when the thread cannot be spawned.
pub fn spawn_keep_alive<P: LivenessProbe>(
    probe: P,
    interval: Duration,
) -> std::io::Result<KeepAliveHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let stats = Arc::new(ProbeStats::default());
    let loop_stats = Arc::clone(&stats);

    let join = thread::Builder::new()
        .name(KEEP_ALIVE_THREAD_NAME.to_string())
        .spawn(move || {
            info!(
                "event=keep_alive_start module=keep_alive status=ok interval_ms={}",
                interval.as_millis()
            );
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => run_probe(&probe, &loop_stats),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("event=keep_alive_stop module=keep_alive status=ok");
        })?;

    Ok(KeepAliveHandle {
        stop_tx: Some(stop_tx),
        join: Some(join),
        stats,
    })
}

fn run_probe<P: LivenessProbe>(probe: &P, stats: &ProbeStats) {
    let attempt = stats.attempts.fetch_add(1, Ordering::SeqCst) + 1;
    match probe.probe() {
        Ok(()) => debug!("event=keep_alive_probe module=keep_alive status=ok attempt={attempt}"),
        Err(err) => {
            stats.failures.fetch_add(1, Ordering::SeqCst);
            error!(
                "event=keep_alive_probe module=keep_alive status=error attempt={attempt} error={err}"
            );
        }
    }
}
