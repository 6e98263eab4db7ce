//! Background telemetry reader.
//!
//! Spawns a thread that owns the `LineSource`, parses each line and forwards
//! samples to the controller worker. Unrecognised lines are dropped. A read
//! error means the link is gone: the pump enqueues `Disconnected` and exits.
use rpm_traits::{Clock, LineSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::telemetry::TelemetryParser;
use crate::worker::WorkerHandle;

/// Counters reported when the pump thread exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub lines: u64,
    pub samples: u64,
    pub ignored: u64,
    /// True when the pump stopped because the link failed.
    pub link_lost: bool,
}

pub struct TelemetryPump {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<PumpStats>>,
}

impl TelemetryPump {
    pub fn spawn<L, C>(
        mut source: L,
        parser: TelemetryParser,
        timeout: Duration,
        clock: C,
        events: WorkerHandle,
    ) -> Self
    where
        L: LineSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut stats = PumpStats::default();
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("telemetry pump received shutdown signal");
                    break;
                }
                match source.read_line(timeout) {
                    Ok(Some(line)) => {
                        stats.lines = stats.lines.saturating_add(1);
                        let Some(sample) = parser.parse(&line, clock.now()) else {
                            stats.ignored = stats.ignored.saturating_add(1);
                            continue;
                        };
                        stats.samples = stats.samples.saturating_add(1);
                        // If send fails, the worker is gone; exit gracefully
                        if events.telemetry(sample).is_err() {
                            tracing::debug!("controller worker gone; pump exiting");
                            break;
                        }
                    }
                    Ok(None) => {
                        // Read timed out; loop to re-check shutdown
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "telemetry link lost");
                        stats.link_lost = true;
                        let _ = events.disconnect();
                        break;
                    }
                }
            }
            tracing::trace!(?stats, "telemetry pump exiting cleanly");
            stats
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// True once the thread has exited (link lost, worker gone, or stopped).
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }

    /// Signal shutdown and wait for the thread.
    ///
    /// The thread exits after the current `read_line` returns, so this can
    /// take up to the configured read timeout.
    pub fn stop(mut self) -> Option<PumpStats> {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join_handle.take().and_then(|h| h.join().ok())
    }

    /// Signal shutdown without waiting for the thread.
    ///
    /// For sources whose reads block without a timeout; the thread exits
    /// once its pending read returns.
    pub fn detach(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        drop(self.join_handle.take());
    }
}

impl Drop for TelemetryPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "telemetry pump panicked during shutdown");
        }
    }
}
