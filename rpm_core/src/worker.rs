//! Single-owner event loop around `Controller`.
//!
//! One thread owns the controller and the command emitter and drains an
//! ordered `crossbeam-channel` queue, so telemetry and operator events never
//! interleave mid-update. Outcomes are published on a notification channel.
//!
//! Each `Worker` spawns exactly one thread that is shut down and joined when
//! the `Worker` is stopped or dropped. Events already queued at shutdown are
//! still processed.
use crossbeam_channel as xch;
use rpm_traits::{Clock, CommandSink};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::command::{Direction, MotorId};
use crate::controller::{Controller, Event, OperatorRequest, StepOutcome};
use crate::emitter::{CommandEmitter, SendFailure};
use crate::error::ControlError;
use crate::setpoint::Setpoint;
use crate::status::ControllerSnapshot;
use crate::telemetry::Sample;

/// How often the idle loop re-checks the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Published after every processed event.
#[derive(Debug, Clone)]
pub enum Notification {
    Processed {
        event: &'static str,
        outcome: StepOutcome,
        snapshot: ControllerSnapshot,
    },
    /// A command could not be delivered; state was not rolled back.
    SendFailed(SendFailure),
}

/// Final accounting returned when the worker thread exits.
#[derive(Debug)]
pub struct WorkerReport {
    pub controller: Controller,
    pub events: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Cloneable producer side of the worker queue.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: xch::Sender<Event>,
}

impl WorkerHandle {
    pub fn submit(&self, event: Event) -> Result<(), ControlError> {
        self.tx.send(event).map_err(|_| ControlError::WorkerStopped)
    }

    pub fn connect(&self) -> Result<(), ControlError> {
        self.submit(Event::Connected)
    }

    pub fn disconnect(&self) -> Result<(), ControlError> {
        self.submit(Event::Disconnected)
    }

    pub fn telemetry(&self, sample: Sample) -> Result<(), ControlError> {
        self.submit(Event::Telemetry(sample))
    }

    pub fn set_speed(&self, setpoint: Setpoint) -> Result<(), ControlError> {
        self.submit(Event::Operator(OperatorRequest::Setpoint(setpoint)))
    }

    pub fn direction(&self, motor: MotorId, direction: Direction) -> Result<(), ControlError> {
        self.submit(Event::Operator(OperatorRequest::Direction { motor, direction }))
    }
}

pub struct Worker {
    handle: WorkerHandle,
    notes: xch::Receiver<Notification>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<WorkerReport>>,
}

impl Worker {
    pub fn spawn<T, C>(controller: Controller, sink: T, clock: C) -> Self
    where
        T: CommandSink + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (tx, rx) = xch::unbounded::<Event>();
        let (notes_tx, notes) = xch::unbounded::<Notification>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut controller = controller;
            let mut emitter = CommandEmitter::new(sink);
            let mut events: u64 = 0;

            let mut process = |event: Event,
                               controller: &mut Controller,
                               emitter: &mut CommandEmitter<T>| {
                let now = clock.now();
                let name = event.name();
                let outcome = controller.handle(event, now);
                for failure in emitter.emit_all(&outcome.commands) {
                    let _ = notes_tx.send(Notification::SendFailed(failure));
                }
                let snapshot = controller.snapshot(now);
                let _ = notes_tx.send(Notification::Processed {
                    event: name,
                    outcome,
                    snapshot,
                });
                events = events.saturating_add(1);
            };

            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("controller worker received shutdown signal");
                    break;
                }
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(event) => process(event, &mut controller, &mut emitter),
                    Err(xch::RecvTimeoutError::Timeout) => {}
                    Err(xch::RecvTimeoutError::Disconnected) => {
                        tracing::debug!("all event producers gone; worker exiting");
                        break;
                    }
                }
            }

            // Finish whatever was admitted before shutdown.
            for event in rx.try_iter() {
                process(event, &mut controller, &mut emitter);
            }
            drop(process);

            tracing::trace!(events, "controller worker exiting cleanly");
            WorkerReport {
                controller,
                events,
                sent: emitter.sent(),
                failed: emitter.failed(),
            }
        });

        Self {
            handle: WorkerHandle { tx },
            notes,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    pub fn notifications(&self) -> &xch::Receiver<Notification> {
        &self.notes
    }

    /// Stop the thread after draining queued events and hand back the controller.
    pub fn stop(mut self) -> Option<WorkerReport> {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(?e, "controller worker panicked");
                None
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => {
                    tracing::trace!("controller worker joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "controller worker panicked during shutdown");
                }
            }
        }
    }
}
