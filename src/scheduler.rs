//! Periodic detection scheduler.
//!
//! A timer thread ticks every `interval`. Each tick tries to claim the run's
//! busy flag; on success the cycle is handed to a single worker thread,
//! otherwise the tick is dropped (never queued). At most one cycle is in
//! flight per run.
//!
//! `stop` cancels the timer synchronously and clears the busy flag, but does
//! not abort a cycle that is already executing. That cycle observes
//! `CycleContext::is_running() == false` and must not commit its result.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Per-run flags. Every `start` creates a fresh one, so a cycle left over
/// from a stopped run can never touch the state of a later run.
#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    busy: AtomicBool,
}

/// Handle given to each cycle.
#[derive(Clone, Debug)]
pub struct CycleContext {
    state: Arc<RunState>,
}

impl CycleContext {
    /// False once the scheduler has been stopped; check before committing.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    dispatched: AtomicU64,
    skipped_busy: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of scheduler activity since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub skipped_busy: u64,
    pub failures: u64,
}

struct ActiveRun {
    state: Arc<RunState>,
    shutdown: SyncSender<()>,
    timer: Option<JoinHandle<()>>,
}

/// IDLE / RUNNING detection scheduler.
pub struct DetectionScheduler {
    run: Option<ActiveRun>,
    counters: Arc<Counters>,
}

impl DetectionScheduler {
    pub fn new() -> Self {
        Self {
            run: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Start ticking every `interval`.
    ///
    /// Returns `Ok(false)` without side effects when already running.
    /// `detect_fn` runs on the worker thread; its errors (and panics) are
    /// passed to `report_fn` and the scheduler keeps going.
    pub fn start<F, R>(&mut self, interval: Duration, detect_fn: F, report_fn: R) -> Result<bool>
    where
        F: FnMut(&CycleContext) -> Result<()> + Send + 'static,
        R: FnMut(anyhow::Error) + Send + 'static,
    {
        if self.is_running() {
            return Ok(false);
        }
        if interval.is_zero() {
            return Err(anyhow!("scheduler interval must be greater than zero"));
        }

        let state = Arc::new(RunState::default());
        state.running.store(true, Ordering::SeqCst);

        let (job_tx, job_rx) = mpsc::sync_channel::<()>(1);
        let (shutdown_tx, shutdown_rx) = mpsc::sync_channel::<()>(1);

        let worker_state = Arc::clone(&state);
        let worker_counters = Arc::clone(&self.counters);
        thread::Builder::new()
            .name("lexicam-detect".into())
            .spawn(move || {
                worker_loop(job_rx, worker_state, worker_counters, detect_fn, report_fn)
            })?;

        let timer_state = Arc::clone(&state);
        let timer_counters = Arc::clone(&self.counters);
        let timer = thread::Builder::new()
            .name("lexicam-timer".into())
            .spawn(move || timer_loop(interval, shutdown_rx, job_tx, timer_state, timer_counters));
        let timer = match timer {
            Ok(handle) => handle,
            Err(e) => {
                // Dropping the job sender ends the worker.
                state.running.store(false, Ordering::SeqCst);
                return Err(anyhow!("failed to spawn scheduler timer: {}", e));
            }
        };

        log::info!("detection scheduler started (interval {:?})", interval);
        self.run = Some(ActiveRun {
            state,
            shutdown: shutdown_tx,
            timer: Some(timer),
        });
        Ok(true)
    }

    /// Cancel the timer and clear the busy flag. Idempotent.
    pub fn stop(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        run.state.running.store(false, Ordering::SeqCst);
        run.state.busy.store(false, Ordering::SeqCst);
        let _ = run.shutdown.try_send(());
        if let Some(timer) = run.timer.take() {
            if timer.join().is_err() {
                log::warn!("scheduler timer thread panicked");
            }
        }
        log::info!("detection scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .map(|run| run.state.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// True while a cycle of the current run is executing.
    pub fn is_busy(&self) -> bool {
        self.run
            .as_ref()
            .map(|run| run.state.busy.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            skipped_busy: self.counters.skipped_busy.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for DetectionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DetectionScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn timer_loop(
    interval: Duration,
    shutdown: mpsc::Receiver<()>,
    jobs: SyncSender<()>,
    state: Arc<RunState>,
    counters: Arc<Counters>,
) {
    loop {
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if !state.running.load(Ordering::SeqCst) {
            break;
        }
        counters.ticks.fetch_add(1, Ordering::Relaxed);

        if state
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            counters.skipped_busy.fetch_add(1, Ordering::Relaxed);
            log::trace!("scheduler tick dropped: previous cycle still running");
            continue;
        }

        match jobs.try_send(()) {
            Ok(()) => {
                counters.dispatched.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(())) => {
                state.busy.store(false, Ordering::SeqCst);
                counters.skipped_busy.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(())) => {
                log::warn!("scheduler worker exited; stopping timer");
                break;
            }
        }
    }
}

fn worker_loop<F, R>(
    jobs: mpsc::Receiver<()>,
    state: Arc<RunState>,
    counters: Arc<Counters>,
    mut detect_fn: F,
    mut report_fn: R,
) where
    F: FnMut(&CycleContext) -> Result<()>,
    R: FnMut(anyhow::Error),
{
    let ctx = CycleContext {
        state: Arc::clone(&state),
    };
    while jobs.recv().is_ok() {
        if !state.running.load(Ordering::SeqCst) {
            break;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| detect_fn(&ctx)))
            .unwrap_or_else(|_| Err(anyhow!("detection cycle panicked")));
        if let Err(err) = outcome {
            counters.failures.fetch_add(1, Ordering::Relaxed);
            report_fn(err);
        }
        state.busy.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    #[test]
    fn stop_is_idempotent_and_start_rejects_zero_interval() {
        let mut scheduler = DetectionScheduler::new();
        scheduler.stop();
        assert!(scheduler
            .start(Duration::ZERO, |_| Ok(()), |_| {})
            .is_err());
        assert!(!scheduler.is_running());
        scheduler.stop();
    }

    #[test]
    fn runs_cycles_until_stopped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DetectionScheduler::new();
        let c = Arc::clone(&calls);
        assert!(scheduler
            .start(
                Duration::from_millis(5),
                move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_| {},
            )
            .unwrap());
        assert!(scheduler.is_running());
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) >= 3));

        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.is_busy());
        // Let a cycle that was already executing finish.
        thread::sleep(Duration::from_millis(20));
        let after_stop = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn panicking_cycle_is_reported_and_scheduler_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reports = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DetectionScheduler::new();
        let c = Arc::clone(&calls);
        let r = Arc::clone(&reports);
        scheduler
            .start(
                Duration::from_millis(5),
                move |_| {
                    if c.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("first cycle blows up");
                    }
                    Ok(())
                },
                move |_| {
                    r.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();
        assert!(wait_until(Duration::from_secs(2), || calls.load(Ordering::SeqCst) >= 3));
        scheduler.stop();
        assert_eq!(reports.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.stats().failures, 1);
    }
}
