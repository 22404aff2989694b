//! Polling change detector.
//!
//! [`ChangeDetector`] fingerprints a target on a fixed interval and fires a
//! one-shot callback the first time the fingerprint differs from the one taken
//! at start. Fetch failures stop polling; there is no retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::fingerprint::{FetchError, Fingerprinter};

/// Shortest polling interval accepted by [`ChangeDetector::start`].
pub const MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

/// Lifecycle of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    /// Taking the initial fingerprint.
    Starting,
    Running,
    Stopped,
}

/// Result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Unchanged,
    Changed,
    /// Another check was still in flight.
    Skipped,
    Failed,
    NotRunning,
}

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Change detector is already running")]
    AlreadyRunning,
    #[error("Initial fingerprint failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Change detector was stopped while starting")]
    Cancelled,
}

type ChangeCallback = Box<dyn FnOnce() + Send>;

struct Inner {
    state: DetectorState,
    /// Bumped by every start and stop; a start only commits its own run.
    generation: u64,
    last_fingerprint: Option<String>,
    on_changed: Option<ChangeCallback>,
}

struct Shared<F> {
    fingerprinter: F,
    target: String,
    inner: Mutex<Inner>,
    in_flight: AtomicBool,
}

impl<F> Shared<F> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> DetectorState {
        self.lock().state
    }
}

/// Clears the in-flight flag when a check completes or is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Polls a target's fingerprint and signals the first change.
pub struct ChangeDetector<F> {
    shared: Arc<Shared<F>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<F: Fingerprinter> ChangeDetector<F> {
    pub fn new(fingerprinter: F, target: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                fingerprinter,
                target: target.into(),
                inner: Mutex::new(Inner {
                    state: DetectorState::Idle,
                    generation: 0,
                    last_fingerprint: None,
                    on_changed: None,
                }),
                in_flight: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.shared.target
    }

    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.shared.state()
    }

    /// Fingerprint recorded at start.
    #[must_use]
    pub fn last_fingerprint(&self) -> Option<String> {
        self.shared.lock().last_fingerprint.clone()
    }

    /// Take the initial fingerprint and start polling every `interval`.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it. `on_changed` runs at
    /// most once, from the polling task.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::AlreadyRunning`] when the detector is starting
    /// or running, [`DetectorError::Fetch`] when the initial fingerprint fails
    /// (the detector is then `Stopped`), and [`DetectorError::Cancelled`] when
    /// [`stop`](Self::stop) was called before the initial fingerprint arrived.
    pub async fn start(
        &self,
        interval: Duration,
        on_changed: impl FnOnce() + Send + 'static,
    ) -> Result<Duration, DetectorError> {
        let generation = self.begin()?;

        let fingerprint = match self
            .shared
            .fingerprinter
            .fingerprint(&self.shared.target)
            .await
        {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::warn!(resource = %self.shared.target, error = %e, "Change detection unavailable");
                let mut inner = self.shared.lock();
                if inner.generation == generation {
                    inner.state = DetectorState::Stopped;
                }
                return Err(e.into());
            }
        };

        self.run(generation, fingerprint, interval, Box::new(on_changed))
    }

    /// Start polling against a fingerprint the caller already has.
    ///
    /// Use this with the [`digest`](crate::digest) of the exact bytes that
    /// were last processed, so a change landing before the first tick is
    /// still reported.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::AlreadyRunning`] when the detector is starting
    /// or running.
    pub fn start_with_fingerprint(
        &self,
        fingerprint: impl Into<String>,
        interval: Duration,
        on_changed: impl FnOnce() + Send + 'static,
    ) -> Result<Duration, DetectorError> {
        let generation = self.begin()?;
        self.run(generation, fingerprint.into(), interval, Box::new(on_changed))
    }

    fn begin(&self) -> Result<u64, DetectorError> {
        let mut inner = self.shared.lock();
        if matches!(inner.state, DetectorState::Starting | DetectorState::Running) {
            return Err(DetectorError::AlreadyRunning);
        }
        inner.state = DetectorState::Starting;
        inner.generation += 1;
        Ok(inner.generation)
    }

    fn run(
        &self,
        generation: u64,
        fingerprint: String,
        interval: Duration,
        on_changed: ChangeCallback,
    ) -> Result<Duration, DetectorError> {
        let interval = if interval < MIN_INTERVAL {
            tracing::debug!(
                requested_ms = interval.as_millis(),
                floor_ms = MIN_INTERVAL.as_millis(),
                "Polling interval raised to floor"
            );
            MIN_INTERVAL
        } else {
            interval
        };

        let mut inner = self.shared.lock();
        if inner.generation != generation || inner.state != DetectorState::Starting {
            tracing::debug!(resource = %self.shared.target, "Change detector stopped while starting");
            return Err(DetectorError::Cancelled);
        }
        inner.state = DetectorState::Running;
        inner.last_fingerprint = Some(fingerprint);
        inner.on_changed = Some(on_changed);

        // Spawned under the state lock: a stop() either cancels this run or finds its task.
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match check(&shared).await {
                    CheckOutcome::Unchanged | CheckOutcome::Skipped => {}
                    CheckOutcome::Changed | CheckOutcome::Failed | CheckOutcome::NotRunning => {
                        break;
                    }
                }
            }
        });
        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        drop(inner);

        if let Some(previous) = previous {
            previous.abort();
        }
        tracing::info!(
            resource = %self.shared.target,
            interval_ms = interval.as_millis(),
            "Change detector started"
        );
        Ok(interval)
    }

    /// Run one check immediately, outside the polling schedule.
    pub async fn check_now(&self) -> CheckOutcome {
        check(&self.shared).await
    }

    /// Stop polling. Safe to call any number of times, including while
    /// [`start`](Self::start) is still taking the initial fingerprint.
    pub fn stop(&self) {
        {
            let mut inner = self.shared.lock();
            if inner.state != DetectorState::Stopped {
                tracing::debug!(resource = %self.shared.target, "Change detector stopped");
            }
            inner.state = DetectorState::Stopped;
            inner.generation += 1;
            inner.on_changed = None;
        }
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl<F> Drop for ChangeDetector<F> {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

async fn check<F: Fingerprinter>(shared: &Shared<F>) -> CheckOutcome {
    if shared.state() != DetectorState::Running {
        return CheckOutcome::NotRunning;
    }
    if shared.in_flight.swap(true, Ordering::AcqRel) {
        return CheckOutcome::Skipped;
    }
    let result = {
        let _guard = InFlight(&shared.in_flight);
        shared.fingerprinter.fingerprint(&shared.target).await
    };

    let callback = {
        let mut inner = shared.lock();
        if inner.state != DetectorState::Running {
            return CheckOutcome::NotRunning;
        }
        match result {
            Err(e) => {
                tracing::warn!(resource = %shared.target, error = %e, "Fingerprint failed, stopping change detection");
                inner.state = DetectorState::Stopped;
                inner.on_changed = None;
                return CheckOutcome::Failed;
            }
            Ok(fingerprint) if inner.last_fingerprint.as_ref() == Some(&fingerprint) => {
                return CheckOutcome::Unchanged;
            }
            Ok(fingerprint) => {
                tracing::debug!(resource = %shared.target, %fingerprint, "Change detected");
                inner.last_fingerprint = Some(fingerprint);
                inner.state = DetectorState::Stopped;
                inner.on_changed.take()
            }
        }
    };

    if let Some(callback) = callback {
        callback();
    }
    CheckOutcome::Changed
}
