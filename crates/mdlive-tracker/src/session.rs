//! A tracker running as a task for one mounted view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::discovery::{DEFAULT_DISCOVERY_TIMEOUT, discover_headings};
use crate::machine::{ActiveHeadingTracker, NavigationInput, ObservationInput, Transition};
use crate::zone::ObservationZone;

/// Performs programmatic scrolling in the host view.
pub trait ScrollHandler: Send + 'static {
    fn scroll_to(&mut self, id: &str);
}

impl<F> ScrollHandler for F
where
    F: FnMut(&str) + Send + 'static,
{
    fn scroll_to(&mut self, id: &str) {
        self(id);
    }
}

/// Input accepted by a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerInput {
    Navigation(NavigationInput),
    Observation(ObservationInput),
}

/// Session settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub zone: ObservationZone,
    pub discovery_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zone: ObservationZone::default(),
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

/// Handle to a running tracker task.
///
/// Dropping the handle unmounts the session.
pub struct TrackerSession {
    input: mpsc::UnboundedSender<TrackerInput>,
    active: watch::Receiver<Option<String>>,
    mounted: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TrackerSession {
    /// Spawn a tracker fed by `headings`, the stream of heading IDs currently
    /// present in the view.
    pub fn spawn(
        config: SessionConfig,
        headings: watch::Receiver<Vec<String>>,
        scroll: impl ScrollHandler,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (active_tx, active_rx) = watch::channel(None);
        let mounted = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run(
            config,
            headings,
            input_rx,
            active_tx,
            Arc::clone(&mounted),
            scroll,
        ));

        Self {
            input: input_tx,
            active: active_rx,
            mounted,
            task,
        }
    }

    /// Queue an input. Returns `false` once the session has ended.
    pub fn send(&self, input: TrackerInput) -> bool {
        self.input.send(input).is_ok()
    }

    /// Receiver of the active heading ID.
    #[must_use]
    pub fn active(&self) -> watch::Receiver<Option<String>> {
        self.active.clone()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Stop the session. No further scrolls or state updates happen.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        self.task.abort();
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn run(
    config: SessionConfig,
    mut headings: watch::Receiver<Vec<String>>,
    mut input: mpsc::UnboundedReceiver<TrackerInput>,
    active: watch::Sender<Option<String>>,
    mounted: Arc<AtomicBool>,
    mut scroll: impl ScrollHandler,
) {
    let Some(initial) = discover_headings(&mut headings, config.discovery_timeout).await else {
        tracing::debug!("Tracker stopped without headings");
        return;
    };

    let mut tracker = ActiveHeadingTracker::new(config.zone);
    let mut apply = |transition: Transition, tracker: &ActiveHeadingTracker| {
        if !mounted.load(Ordering::Acquire) {
            return false;
        }
        if let Some(id) = transition.scroll_to {
            scroll.scroll_to(&id);
        }
        let current = tracker.active_id().map(str::to_owned);
        active.send_if_modified(|value| {
            if *value == current {
                false
            } else {
                *value = current;
                true
            }
        });
        true
    };

    let transition = tracker.set_headings(initial);
    if !apply(transition, &tracker) {
        return;
    }

    loop {
        let transition = tokio::select! {
            Some(next) = input.recv() => match next {
                TrackerInput::Navigation(nav) => tracker.navigate(nav),
                TrackerInput::Observation(obs) => tracker.observe(obs),
            },
            Ok(()) = headings.changed() => {
                let ids = headings.borrow_and_update().clone();
                tracker.set_headings(ids)
            }
            else => break,
        };
        if !apply(transition, &tracker) {
            break;
        }
    }
}
