//! Race-free engine initialization.
//!
//! At most one initialization is in flight per [`DiagramEngineState`]. Callers
//! that need a different theme while one is running wait for it, then
//! re-check. The in-flight marker is published under the lock before anything
//! is awaited, and is cleared by the initialization itself after it has
//! committed the new theme.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use mdlive_renderer::ThemeData;

use crate::engine::{DiagramEngine, EngineError};

type InitFuture = Shared<BoxFuture<'static, Result<(), EngineError>>>;

struct PendingInit {
    theme: &'static ThemeData,
    future: InitFuture,
}

#[derive(Default)]
struct Inner {
    initialized_theme: Option<&'static ThemeData>,
    pending: Option<PendingInit>,
}

/// Point-in-time view of the engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Theme the engine is currently configured for.
    pub initialized_theme: Option<&'static str>,
    /// Theme of the initialization in flight, if any.
    pub pending_theme: Option<&'static str>,
}

/// Shared handle to an engine and its initialization state.
///
/// Cloning is cheap and every clone observes the same state.
pub struct DiagramEngineState<E> {
    engine: Arc<E>,
    inner: Arc<Mutex<Inner>>,
}

impl<E> Clone for DiagramEngineState<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E: DiagramEngine> DiagramEngineState<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let inner = lock(&self.inner);
        EngineSnapshot {
            initialized_theme: inner.initialized_theme.map(|t| t.id),
            pending_theme: inner.pending.as_ref().map(|p| p.theme.id),
        }
    }

    /// Make sure the engine is initialized for `theme`.
    ///
    /// Joins an in-flight initialization when there is one (whatever its
    /// theme), otherwise starts exactly one. Returns the error of a failed
    /// initialization for `theme`.
    pub async fn ensure_initialized(&self, theme: &'static ThemeData) -> Result<(), EngineError> {
        loop {
            let (future, target) = {
                let mut inner = lock(&self.inner);
                if let Some(pending) = &inner.pending {
                    (pending.future.clone(), pending.theme)
                } else if inner.initialized_theme.is_some_and(|t| t.id == theme.id) {
                    return Ok(());
                } else {
                    let future = self.start_init(theme);
                    inner.pending = Some(PendingInit {
                        theme,
                        future: future.clone(),
                    });
                    (future, theme)
                }
            };

            let result = future.await;
            if target.id == theme.id {
                result?;
            }
        }
    }

    fn start_init(&self, theme: &'static ThemeData) -> InitFuture {
        let engine = Arc::clone(&self.engine);
        let inner = Arc::clone(&self.inner);

        async move {
            tracing::info!(theme = theme.id, "Initializing diagram engine");
            let result = engine.initialize(theme).await;

            let mut state = lock(&inner);
            match &result {
                Ok(()) => state.initialized_theme = Some(theme),
                Err(e) => {
                    tracing::warn!(theme = theme.id, error = %e, "Diagram engine initialization failed");
                    state.initialized_theme = None;
                }
            }
            state.pending = None;
            result
        }
        .boxed()
        .shared()
    }
}
