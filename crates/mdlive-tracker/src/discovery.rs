//! Waiting for headings to appear in a freshly populated view.

use std::time::Duration;

use tokio::sync::watch;

/// Default bound on heading discovery.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait until the heading stream reports at least one heading.
///
/// Returns `None` when `timeout` elapses first or the stream closes; the
/// caller then runs without an active heading.
pub async fn discover_headings(
    headings: &mut watch::Receiver<Vec<String>>,
    timeout: Duration,
) -> Option<Vec<String>> {
    match tokio::time::timeout(timeout, headings.wait_for(|ids| !ids.is_empty())).await {
        Ok(Ok(ids)) => Some(ids.clone()),
        Ok(Err(_)) => {
            tracing::debug!("Heading stream closed before headings appeared");
            None
        }
        Err(_) => {
            tracing::debug!(timeout_ms = timeout.as_millis(), "No headings discovered");
            None
        }
    }
}
