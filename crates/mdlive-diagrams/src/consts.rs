//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path probed when initializing the Kroki engine.
pub const HEALTH_PATH: &str = "/health";

/// Mermaid security level requested for every render.
pub const MERMAID_SECURITY_LEVEL: &str = "strict";

/// Maximum number of rendered SVGs kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
