//! Kroki-backed diagram engine.
//!
//! Kroki renders every supported language over HTTP. Initialization probes
//! the service health endpoint; Mermaid sources get an `%%{init}%%`
//! directive carrying the theme and a strict security level.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use mdlive_renderer::ThemeData;
use ureq::Agent;

use crate::consts::{DEFAULT_TIMEOUT, HEALTH_PATH, MERMAID_SECURITY_LEVEL};
use crate::engine::{DiagramEngine, DiagramRequest, EngineError};
use crate::language::DiagramLanguage;

/// Create HTTP agent with the specified timeout.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Prefix Mermaid sources with the theme directive.
fn prepare_source(request: &DiagramRequest) -> String {
    if request.language == DiagramLanguage::Mermaid {
        format!(
            "%%{{init: {{\"theme\": \"{}\", \"securityLevel\": \"{MERMAID_SECURITY_LEVEL}\"}}}}%%\n{}",
            request.theme.diagram_theme, request.source
        )
    } else {
        request.source.clone()
    }
}

/// Diagram engine talking to a Kroki server.
pub struct KrokiEngine {
    agent: Agent,
    server_url: String,
    active_theme: Mutex<Option<&'static str>>,
}

impl KrokiEngine {
    /// Create an engine for the Kroki server at `server_url`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_timeout(server_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            agent: create_agent(timeout),
            server_url,
            active_theme: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Theme recorded by the last successful initialization.
    pub fn active_theme(&self) -> Option<&'static str> {
        *self
            .active_theme
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_health(agent: &Agent, url: &str) -> Result<(), EngineError> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| EngineError::Unavailable(e.to_string()))?;
    let status = response.status().as_u16();
    if status >= 400 {
        return Err(EngineError::Unavailable(format!("HTTP {status} from {url}")));
    }
    Ok(())
}

/// Send a diagram to Kroki and return the SVG body.
///
/// Handles HTTP errors by reading the response body for error details.
fn send_diagram_request(agent: &Agent, url: &str, source: &str) -> Result<String, EngineError> {
    let response = agent
        .post(url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| EngineError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(EngineError::Http(format!(
            "HTTP {status}: {}",
            error_body.trim()
        )));
    }

    body.read_to_string()
        .map_err(|e| EngineError::Io(e.to_string()))
}

async fn run_blocking<T, F>(f: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::Other(format!("render task failed: {e}")))?
}

impl DiagramEngine for KrokiEngine {
    async fn initialize(&self, theme: &'static ThemeData) -> Result<(), EngineError> {
        let agent = self.agent.clone();
        let url = format!("{}{HEALTH_PATH}", self.server_url);
        run_blocking(move || check_health(&agent, &url)).await?;

        *self
            .active_theme
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(theme.diagram_theme);
        tracing::debug!(server = %self.server_url, theme = theme.diagram_theme, "Kroki ready");
        Ok(())
    }

    async fn render(&self, request: &DiagramRequest) -> Result<String, EngineError> {
        let agent = self.agent.clone();
        let url = format!(
            "{}/{}/svg",
            self.server_url,
            request.language.kroki_endpoint()
        );
        let source = prepare_source(request);
        run_blocking(move || send_diagram_request(&agent, &url, &source)).await
    }
}
