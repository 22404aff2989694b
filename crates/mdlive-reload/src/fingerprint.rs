//! Resource fingerprinting.
//!
//! A fingerprint is the SHA-256 of a resource's bytes, hex encoded. Targets
//! are local paths, `file://` URLs, or `http(s)://` URLs.

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};
use ureq::Agent;
use url::Url;

/// Default HTTP timeout for fetching remote documents.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors fetching a resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid target {target}: {message}")]
    InvalidTarget { target: String, message: String },
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Redirect from {0} not followed")]
    Redirected(String),
}

/// Computes a fingerprint for a target.
pub trait Fingerprinter: Send + Sync + 'static {
    fn fingerprint(&self, target: &str)
    -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Hex-encoded SHA-256 of `bytes`.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A parsed fetch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    Http(Url),
}

impl Target {
    /// Parse a target string.
    ///
    /// Strings containing `://` are URLs; anything else is a filesystem path.
    pub fn parse(target: &str) -> Result<Self, FetchError> {
        if !target.contains("://") {
            return Ok(Self::File(PathBuf::from(target)));
        }

        let url = Url::parse(target).map_err(|e| FetchError::InvalidTarget {
            target: target.to_owned(),
            message: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|()| FetchError::InvalidTarget {
                    target: target.to_owned(),
                    message: "not a local file path".to_owned(),
                }),
            other => Err(FetchError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Which remote hosts may be fetched.
#[derive(Debug, Clone, Default)]
pub struct TargetPolicy {
    /// `None` allows any host.
    pub allowed_hosts: Option<Vec<String>>,
}

impl TargetPolicy {
    #[must_use]
    pub fn allows(&self, url: &Url) -> bool {
        let Some(allowed) = &self.allowed_hosts else {
            return true;
        };
        url.host_str().is_some_and(|host| {
            allowed
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
        })
    }
}

/// Create HTTP agent with the specified timeout.
fn fetch_http(agent: &Agent, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::TooManyRedirects => FetchError::Redirected(url.to_owned()),
        other => FetchError::Http(other.to_string()),
    })?;
    let status = response.status().as_u16();
    if response.status().is_redirection() {
        return Err(FetchError::Redirected(url.to_owned()));
    }
    if status >= 400 {
        return Err(FetchError::Status {
            status,
            url: url.to_owned(),
        });
    }
    response
        .into_body()
        .read_to_vec()
        .map_err(|e| FetchError::Http(e.to_string()))
}

/// Fingerprinter for local files and HTTP resources.
#[derive(Clone)]
pub struct ResourceFingerprinter {
    agent: Agent,
    policy: TargetPolicy,
}

impl ResourceFingerprinter {
    #[must_use]
    pub fn new(policy: TargetPolicy) -> Self {
        Self::with_timeout(policy, DEFAULT_FETCH_TIMEOUT)
    }

    /// Redirects are never followed: the policy only vets the requested URL.
    #[must_use]
    pub fn with_timeout(policy: TargetPolicy, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .into();
        Self { agent, policy }
    }

    /// Fetch the raw bytes of `target`.
    pub async fn fetch_bytes(&self, target: &str) -> Result<Vec<u8>, FetchError> {
        match Target::parse(target)? {
            Target::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|source| FetchError::Io { path, source }),
            Target::Http(url) => {
                if !self.policy.allows(&url) {
                    return Err(FetchError::HostNotAllowed(
                        url.host_str().unwrap_or_default().to_owned(),
                    ));
                }
                let agent = self.agent.clone();
                tokio::task::spawn_blocking(move || fetch_http(&agent, url.as_str()))
                    .await
                    .map_err(|e| FetchError::Http(format!("fetch task failed: {e}")))?
            }
        }
    }
}

impl Default for ResourceFingerprinter {
    fn default() -> Self {
        Self::new(TargetPolicy::default())
    }
}

impl Fingerprinter for ResourceFingerprinter {
    async fn fingerprint(&self, target: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(target).await?;
        Ok(digest(&bytes))
    }
}
