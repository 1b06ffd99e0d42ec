//! Existence oracles consulted after tree resolution fails.
//!
//! - [`LocalProbe`]: does this physical store path exist?
//! - [`RemoteProbe`]: is this URL reachable?
//!
//! [`FsProbe`] and [`HttpProbe`] are the production implementations;
//! tests substitute fixed answers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

/// "Does this physical path exist" oracle.
///
/// Paths are store-relative with `/` separators.
pub trait LocalProbe: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Checks paths below a content root on disk.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LocalProbe for FsProbe {
    fn exists(&self, path: &str) -> bool {
        !path.is_empty() && self.root.join(path).exists()
    }
}

/// Result of one remote probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Reachable,
    /// The server answered with a non-success status.
    Status(u16),
    /// No answer within the configured timeout.
    TimedOut,
    /// Connection, DNS, or TLS failure.
    Unreachable(String),
}

impl RemoteStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, RemoteStatus::Reachable)
    }
}

/// "Is this URL reachable" oracle.
#[async_trait]
pub trait RemoteProbe: Send + Sync {
    async fn probe(&self, url: &str) -> RemoteStatus;

    /// Per-probe timeout, used in issue messages.
    fn timeout(&self) -> Duration;
}

/// HEAD-request probe with a per-request timeout and a cap on requests
/// in flight. Failures are never retried.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl HttpProbe {
    pub fn new(timeout: Duration, max_concurrent: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("doctree/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }
}

#[async_trait]
impl RemoteProbe for HttpProbe {
    async fn probe(&self, url: &str) -> RemoteStatus {
        let url = if url.starts_with("//") {
            format!("https:{}", url)
        } else {
            url.to_string()
        };

        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return RemoteStatus::Unreachable("probe pool closed".to_string()),
        };

        // The timeout starts once a permit is held, so queued probes are
        // not charged for waiting.
        let request = self.client.head(&url).send();
        let status = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => RemoteStatus::TimedOut,
            Ok(Err(e)) if e.is_timeout() => RemoteStatus::TimedOut,
            Ok(Err(e)) => RemoteStatus::Unreachable(e.to_string()),
            Ok(Ok(response)) => {
                let code = response.status();
                if code.is_success() || code.is_redirection() {
                    RemoteStatus::Reachable
                } else {
                    RemoteStatus::Status(code.as_u16())
                }
            }
        };

        if !status.is_reachable() {
            debug!(url = %url, status = ?status, "remote probe failed");
        }
        status
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
