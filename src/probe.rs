//! URL existence probing.

use std::time::Duration;

/// Default bound on a single probe.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers "does anything live at this URL?" without downloading it.
///
/// Implementations must never fail: timeouts, connection errors and
/// malformed URLs all count as "does not exist".
pub trait Prober {
    fn exists(&self, url: &str) -> bool;
}

/// HEAD-request prober backed by a shared `ureq` agent.
pub struct HttpProber {
    agent: ureq::Agent,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(REQUEST_TIMEOUT)
    }
}

impl Prober for HttpProber {
    fn exists(&self, url: &str) -> bool {
        tracing::debug!(%url, "probing");
        match self.agent.head(url).call() {
            Ok(response) => {
                let status = response.status();
                let exists = status.is_success();
                tracing::debug!(
                    %url,
                    status = status.as_u16(),
                    "{}",
                    if exists { "exists" } else { "does not exist" }
                );
                exists
            }
            Err(source) => {
                tracing::debug!(%url, error = %source, "probe failed");
                false
            }
        }
    }
}
