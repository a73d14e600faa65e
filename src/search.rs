//! GitHub code search for `CHANGELOG.md` files.

use std::time::Duration;

use serde_json::Value;

use crate::error::ChangeloggerError;
use crate::urls::CHANGELOG_FILENAME;

pub const GITHUB_CODE_SEARCH_URL: &str = "https://api.github.com/search/code";

/// Environment variable the CLI reads the GitHub token from.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Finds a `CHANGELOG.md` path inside a known repository.
pub trait CodeSearch {
    /// Path of the best match relative to the repository root
    /// (e.g. `packages/foo/CHANGELOG.md`), or `None` when nothing was found
    /// or the search could not be performed.
    fn search_changelog_path(&self, owner: &str, repo: &str) -> Option<String>;
}

/// [`CodeSearch`] over the GitHub REST search API.
///
/// GitHub refuses anonymous code search, so without a token every lookup
/// reports "no result".
pub struct GitHubCodeSearch {
    endpoint: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl GitHubCodeSearch {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            endpoint: endpoint.into(),
            token: token.filter(|token| !token.trim().is_empty()),
            agent: config.into(),
        }
    }

    fn search(&self, owner: &str, repo: &str) -> Result<Value, ChangeloggerError> {
        let url = build_search_url(&self.endpoint, owner, repo)?;

        let mut request = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = self.token.as_deref() {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = request.call().map_err(|source| ChangeloggerError::Http {
            url: url.to_string(),
            message: source.to_string(),
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = match status {
                401 => "authentication required".to_string(),
                403 | 429 => "rate limited".to_string(),
                other => format!("status {other}"),
            };
            return Err(ChangeloggerError::Http {
                url: url.to_string(),
                message,
            });
        }

        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|source| ChangeloggerError::Http {
                url: url.to_string(),
                message: source.to_string(),
            })
    }
}

impl CodeSearch for GitHubCodeSearch {
    fn search_changelog_path(&self, owner: &str, repo: &str) -> Option<String> {
        if self.token.is_none() {
            tracing::debug!(owner, repo, "code search skipped: no GitHub token");
            return None;
        }
        match self.search(owner, repo) {
            Ok(body) => {
                let path = extract_changelog_path(&body);
                tracing::debug!(owner, repo, ?path, "code search finished");
                path
            }
            Err(err) => {
                tracing::debug!(owner, repo, error = %err, "code search failed");
                None
            }
        }
    }
}

/// Build the search query URL scoped to `owner/repo`.
pub fn build_search_url(endpoint: &str, owner: &str, repo: &str) -> Result<url::Url, ChangeloggerError> {
    let mut url = url::Url::parse(endpoint).map_err(|source| ChangeloggerError::Http {
        url: endpoint.to_string(),
        message: format!("invalid URL: {source}"),
    })?;
    url.query_pairs_mut()
        .append_pair(
            "q",
            &format!("filename:{CHANGELOG_FILENAME} repo:{owner}/{repo}"),
        )
        .append_pair("per_page", "10");
    Ok(url)
}

/// First result whose file name is `CHANGELOG.md`.
///
/// The `filename:` qualifier also matches names like `CHANGELOG.md.bak`,
/// so results are filtered on the final path segment.
pub fn extract_changelog_path(body: &Value) -> Option<String> {
    body.get("items")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("path").and_then(Value::as_str))
        .find(|path| {
            path.rsplit('/')
                .next()
                .is_some_and(|name| name.eq_ignore_ascii_case(CHANGELOG_FILENAME))
        })
        .map(str::to_string)
}
