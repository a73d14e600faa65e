//! Repository references derived from npm metadata.

use crate::error::ChangeloggerError;

pub const GITHUB_HOST: &str = "github.com";

/// A repository on a code host, optionally narrowed to a monorepo directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoRef {
    pub host: String,
    pub owner: String,
    pub repo: String,
    /// Relative directory inside the repository. Empty means the root.
    /// Never has a leading slash and never contains `..`.
    pub subpath: String,
}

impl RepoRef {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            host: GITHUB_HOST.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            subpath: String::new(),
        }
    }

    pub fn with_subpath(mut self, subpath: &str) -> Self {
        self.subpath = normalize_subpath(subpath);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parse a GitHub web URL into a [`RepoRef`].
///
/// Accepted shapes:
/// - `https://github.com/owner/repo`
/// - `https://github.com/owner/repo/issues` (and other tracker pages)
/// - `https://github.com/owner/repo/tree/<ref>/path/to/dir`
/// - `https://github.com/owner/repo/blob/<ref>/path/to/dir`
///
/// The ref in `tree`/`blob` URLs is discarded; callers probe their own
/// branch list instead.
pub fn parse_github_url(input: &str) -> Result<RepoRef, ChangeloggerError> {
    let url = url::Url::parse(input.trim()).map_err(|source| ChangeloggerError::RepoUrl {
        url: input.to_string(),
        message: format!("invalid URL: {source}"),
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| ChangeloggerError::RepoUrl {
            url: input.to_string(),
            message: "URL is missing a host".to_string(),
        })?
        .to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host != GITHUB_HOST {
        return Err(ChangeloggerError::RepoUrl {
            url: input.to_string(),
            message: format!("Unsupported host: {host}. Only GitHub URLs are supported."),
        });
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|iter| iter.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(ChangeloggerError::RepoUrl {
            url: input.to_string(),
            message: "Invalid GitHub URL format".to_string(),
        });
    }

    let owner = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
    if repo.is_empty() {
        return Err(ChangeloggerError::RepoUrl {
            url: input.to_string(),
            message: "Invalid GitHub URL format".to_string(),
        });
    }

    let subpath = match segments.get(2) {
        Some(&"tree") | Some(&"blob") if segments.len() > 4 => segments[4..].join("/"),
        _ => String::new(),
    };

    let parsed = RepoRef::new(owner, repo).with_subpath(&subpath);
    tracing::debug!(
        owner = %parsed.owner,
        repo = %parsed.repo,
        subpath = %parsed.subpath,
        "parsed GitHub URL"
    );
    Ok(parsed)
}

/// Rewrite an npm `repository.url` value into a browsable https URL.
///
/// Handles the forms npm accepts: `git+https://`, `git+ssh://git@host/`,
/// `git://`, `ssh://`, scp-style `git@host:owner/repo.git`, `github:owner/repo`
/// and bare `owner/repo` shorthand.
pub fn normalize_repository_url(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix("github:") {
        return format!("https://{GITHUB_HOST}/{rest}");
    }
    if let Some((provider, rest)) = raw.split_once(':') {
        let host = match provider {
            "gitlab" => Some("gitlab.com"),
            "bitbucket" => Some("bitbucket.org"),
            "gist" => Some("gist.github.com"),
            _ => None,
        };
        if let Some(host) = host {
            return format!("https://{host}/{rest}");
        }
    }

    let without_git_plus = raw.strip_prefix("git+").unwrap_or(raw);
    for scheme in ["https://", "http://", "git://", "ssh://"] {
        if let Some(rest) = without_git_plus.strip_prefix(scheme) {
            let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
            let host = authority
                .rsplit_once('@')
                .map_or(authority, |(_, host)| host);
            // `ssh://git@github.com:owner/repo` puts the owner after a colon.
            let host = match (scheme, host.split_once(':')) {
                ("ssh://" | "git://", Some((host, owner))) => format!("{host}/{owner}"),
                _ => host.to_string(),
            };
            return format!("https://{host}/{path}");
        }
    }

    if let Some(rest) = without_git_plus.strip_prefix("git@") {
        return format!("https://{}", rest.replacen(':', "/", 1));
    }

    let mut parts = raw.split('/');
    if let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) {
        if !owner.is_empty() && !repo.is_empty() && !owner.contains(':') {
            return format!("https://{GITHUB_HOST}/{owner}/{repo}");
        }
    }

    raw.to_string()
}

/// Parse an npm `repository.url` value (any accepted form) into a [`RepoRef`].
pub fn parse_repository_field(raw: &str) -> Result<RepoRef, ChangeloggerError> {
    parse_github_url(&normalize_repository_url(raw))
}

/// Normalize a monorepo subpath: no leading/trailing slash, no `.` or empty
/// segments, and `..` collapsed (never escaping the repository root).
pub fn normalize_subpath(subpath: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in subpath.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
