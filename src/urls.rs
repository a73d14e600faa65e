//! Pure URL builders.
//!
//! Nothing in here touches the network; callers decide whether a built URL
//! is worth probing.

pub const UNPKG_BASE_URL: &str = "https://unpkg.com";
pub const RAW_GITHUB_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const GITHUB_BASE_URL: &str = "https://github.com";
pub const CHANGELOG_FILENAME: &str = "CHANGELOG.md";

/// Build the unpkg URL for a package's published `CHANGELOG.md`.
///
/// Scoped names (`@scope/name`) are inserted verbatim so the scope stays a
/// single path segment followed by the name.
pub fn build_unpkg_url(package: &str) -> String {
    format!("{UNPKG_BASE_URL}/{package}/{CHANGELOG_FILENAME}")
}

/// Build a raw.githubusercontent.com URL for `CHANGELOG.md` on `branch`.
///
/// An empty `subpath` points at the repository root. Stray slashes around
/// the subpath are dropped so the result never contains `//` in its path.
pub fn build_raw_github_url(owner: &str, repo: &str, subpath: &str, branch: &str) -> String {
    let subpath = subpath.trim_matches('/');
    if subpath.is_empty() {
        format!("{RAW_GITHUB_BASE_URL}/{owner}/{repo}/refs/heads/{branch}/{CHANGELOG_FILENAME}")
    } else {
        format!(
            "{RAW_GITHUB_BASE_URL}/{owner}/{repo}/refs/heads/{branch}/{subpath}/{CHANGELOG_FILENAME}"
        )
    }
}

/// Build a raw URL for an exact file path inside a repository.
///
/// Used for code-search hits, where the path already ends in the file name.
pub fn build_raw_github_file_url(owner: &str, repo: &str, branch: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{RAW_GITHUB_BASE_URL}/{owner}/{repo}/refs/heads/{branch}/{path}")
}

/// Build a GitHub compare URL between two revisions.
pub fn build_compare_url(owner: &str, repo: &str, from_version: &str, to_version: &str) -> String {
    format!("{GITHUB_BASE_URL}/{owner}/{repo}/compare/{from_version}...{to_version}")
}
