use std::time::Duration;
use thiserror::Error;

/// The main error type for changelogger operations.
///
/// These errors never cross into the resolution chain: collaborators log
/// them and report "no candidate" instead.
#[derive(Debug, Error)]
pub enum ChangeloggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{program}` failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("`{program}` timed out after {timeout:?}")]
    CommandTimeout { program: String, timeout: Duration },

    #[error("Failed to parse npm metadata for {package}: {source}")]
    MetadataParse {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid repository URL '{url}': {message}")]
    RepoUrl { url: String, message: String },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),

    #[error("Failed to write JSON output: {0}")]
    JsonWrite(#[source] serde_json::Error),
}
