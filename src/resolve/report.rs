//! Resolution results and how they are reported.

use std::fmt;

use serde::Serialize;

use super::Strategy;

/// How a changelog URL was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Unpkg,
    NpmBugs,
    NpmRepo,
    CodeSearch,
    CompareFallback,
    NotFound,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Unpkg => "unpkg",
            Method::NpmBugs => "npm_bugs",
            Method::NpmRepo => "npm_repo",
            Method::CodeSearch => "code_search",
            Method::CompareFallback => "compare_fallback",
            Method::NotFound => "not_found",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL a strategy wants probed, tagged with where it came from.
///
/// Only used for tracing; never stored past a single resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub strategy: Strategy,
    pub branch: Option<String>,
}

impl CandidateUrl {
    pub fn new(url: String, strategy: Strategy, branch: Option<&str>) -> Self {
        Self {
            url,
            strategy,
            branch: branch.map(str::to_string),
        }
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{} [{} @ {}]", self.url, self.strategy, branch),
            None => write!(f, "{} [{}]", self.url, self.strategy),
        }
    }
}

/// Outcome of resolving one package. Exactly one per requested name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub package: String,
    /// Empty when `method` is [`Method::NotFound`].
    pub url: String,
    pub method: Method,
}

impl ResolutionResult {
    pub fn found(package: &str, url: String, method: Method) -> Self {
        Self {
            package: package.to_string(),
            url,
            method,
        }
    }

    pub fn not_found(package: &str) -> Self {
        Self {
            package: package.to_string(),
            url: String::new(),
            method: Method::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        self.method != Method::NotFound
    }
}

impl fmt::Display for ResolutionResult {
    /// The line printed for this result: the URL, or a not-found notice.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_found() {
            f.write_str(&self.url)
        } else {
            write!(f, "{}: CHANGELOG.md not found", self.package)
        }
    }
}
