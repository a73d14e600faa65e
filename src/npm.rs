//! npm registry metadata, obtained through the `npm` CLI.
//!
//! Every lookup is best-effort. Command failures, timeouts and unparseable
//! output are logged and reported as `None`, so the resolution chain only
//! ever sees "candidate" or "no candidate".

use std::cell::RefCell;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::ChangeloggerError;
use crate::repo::{parse_github_url, RepoRef};

/// Default bound on a single `npm` invocation.
pub const NPM_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Installed and latest versions of an outdated local dependency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionSpan {
    pub current: String,
    pub latest: String,
}

/// Source of per-package registry metadata.
pub trait PackageMetadata {
    /// Called once before the lookups for `package` start. Anything an
    /// implementation keeps between lookups must not outlive this call for
    /// the next package.
    fn begin_resolution(&self, _package: &str) {}

    /// Issue-tracker URL from the package's `bugs` field.
    fn bugs_url(&self, package: &str) -> Option<String>;

    /// Canonical repository location, including a monorepo subpath when the
    /// registry knows one.
    fn repo_ref(&self, package: &str) -> Option<RepoRef>;

    /// Raw `repository.url` value, in whatever form the package declares it.
    fn repository_field(&self, package: &str) -> Option<String>;

    /// Version span for a locally installed package that has a newer release.
    fn outdated_versions(&self, package: &str) -> Option<VersionSpan>;
}

/// Captured result of a finished command.
#[derive(Debug)]
struct CommandOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// `npm view` document for the package being resolved. A failed lookup is
/// kept too, so it is not retried within the same resolution.
type ViewMemo = Option<(String, Option<Value>)>;

/// [`PackageMetadata`] backed by the `npm` executable.
#[derive(Debug)]
pub struct NpmCli {
    program: String,
    timeout: Duration,
    view: RefCell<ViewMemo>,
}

impl NpmCli {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            view: RefCell::new(None),
        }
    }

    /// Run `npm <args>` with the configured timeout.
    fn run(&self, args: &[&str]) -> Result<CommandOutput, ChangeloggerError> {
        tracing::debug!(program = %self.program, ?args, "running");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ChangeloggerError::CommandFailed {
                program: self.program.clone(),
                message: source.to_string(),
            })?;

        // Drain both pipes off-thread while polling for exit.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill_and_reap(&mut child);
                    return Err(source.into());
                }
            }
            if Instant::now() >= deadline {
                kill_and_reap(&mut child);
                return Err(ChangeloggerError::CommandTimeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let join = |reader: Option<thread::JoinHandle<String>>| {
            reader
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default()
        };

        Ok(CommandOutput {
            success: status.success(),
            stdout: join(stdout_reader),
            stderr: join(stderr_reader),
        })
    }

    /// The `npm view` document for `package`, fetched at most once per
    /// resolution and shared by the `bugs` and `repository` lookups.
    fn view(&self, package: &str) -> Option<Value> {
        if let Some((cached_for, data)) = self.view.borrow().as_ref() {
            if cached_for == package {
                return data.clone();
            }
        }

        let data = self
            .view_json(package)
            .map_err(|err| tracing::debug!(package, error = %err, "npm view failed"))
            .ok();
        *self.view.borrow_mut() = Some((package.to_string(), data.clone()));
        data
    }

    /// `npm view <package> --json`, parsed.
    fn view_json(&self, package: &str) -> Result<Value, ChangeloggerError> {
        let output = self.run(&["view", package, "--json"])?;
        if !output.success {
            return Err(ChangeloggerError::CommandFailed {
                program: format!("{} view", self.program),
                message: output.stderr.trim().to_string(),
            });
        }
        serde_json::from_str(&output.stdout).map_err(|source| ChangeloggerError::MetadataParse {
            package: package.to_string(),
            source,
        })
    }

    fn repo_url(&self, package: &str) -> Result<Option<String>, ChangeloggerError> {
        let output = self.run(&["repo", package, "--no-browser"])?;
        if !output.success {
            return Err(ChangeloggerError::CommandFailed {
                program: format!("{} repo", self.program),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(extract_repo_url_line(&output.stdout).map(str::to_string))
    }

    fn outdated_json(&self, package: &str) -> Result<Option<Value>, ChangeloggerError> {
        // Exit status 1 is how `npm outdated` reports "something is outdated",
        // so only the output decides.
        let output = self.run(&["outdated", package, "--json"])?;
        let stdout = output.stdout.trim();
        if stdout.is_empty() || stdout == "{}" {
            return Ok(None);
        }
        serde_json::from_str(stdout)
            .map(Some)
            .map_err(|source| ChangeloggerError::MetadataParse {
                package: package.to_string(),
                source,
            })
    }
}

impl Default for NpmCli {
    fn default() -> Self {
        Self::new("npm", NPM_TIMEOUT)
    }
}

impl PackageMetadata for NpmCli {
    fn begin_resolution(&self, _package: &str) {
        self.view.borrow_mut().take();
    }

    fn bugs_url(&self, package: &str) -> Option<String> {
        let bugs_url = extract_bugs_url(&self.view(package)?);
        if bugs_url.is_none() {
            tracing::debug!(package, "no bugs URL in package data");
        }
        bugs_url
    }

    fn repo_ref(&self, package: &str) -> Option<RepoRef> {
        let url = match self.repo_url(package) {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::debug!(package, "no URL in npm repo output");
                return None;
            }
            Err(err) => {
                tracing::debug!(package, error = %err, "repo lookup failed");
                return None;
            }
        };
        parse_github_url(&url)
            .map_err(|err| tracing::debug!(package, error = %err, "unusable repo URL"))
            .ok()
    }

    fn repository_field(&self, package: &str) -> Option<String> {
        extract_repository_url(&self.view(package)?)
    }

    fn outdated_versions(&self, package: &str) -> Option<VersionSpan> {
        match self.outdated_json(package) {
            Ok(Some(data)) => extract_outdated_versions(&data, package),
            Ok(None) => {
                tracing::debug!(package, "not installed or up to date");
                None
            }
            Err(err) => {
                tracing::debug!(package, error = %err, "outdated lookup failed");
                None
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

/// `npm view` prints an array when a range matches several versions; the
/// last entry is the newest.
fn latest_manifest(data: &Value) -> &Value {
    match data.as_array() {
        Some(items) => items.last().unwrap_or(data),
        None => data,
    }
}

/// Pull the issue-tracker URL from `bugs`, which may be an object or a
/// plain string.
pub fn extract_bugs_url(data: &Value) -> Option<String> {
    let bugs = latest_manifest(data).get("bugs")?;
    bugs.get("url")
        .and_then(Value::as_str)
        .or_else(|| bugs.as_str())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Pull `repository.url` (or a string-valued `repository`).
pub fn extract_repository_url(data: &Value) -> Option<String> {
    let repository = latest_manifest(data).get("repository")?;
    repository
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| repository.as_str())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// `npm repo --no-browser` may print an informational line first; the URL
/// is the first line that starts with `http`.
pub fn extract_repo_url_line(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http"))
}

/// Find `package` in `npm outdated --json` output and return its span.
///
/// Up-to-date entries (`current == latest`) and entries missing either
/// version yield `None`.
pub fn extract_outdated_versions(data: &Value, package: &str) -> Option<VersionSpan> {
    let object = data.as_object()?;
    let entry = object.get(package).or_else(|| {
        let suffix = format!("/{package}");
        object
            .iter()
            .find(|(key, _)| key.ends_with(&suffix))
            .map(|(_, value)| value)
    })?;

    // Workspaces report one entry per dependent as an array.
    let entry = match entry.as_array() {
        Some(items) => items.first()?,
        None => entry,
    };

    let current = entry.get("current").and_then(Value::as_str)?;
    let latest = entry.get("latest").and_then(Value::as_str)?;
    if current.is_empty() || latest.is_empty() || current == latest {
        return None;
    }

    tracing::debug!(package, current, latest, "found outdated package");
    Some(VersionSpan {
        current: current.to_string(),
        latest: latest.to_string(),
    })
}
