//! Changelogger: find CHANGELOG.md URLs for npm packages.
//!
//! Given npm package names, changelogger works out the most likely public
//! URL of each package's raw `CHANGELOG.md`. It tries, in order, the copy
//! published to unpkg, the repository behind the package's `bugs` URL, the
//! (possibly monorepo-nested) directory reported by `npm repo`, and GitHub
//! code search. When nothing is found it falls back to a GitHub compare URL
//! between the installed and latest versions.
//!
//! # Modules
//!
//! - [`resolve`]: The resolution chain and its results
//! - [`urls`]: Pure URL builders
//! - [`repo`]: Repository references and GitHub URL parsing
//! - [`npm`], [`search`], [`probe`]: Network and CLI collaborators
//! - [`error`]: Error types for changelogger operations

pub mod error;
pub mod npm;
pub mod probe;
pub mod repo;
pub mod resolve;
pub mod search;
pub mod urls;

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use error::ChangeloggerError;
pub use resolve::{Method, ResolutionResult, Resolver, ResolverConfig, Strategy};

/// Environment variable overriding the log filter (e.g. `changelogger=trace`).
pub const LOG_ENV: &str = "CHANGELOGGER_LOG";

/// The changelogger CLI application.
#[derive(Parser)]
#[command(name = "changelogger")]
#[command(version, author, about)]
struct Cli {
    /// One or more npm package names.
    #[arg(required = true, value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    verbose: bool,

    /// Timeout in seconds for each HTTP request.
    #[arg(long, env = "CHANGELOGGER_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Timeout in seconds for each npm invocation.
    #[arg(long, env = "CHANGELOGGER_NPM_TIMEOUT", default_value_t = 30)]
    npm_timeout: u64,

    /// npm executable to query for package metadata.
    #[arg(long, env = "CHANGELOGGER_NPM", default_value = "npm")]
    npm: String,

    /// Branch to probe, in priority order (repeatable).
    #[arg(long = "branch", value_name = "NAME", default_values_t = ["main".to_string(), "master".to_string()])]
    branches: Vec<String>,

    /// GitHub token used for code search.
    #[arg(long, env = search::GITHUB_TOKEN_ENV, hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub code search endpoint.
    #[arg(long, default_value = search::GITHUB_CODE_SEARCH_URL, hide = true)]
    code_search_url: String,

    /// Skip the GitHub code search strategy.
    #[arg(long)]
    no_code_search: bool,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the changelogger CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ChangeloggerError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = cli.output.as_str();
    if !matches!(output, "text" | "json") {
        return Err(ChangeloggerError::UnsupportedOutput(format!(
            "'{}' (supported: text, json)",
            output
        )));
    }

    let http_timeout = Duration::from_secs(cli.timeout);
    let metadata = npm::NpmCli::new(cli.npm.clone(), Duration::from_secs(cli.npm_timeout));
    let search = search::GitHubCodeSearch::new(
        cli.code_search_url.clone(),
        cli.github_token.clone(),
        http_timeout,
    );
    let prober = probe::HttpProber::new(http_timeout);

    let mut config = ResolverConfig {
        branches: cli.branches.clone(),
        ..ResolverConfig::default()
    };
    if cli.no_code_search {
        config
            .strategies
            .retain(|strategy| *strategy != Strategy::CodeSearch);
    }

    let resolver = Resolver::new(&metadata, &search, &prober, config);
    let results = resolver.resolve_all(cli.packages.as_slice());

    let written = write_report(
        &results,
        output,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    );
    match written {
        // A closed pipe (e.g. `| head -1`) ends the output early.
        Err(ChangeloggerError::Io(source)) if source.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Write found URLs to `out` and not-found notices to `err`, or the whole
/// batch as a JSON array to `out`.
fn write_report<O: Write, E: Write>(
    results: &[ResolutionResult],
    output: &str,
    out: &mut O,
    err: &mut E,
) -> Result<(), ChangeloggerError> {
    if output == "json" {
        let json = serde_json::to_string_pretty(results).map_err(ChangeloggerError::JsonWrite)?;
        writeln!(out, "{json}")?;
    } else {
        for result in results {
            if result.is_found() {
                writeln!(out, "{result}")?;
            } else {
                writeln!(err, "{result}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Send `tracing` output to stderr: debug when verbose, warnings otherwise.
/// `CHANGELOGGER_LOG` takes precedence when set.
fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "changelogger=debug"
    } else {
        "changelogger=warn"
    };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn sample_results() -> Vec<ResolutionResult> {
        vec![
            ResolutionResult::found(
                "lodash",
                "https://unpkg.com/lodash/CHANGELOG.md".to_string(),
                Method::Unpkg,
            ),
            ResolutionResult::not_found("left-pad"),
        ]
    }

    #[test]
    fn text_report_splits_found_and_not_found() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        write_report(&sample_results(), "text", &mut out, &mut err).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://unpkg.com/lodash/CHANGELOG.md\n"
        );
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "left-pad: CHANGELOG.md not found\n"
        );
    }

    #[test]
    fn json_report_goes_to_stdout_only() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        write_report(&sample_results(), "json", &mut out, &mut err).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(parsed[1]["method"], "not_found");
        assert!(err.is_empty());
    }

    #[test]
    fn closed_stdout_is_an_io_error_not_a_panic() {
        let mut err = Vec::new();
        let result = write_report(&sample_results(), "text", &mut ClosedPipe, &mut err);

        match result {
            Err(ChangeloggerError::Io(source)) => {
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
