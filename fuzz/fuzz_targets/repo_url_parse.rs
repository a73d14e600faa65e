//! Fuzz target for repository URL parsing.
//!
//! Feeds arbitrary strings through both the GitHub URL parser and the npm
//! `repository.url` normalizer, checking for panics and for subpaths that
//! escape the repository.

#![no_main]

use changelogger::repo::{parse_github_url, parse_repository_field};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for parsed in [parse_github_url(input), parse_repository_field(input)]
        .into_iter()
        .flatten()
    {
        assert!(!parsed.subpath.starts_with('/'));
        assert!(parsed.subpath.split('/').all(|segment| segment != ".."));
    }
});
