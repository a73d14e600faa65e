#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(128);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An npm-style name segment: lowercase, digits, `-`, `.`, `_`, never
/// leading with `.` or `_`.
pub fn arb_name_segment() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9._-]{0,20}"
}

/// Plain or scoped package name.
pub fn arb_package_name() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_name_segment(),
        (arb_name_segment(), arb_name_segment())
            .prop_map(|(scope, name)| format!("@{scope}/{name}")),
    ]
}

/// GitHub owner or repository name.
pub fn arb_repo_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9_-]{0,15}"
}

/// Directory path made of plain segments only.
pub fn arb_clean_subpath() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9][a-z0-9_-]{0,10}", 0..5).prop_map(|segments| segments.join("/"))
}

/// A messy relative path: empty, `.` and `..` segments mixed with names.
pub fn arb_messy_subpath() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => "[a-z0-9][a-z0-9_-]{0,10}",
            1 => Just(String::new()),
            1 => Just(".".to_string()),
            1 => Just("..".to_string()),
        ],
        0..6,
    )
    .prop_map(|segments| segments.join("/"))
}
