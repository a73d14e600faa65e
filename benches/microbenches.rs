//! Criterion microbenches for changelogger URL handling.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - GitHub URL parsing (parse_github_url)
//! - npm repository field normalization (parse_repository_field)
//! - Raw changelog URL building (build_raw_github_url)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use changelogger::repo::{parse_github_url, parse_repository_field};
use changelogger::urls::build_raw_github_url;

const TREE_URLS: &[&str] = &[
    "https://github.com/TanStack/query/tree/HEAD/packages/react-query",
    "https://github.com/sanity-io/plugins/tree/main/plugins/sanity-plugin-iframe-pane",
    "https://github.com/lodash/lodash/issues",
    "https://github.com/babel/babel",
];

const REPOSITORY_FIELDS: &[&str] = &[
    "git+https://github.com/babel/babel.git",
    "git+ssh://git@github.com/facebook/react.git",
    "git@github.com:vercel/next.js.git",
    "github:sindresorhus/got",
    "expressjs/express",
];

/// Benchmark parsing browsable GitHub URLs.
fn bench_parse_github_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(TREE_URLS.len() as u64));

    group.bench_function("parse_github_url", |b| {
        b.iter(|| {
            for url in TREE_URLS {
                black_box(parse_github_url(black_box(url)).unwrap());
            }
        })
    });

    group.finish();
}

/// Benchmark normalizing the `repository.url` forms npm accepts.
fn bench_parse_repository_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(REPOSITORY_FIELDS.len() as u64));

    group.bench_function("parse_repository_field", |b| {
        b.iter(|| {
            for field in REPOSITORY_FIELDS {
                black_box(parse_repository_field(black_box(field)).unwrap());
            }
        })
    });

    group.finish();
}

/// Benchmark building raw URLs for every branch candidate.
fn bench_build_raw_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    group.bench_function("build_raw_github_url", |b| {
        b.iter(|| {
            for branch in ["main", "master"] {
                black_box(build_raw_github_url(
                    black_box("TanStack"),
                    black_box("query"),
                    black_box("packages/react-query"),
                    branch,
                ));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_github_url,
    bench_parse_repository_field,
    bench_build_raw_url,
);
criterion_main!(benches);
