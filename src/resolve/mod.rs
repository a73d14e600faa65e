//! Changelog resolution for npm packages.
//!
//! A [`Resolver`] runs an ordered chain of strategies for one package:
//! - `unpkg`: the changelog shipped inside the published tarball
//! - `npm_bugs`: the repository behind the `bugs` URL, at its root
//! - `npm_repo`: the repository reported by `npm repo`, including the
//!   monorepo directory when there is one
//! - `code_search`: a `CHANGELOG.md` found by GitHub code search
//!
//! The first confirmed URL wins. When every strategy comes up empty the
//! resolver degrades to a compare URL between the installed and latest
//! versions, or to "not found". Nothing in here returns an error.

mod report;

pub use report::{CandidateUrl, Method, ResolutionResult};

use std::fmt;

use crate::npm::{PackageMetadata, VersionSpan};
use crate::probe::Prober;
use crate::repo::{parse_github_url, parse_repository_field, RepoRef};
use crate::search::CodeSearch;
use crate::urls::{
    build_compare_url, build_raw_github_file_url, build_raw_github_url, build_unpkg_url,
};

/// One step of the resolution chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Unpkg,
    NpmBugs,
    NpmRepo,
    CodeSearch,
}

impl Strategy {
    /// All strategies in the order they are tried.
    pub const ALL: [Strategy; 4] = [
        Strategy::Unpkg,
        Strategy::NpmBugs,
        Strategy::NpmRepo,
        Strategy::CodeSearch,
    ];

    pub fn method(self) -> Method {
        match self {
            Strategy::Unpkg => Method::Unpkg,
            Strategy::NpmBugs => Method::NpmBugs,
            Strategy::NpmRepo => Method::NpmRepo,
            Strategy::CodeSearch => Method::CodeSearch,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// Tunables for a [`Resolver`].
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Branches probed, in priority order, for the `npm_bugs` and `npm_repo`
    /// strategies. The first branch with a changelog wins.
    pub branches: Vec<String>,
    /// Strategies to run, in order.
    pub strategies: Vec<Strategy>,
    /// Tag prefixes tried when building compare URLs.
    pub tag_prefixes: Vec<String>,
    /// Branch used to turn a code-search path into a raw URL.
    pub code_search_branch: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            branches: vec!["main".to_string(), "master".to_string()],
            strategies: Strategy::ALL.to_vec(),
            tag_prefixes: vec![String::new(), "v".to_string()],
            code_search_branch: "main".to_string(),
        }
    }
}

/// What a single resolution has learned so far.
#[derive(Debug, Default)]
struct Discovered {
    repo: Option<RepoRef>,
}

impl Discovered {
    /// Keep `repo` unless a repository is already known.
    fn remember(&mut self, repo: &RepoRef) {
        if self.repo.is_none() {
            self.repo = Some(repo.clone());
        }
    }

    /// Replace whatever was known with the canonical `npm repo` answer.
    fn prefer(&mut self, repo: &RepoRef) {
        self.repo = Some(repo.clone());
    }
}

/// Runs the strategy chain against injected collaborators.
pub struct Resolver<'a> {
    metadata: &'a dyn PackageMetadata,
    search: &'a dyn CodeSearch,
    prober: &'a dyn Prober,
    config: ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        metadata: &'a dyn PackageMetadata,
        search: &'a dyn CodeSearch,
        prober: &'a dyn Prober,
        config: ResolverConfig,
    ) -> Self {
        Self {
            metadata,
            search,
            prober,
            config,
        }
    }

    /// Resolve every package independently, preserving input order.
    pub fn resolve_all<S: AsRef<str>>(&self, packages: &[S]) -> Vec<ResolutionResult> {
        packages
            .iter()
            .map(|package| self.resolve(package.as_ref()))
            .collect()
    }

    /// Find the changelog URL for one package.
    pub fn resolve(&self, package: &str) -> ResolutionResult {
        tracing::debug!(package, "resolving");
        if let Err(reason) = validate_package_name(package) {
            tracing::debug!(package, "suspicious package name: {reason}");
        }
        self.metadata.begin_resolution(package);

        let mut discovered = Discovered::default();
        for &strategy in &self.config.strategies {
            tracing::debug!(package, %strategy, "trying strategy");
            if let Some(candidate) = self.try_strategy(strategy, package, &mut discovered) {
                tracing::debug!(package, %candidate, "found changelog");
                return ResolutionResult::found(package, candidate.url, strategy.method());
            }
        }

        self.fallback(package, &discovered)
    }

    fn try_strategy(
        &self,
        strategy: Strategy,
        package: &str,
        discovered: &mut Discovered,
    ) -> Option<CandidateUrl> {
        match strategy {
            Strategy::Unpkg => self.try_unpkg(package),
            Strategy::NpmBugs => self.try_npm_bugs(package, discovered),
            Strategy::NpmRepo => self.try_npm_repo(package, discovered),
            Strategy::CodeSearch => self.try_code_search(package, discovered),
        }
    }

    fn try_unpkg(&self, package: &str) -> Option<CandidateUrl> {
        let candidate = CandidateUrl::new(build_unpkg_url(package), Strategy::Unpkg, None);
        self.confirm(candidate)
    }

    /// The bugs URL only identifies the repository, so this can only reach a
    /// changelog at the repository root.
    fn try_npm_bugs(&self, package: &str, discovered: &mut Discovered) -> Option<CandidateUrl> {
        let bugs_url = self.metadata.bugs_url(package)?;
        let parsed = parse_github_url(&bugs_url)
            .map_err(|err| tracing::debug!(package, error = %err, "unusable bugs URL"))
            .ok()?;
        let repo = RepoRef::new(&parsed.owner, &parsed.repo);
        discovered.remember(&repo);
        self.probe_branches(&repo, Strategy::NpmBugs)
    }

    fn try_npm_repo(&self, package: &str, discovered: &mut Discovered) -> Option<CandidateUrl> {
        let repo = self.metadata.repo_ref(package)?;
        discovered.prefer(&repo);
        self.probe_branches(&repo, Strategy::NpmRepo)
    }

    fn try_code_search(&self, package: &str, discovered: &mut Discovered) -> Option<CandidateUrl> {
        let from_field = self.metadata.repository_field(package).and_then(|raw| {
            parse_repository_field(&raw)
                .map_err(|err| tracing::debug!(package, error = %err, "unusable repository field"))
                .ok()
        });
        if let Some(repo) = &from_field {
            discovered.remember(repo);
        }
        let repo = from_field.or_else(|| discovered.repo.clone())?;

        let path = self.search.search_changelog_path(&repo.owner, &repo.repo)?;
        let branch = self.config.code_search_branch.as_str();
        let url = build_raw_github_file_url(&repo.owner, &repo.repo, branch, &path);
        self.confirm(CandidateUrl::new(url, Strategy::CodeSearch, Some(branch)))
    }

    fn probe_branches(&self, repo: &RepoRef, strategy: Strategy) -> Option<CandidateUrl> {
        self.config.branches.iter().find_map(|branch| {
            let url = build_raw_github_url(&repo.owner, &repo.repo, &repo.subpath, branch);
            self.confirm(CandidateUrl::new(url, strategy, Some(branch)))
        })
    }

    fn confirm(&self, candidate: CandidateUrl) -> Option<CandidateUrl> {
        tracing::debug!(%candidate, "probing candidate");
        self.prober.exists(&candidate.url).then_some(candidate)
    }

    fn fallback(&self, package: &str, discovered: &Discovered) -> ResolutionResult {
        let Some(repo) = &discovered.repo else {
            tracing::debug!(package, "no repository known; giving up");
            return ResolutionResult::not_found(package);
        };
        let Some(versions) = self.metadata.outdated_versions(package) else {
            tracing::debug!(package, "no version span for a compare URL");
            return ResolutionResult::not_found(package);
        };

        let url = self.compare_url(repo, &versions);
        tracing::debug!(package, %url, "falling back to compare URL");
        ResolutionResult::found(package, url, Method::CompareFallback)
    }

    /// First compare URL whose tag prefix checks out, or the unprefixed one
    /// when none can be confirmed.
    fn compare_url(&self, repo: &RepoRef, versions: &VersionSpan) -> String {
        let build = |prefix: &str| {
            build_compare_url(
                &repo.owner,
                &repo.repo,
                &format!("{prefix}{}", versions.current),
                &format!("{prefix}{}", versions.latest),
            )
        };

        self.config
            .tag_prefixes
            .iter()
            .map(|prefix| build(prefix.as_str()))
            .find(|url| self.prober.exists(url))
            .unwrap_or_else(|| build(""))
    }
}

/// Check `name` against npm's naming rules.
///
/// Returns a short reason when the name cannot be a published package.
pub fn validate_package_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > 214 {
        return Err("name is longer than 214 characters".to_string());
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("name contains whitespace".to_string());
    }

    let bare = match name.strip_prefix('@') {
        Some(scoped) => {
            let (scope, bare) = scoped
                .split_once('/')
                .ok_or_else(|| "scoped name must look like @scope/name".to_string())?;
            if scope.is_empty() || bare.is_empty() || bare.contains('/') {
                return Err("scoped name must look like @scope/name".to_string());
            }
            bare
        }
        None => {
            if name.contains('/') {
                return Err("unscoped name contains '/'".to_string());
            }
            name
        }
    };

    if bare.starts_with('.') || bare.starts_with('_') {
        return Err("name starts with '.' or '_'".to_string());
    }
    Ok(())
}
