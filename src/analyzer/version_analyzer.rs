use crate::analyzer::aggregator::aggregate;
use crate::analyzer::classifier::{classify, AnalyzedCommit};
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::{latest_matching, Commit, PreRelease, SemVer, TagTemplate, Version};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::policy::Policy;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Works out the next version of the root and of each release scope
pub struct Analyzer<'a, R: Repository> {
    repo: &'a R,
    config: Config,
    policies: Vec<Arc<Policy>>,
    template: TagTemplate,
    warnings: Mutex<Vec<BoundaryWarning>>,
}

impl<'a, R: Repository> Analyzer<'a, R> {
    /// Create an analyzer, compiling the configured policies and tag template
    pub fn new(config: &Config, repo: &'a R) -> Result<Self> {
        Ok(Analyzer {
            repo,
            config: config.clone(),
            policies: config.resolve_policies()?,
            template: config.tag_template()?,
            warnings: Mutex::new(Vec::new()),
        })
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }

    pub fn template(&self) -> &TagTemplate {
        &self.template
    }

    /// Warnings raised so far, in order
    pub fn warnings(&self) -> Vec<BoundaryWarning> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn warn(&self, warning: BoundaryWarning) {
        warning.emit();
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(warning);
        }
    }

    /// Resolve the main branch.
    ///
    /// When asking the remote fails, the default candidates are tried.
    pub fn main_branch(&self, cancel: &CancellationToken) -> Result<String> {
        let candidates = self.config.main_branch_candidates();
        let branch = match self.repo.get_main_branch(cancel, &candidates) {
            Ok(branch) => branch,
            Err(ReleaseError::Cancelled) => return Err(ReleaseError::Cancelled),
            Err(e) if candidates.is_empty() => {
                let defaults = Config::default_branches();
                info!(error = %e, ?defaults, "Get remote failed, falling back to defaults");
                self.repo.get_main_branch(cancel, &defaults)?
            }
            Err(e) => return Err(e),
        };
        info!(branch = %branch, "main branch resolved");
        Ok(branch)
    }

    /// Verify the current commit is reachable from `main_branch`.
    /// Only a warning during dry runs.
    pub fn check_on_main(&self, cancel: &CancellationToken, main_branch: &str) -> Result<()> {
        let commit = self.repo.current_commit(cancel)?;
        if self.repo.branch_contains(cancel, &commit, main_branch)? {
            return Ok(());
        }
        if self.config.behavior.dry_run {
            self.warn(BoundaryWarning::WrongBranch {
                commit,
                branch: main_branch.to_string(),
            });
            return Ok(());
        }
        Err(ReleaseError::WrongBranch {
            commit: crate::domain::commit::short_id(&commit).to_string(),
            branch: main_branch.to_string(),
        })
    }

    /// Propose the next version for every scope under analysis.
    ///
    /// The root is analyzed unless a single scope was requested; then every
    /// declared release scope with `all`, or the requested one. A scope that
    /// was never tagged aborts the run, except during an `all` sweep where it
    /// is skipped with a warning.
    ///
    /// # Errors
    /// `NoReleasableCommits` when nothing is proposed outside CI
    pub fn analyze(&self, cancel: &CancellationToken, rc: Option<&str>) -> Result<Vec<Version>> {
        if let Some(label) = rc {
            PreRelease::candidate(label, 0)?;
        }

        let main_branch = self.main_branch(cancel)?;
        if !self.config.behavior.ignore_policies {
            self.check_on_main(cancel, &main_branch)?;
        }

        let behavior = &self.config.behavior;
        let mut scopes: Vec<(&str, bool)> = Vec::new();
        if behavior.scope.is_empty() {
            scopes.push(("", true));
        }
        if behavior.all {
            scopes.extend(self.config.release_scopes.iter().map(|s| (s.as_str(), false)));
        } else if !behavior.scope.is_empty() {
            scopes.push((behavior.scope.as_str(), true));
        }

        let mut versions = Vec::new();
        for (scope, required) in scopes {
            match self.analyze_scope(cancel, scope, rc) {
                Ok(Some(version)) => versions.push(version),
                Ok(None) => {}
                Err(e) if e.is_no_release_tags() && !required => {
                    debug!(scope, "skipping scope without release tags");
                }
                Err(e) => return Err(e),
            }
        }

        if versions.is_empty() && !behavior.ci {
            return Err(ReleaseError::NoReleasableCommits);
        }
        Ok(versions)
    }

    /// Propose the next version for one scope, `None` if nothing warrants it
    pub fn analyze_scope(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        rc: Option<&str>,
    ) -> Result<Option<Version>> {
        let latest = self.latest_release(cancel, scope, None)?;
        let commits = self.read_commits_since(cancel, scope, &latest)?;
        let analyzed = self.classify_all(&commits)?;

        let in_scope: Vec<AnalyzedCommit> = analyzed
            .into_iter()
            .filter(|ac| {
                let keep = ac.is_in_scope(scope, &self.config.release_scopes);
                if !keep {
                    debug!(
                        commit = ac.commit.short_id(),
                        scope,
                        commit_scope = %ac.scope,
                        "skipping out of scope commit"
                    );
                }
                keep
            })
            .collect();

        let bump = self.config.behavior.bump;
        let mut version = match aggregate(&latest, in_scope, scope, bump)? {
            Some(version) => version,
            None => match bump {
                Some(_) => Version::new(latest.clone(), scope, self.repo.current_commit(cancel)?),
                None => {
                    self.warn(BoundaryWarning::NoNewCommits {
                        scope: scope.to_string(),
                        latest_tag: self.template.render_tag(&latest, scope),
                    });
                    return Ok(None);
                }
            },
        };

        if let Some(bump) = bump {
            version.semver = latest.bump(bump.release_type())?;
            debug!(scope, version = %version.semver, "applied bump override");
        }

        if let Some(label) = rc {
            let sequence = self.next_rc_number(cancel, scope, &version.semver, label)?;
            version.semver = version
                .semver
                .with_pre(PreRelease::candidate(label, sequence)?);
            version.rc = Some(label.to_string());
        }

        info!(scope, version = %version.semver, commit = version.short_commit(), "next version");
        Ok(Some(version))
    }

    /// Latest released version of `scope`, or its latest `rc` candidate.
    ///
    /// # Errors
    /// `NoReleaseTags` when the scope has no matching tag yet
    pub fn latest_release(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        rc: Option<&str>,
    ) -> Result<SemVer> {
        let tags = self.scope_tags(cancel, scope, &self.template.render_glob(scope, rc))?;
        let (latest, skipped) = latest_matching(tags.iter().map(String::as_str), rc);
        for skipped in skipped {
            self.warn(BoundaryWarning::InvalidTag {
                tag: skipped.tag,
                reason: skipped.reason,
            });
        }

        latest.ok_or_else(|| {
            let initial_tag = self.template.render_tag(&SemVer::new(0, 1, 0), scope);
            self.warn(BoundaryWarning::NoReleaseTags {
                scope: scope.to_string(),
                initial_tag: initial_tag.clone(),
            });
            ReleaseError::NoReleaseTags {
                scope: scope.to_string(),
                initial_tag,
            }
        })
    }

    /// Commits after the tag of `latest`, up to HEAD
    pub fn read_commits_since(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        latest: &SemVer,
    ) -> Result<Vec<Commit>> {
        let range = format!("{}..HEAD", self.template.render_tag(latest, scope));
        debug!(range = %range, "reading commits");
        self.repo.read_commits(cancel, &range)
    }

    /// Classify every commit. Unmatched commits are tolerated only under a
    /// bump override.
    fn classify_all(&self, commits: &[Commit]) -> Result<Vec<AnalyzedCommit>> {
        commits
            .iter()
            .map(|commit| {
                debug!(
                    commit = commit.short_id(),
                    author = %commit.author,
                    subject = %commit.subject,
                    "classifying"
                );
                match classify(commit, &self.policies) {
                    Err(ReleaseError::NoPolicyMatched { .. }) if self.config.behavior.bump.is_some() => {
                        Ok(AnalyzedCommit::unmatched(commit.clone()))
                    }
                    other => other,
                }
            })
            .collect()
    }

    /// Next sequence number for `rc` candidates of `version`'s core version
    fn next_rc_number(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        version: &SemVer,
        rc: &str,
    ) -> Result<u64> {
        let glob = self.template.render_glob_at(scope, version, rc);
        let tags = self.scope_tags(cancel, scope, &glob)?;
        let (next, warnings) = next_rc_sequence(tags.iter().map(String::as_str), rc)?;
        for warning in warnings {
            self.warn(warning);
        }
        Ok(next)
    }

    /// Tags matching `glob` whose version starts right after the scope's
    /// prefix. The root also drops tags carrying a declared scope's prefix,
    /// since tag globs let `*` match `/`.
    fn scope_tags(&self, cancel: &CancellationToken, scope: &str, glob: &str) -> Result<Vec<String>> {
        let prefix = self.template.prefix(scope);
        let foreign: Vec<String> = if scope.is_empty() {
            self.config
                .release_scopes
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| self.template.prefix(s))
                .filter(|p| *p != prefix)
                .collect()
        } else {
            Vec::new()
        };

        let tags = self.repo.read_tags(cancel, glob)?;
        Ok(tags
            .into_iter()
            .filter(|tag| {
                let anchored = tag
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
                anchored && !foreign.iter().any(|p| tag.starts_with(p.as_str()))
            })
            .collect())
    }
}

/// `max + 1` over the sequences of valid `rc` candidate tags, `0` when
/// there are none. Everything else is reported and skipped.
///
/// # Errors
/// `Version` when the highest sequence cannot be incremented
pub fn next_rc_sequence<'a, I>(tags: I, rc: &str) -> Result<(u64, Vec<BoundaryWarning>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut max: Option<u64> = None;
    let mut warnings = Vec::new();

    for tag in tags {
        match SemVer::extract(tag) {
            Ok(Some(SemVer {
                pre: PreRelease::Candidate { label, sequence },
                ..
            })) => {
                if label == rc {
                    max = max.max(Some(sequence));
                } else {
                    warnings.push(BoundaryWarning::RcLabelMismatch {
                        tag: tag.to_string(),
                        rc: rc.to_string(),
                    });
                }
            }
            Ok(_) => warnings.push(BoundaryWarning::InvalidTag {
                tag: tag.to_string(),
                reason: "not a release candidate".to_string(),
            }),
            Err(e) => warnings.push(BoundaryWarning::InvalidTag {
                tag: tag.to_string(),
                reason: match e {
                    ReleaseError::InvalidTagFormat { reason, .. } => reason,
                    other => other.to_string(),
                },
            }),
        }
    }

    let next = match max {
        Some(n) => n.checked_add(1).ok_or_else(|| {
            ReleaseError::version(format!("{} sequence {} cannot be incremented", rc, n))
        })?,
        None => 0,
    };
    Ok((next, warnings))
}
