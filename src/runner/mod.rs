//! Release runner: everything around the analysis that touches the
//! repository, i.e. branch checks, tag creation and pushing.

pub mod check;
pub mod shortlog;

pub use check::{CheckFailure, CommitChecker, FailureEntry};
pub use shortlog::shortlog;

use crate::analyzer::{AnalyzedCommit, Analyzer};
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::{TagTemplate, Version};
use crate::error::{ReleaseError, Result};
use crate::git::{PushOptions, Repository, TagOptions};
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Remote that release tags are pushed to
pub const UPSTREAM: &str = "origin";

pub struct Runner<R: Repository> {
    config: Config,
    repo: R,
    template: TagTemplate,
    main_branch: OnceLock<String>,
}

impl<R: Repository> Runner<R> {
    pub fn new(config: Config, repo: R) -> Result<Self> {
        config.validate()?;
        let template = config.tag_template()?;
        Ok(Runner {
            config,
            repo,
            template,
            main_branch: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn analyzer(&self) -> Result<Analyzer<'_, R>> {
        Analyzer::new(&self.config, &self.repo)
    }

    /// The main branch, resolved once per runner
    pub fn main_branch(&self, cancel: &CancellationToken) -> Result<String> {
        if let Some(branch) = self.main_branch.get() {
            return Ok(branch.clone());
        }
        let branch = self.analyzer()?.main_branch(cancel)?;
        Ok(self.main_branch.get_or_init(|| branch).clone())
    }

    /// Outside dry runs, the checked out branch must be the main branch
    pub fn check_branch(&self, cancel: &CancellationToken) -> Result<()> {
        let main_branch = self.main_branch(cancel)?;
        let current = self.repo.current_branch(cancel)?;
        if current == main_branch {
            return Ok(());
        }

        let commit = self.repo.current_commit(cancel)?;
        if self.config.behavior.dry_run {
            BoundaryWarning::WrongBranch {
                commit,
                branch: main_branch,
            }
            .emit();
            return Ok(());
        }
        Err(ReleaseError::WrongBranch {
            commit: crate::domain::commit::short_id(&commit).to_string(),
            branch: main_branch,
        })
    }

    /// Next version of every scope under analysis
    pub fn analyze(&self, cancel: &CancellationToken, rc: Option<&str>) -> Result<Vec<Version>> {
        self.analyzer()?.analyze(cancel, rc)
    }

    pub fn render_tag(&self, version: &Version) -> String {
        self.template.render_tag(&version.semver, &version.scope)
    }

    /// Create an annotated tag for each version at its anchor commit.
    /// Dry runs only log what would be created.
    ///
    /// # Returns
    /// The tag names, in version order
    pub fn create_tags(&self, cancel: &CancellationToken, versions: &[Version]) -> Result<Vec<String>> {
        let mut tags = Vec::with_capacity(versions.len());
        for version in versions {
            let tag = self.render_tag(version);
            let opts = TagOptions {
                message: shortlog(version),
                ..TagOptions::default()
            };

            if self.config.behavior.dry_run {
                info!(tag = %tag, commit = version.short_commit(), "would create tag (dry run)");
            } else {
                info!(tag = %tag, commit = version.short_commit(), "creating tag");
                self.repo.create_tag(cancel, &version.commit, &tag, &opts)?;
            }
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Push the main branch along with the tags just created
    pub fn push_tags(&self, cancel: &CancellationToken) -> Result<()> {
        let main_branch = self.main_branch(cancel)?;
        if self.config.behavior.dry_run {
            info!(upstream = UPSTREAM, branch = %main_branch, "would push (dry run)");
            return Ok(());
        }
        let opts = PushOptions {
            follow_tags: true,
            ..PushOptions::default()
        };
        self.repo.push(cancel, UPSTREAM, &main_branch, &opts)
    }

    /// Check raw commit messages
    pub fn check_commits<S: AsRef<str>>(&self, messages: &[S]) -> Result<Vec<AnalyzedCommit>> {
        CommitChecker::new(&self.config)?.check_messages(messages)
    }

    /// Check every commit of `scope` since its latest release. Being off the
    /// main branch is not an error here.
    pub fn check_commits_from_git(
        &self,
        cancel: &CancellationToken,
        scope: &str,
    ) -> Result<Vec<AnalyzedCommit>> {
        if let Err(e) = self.check_branch(cancel) {
            if !e.is_wrong_branch() {
                return Err(e);
            }
        }
        let analyzer = self.analyzer()?;
        let checker = CommitChecker::new(&self.config)?;
        check::check_commits_from_git(&analyzer, &checker, cancel, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Commit, SemVer};
    use crate::git::MockRepository;

    fn runner(repo: MockRepository, configure: impl FnOnce(&mut Config)) -> Runner<MockRepository> {
        let mut config = Config::default();
        configure(&mut config);
        Runner::new(config, repo).unwrap()
    }

    #[test]
    fn test_check_branch() {
        let cancel = CancellationToken::new();

        let on_main = runner(MockRepository::new(), |_| {});
        assert!(on_main.check_branch(&cancel).is_ok());

        let off_main = runner(MockRepository::new().with_current_branch("feature"), |_| {});
        assert!(off_main.check_branch(&cancel).unwrap_err().is_wrong_branch());

        let dry = runner(MockRepository::new().with_current_branch("feature"), |c| {
            c.behavior.dry_run = true
        });
        assert!(dry.check_branch(&cancel).is_ok());
    }

    #[test]
    fn test_create_tags() {
        let cancel = CancellationToken::new();
        let r = runner(MockRepository::new(), |_| {});
        let versions = vec![
            Version::new(SemVer::new(0, 1, 1), "", "1111111111"),
            Version::new(SemVer::new(2, 0, 0), "api", "2222222222"),
        ];

        let tags = r.create_tags(&cancel, &versions).unwrap();
        assert_eq!(tags, vec!["v0.1.1", "api/v2.0.0"]);

        let created = r.repo().created_tags();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].commit, "2222222222");
        assert!(created[1].opts.message.starts_with("api: v2.0.0\n"));
    }

    #[test]
    fn test_create_tags_dry_run() {
        let cancel = CancellationToken::new();
        let r = runner(MockRepository::new(), |c| c.behavior.dry_run = true);
        let versions = vec![Version::new(SemVer::new(0, 1, 1), "", "1111111111")];

        assert_eq!(r.create_tags(&cancel, &versions).unwrap(), vec!["v0.1.1"]);
        assert!(r.repo().created_tags().is_empty());

        r.push_tags(&cancel).unwrap();
        assert!(r.repo().pushes().is_empty());
    }

    #[test]
    fn test_push_tags_follows_tags() {
        let cancel = CancellationToken::new();
        let r = runner(MockRepository::new(), |_| {});
        r.push_tags(&cancel).unwrap();

        let pushes = r.repo().pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].upstream, "origin");
        assert_eq!(pushes[0].refname, "main");
        assert!(pushes[0].opts.follow_tags);
    }

    #[test]
    fn test_check_commits_from_git_off_main() {
        let cancel = CancellationToken::new();
        let repo = MockRepository::new()
            .with_current_branch("feature")
            .with_tags(["v0.1.0"])
            .with_commits("v0.1.0..HEAD", vec![Commit::new("1234567890", "fix: a")]);
        let r = runner(repo, |_| {});

        let acs = r.check_commits_from_git(&cancel, "").unwrap();
        assert_eq!(acs.len(), 1);
    }
}
