use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use crate::git::{ensure_active, split_message, PushOptions, Repository, TagOptions};
use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{Cred, Oid, PushOptions as Git2PushOptions, RemoteCallbacks, Repository as Git2Repo, Signature};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Environment variables checked, in order, for a token to push with
const TOKEN_VARS: [&str; 3] = ["GIT_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"];

/// Tagger identity when the repository has none configured
const FALLBACK_TAGGER: (&str, &str) = ("trunk-release", "trunk-release@localhost");

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
    /// Tags created through this handle, pushed by `follow_tags`
    created: Mutex<Vec<String>>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
            created: Mutex::new(Vec::new()),
        }
    }

    fn repo(&self) -> Result<MutexGuard<'_, Git2Repo>> {
        self.repo
            .lock()
            .map_err(|_| git2::Error::from_str("repository lock poisoned").into())
    }

    fn resolve_commit(repo: &Git2Repo, spec: &str) -> Result<Oid> {
        let spec = if spec.is_empty() { "HEAD" } else { spec };
        Ok(repo.revparse_single(spec)?.peel_to_commit()?.id())
    }
}

fn to_datetime(time: git2::Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    offset.timestamp_opt(time.seconds(), 0).single()
}

fn to_commit(commit: &git2::Commit<'_>) -> Commit {
    let (subject, body) = split_message(&String::from_utf8_lossy(commit.message_bytes()));
    let author = commit.author();
    let committer = commit.committer();

    Commit {
        id: commit.id().to_string(),
        author: author.name().unwrap_or_default().to_string(),
        author_email: author.email().unwrap_or_default().to_string(),
        author_date: to_datetime(author.when()),
        committer: committer.name().unwrap_or_default().to_string(),
        committer_email: committer.email().unwrap_or_default().to_string(),
        committer_date: to_datetime(committer.when()),
        subject,
        body,
    }
}

impl Repository for Git2Repository {
    fn read_tags(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<String>> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        let pattern = (!pattern.is_empty()).then_some(pattern);
        let tags = repo.tag_names(pattern)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn read_commits(&self, cancel: &CancellationToken, range: &str) -> Result<Vec<Commit>> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        if range.contains("..") {
            revwalk.push_range(range)?;
        } else {
            revwalk.push(Self::resolve_commit(&repo, range)?)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            ensure_active(cancel)?;
            let commit = repo.find_commit(oid?)?;
            commits.push(to_commit(&commit));
        }
        debug!(range, count = commits.len(), "read commits");
        Ok(commits)
    }

    fn get_main_branch(&self, cancel: &CancellationToken, candidates: &[String]) -> Result<String> {
        ensure_active(cancel)?;
        let repo = self.repo()?;

        if candidates.is_empty() {
            let head = repo.find_reference("refs/remotes/origin/HEAD").map_err(|e| {
                ReleaseError::remote(format!("Cannot resolve the remote HEAD of origin: {}", e))
            })?;
            let target = head
                .symbolic_target()
                .ok_or_else(|| ReleaseError::remote("origin/HEAD is not a symbolic reference"))?;
            return Ok(target
                .strip_prefix("refs/remotes/origin/")
                .unwrap_or(target)
                .to_string());
        }

        for candidate in candidates {
            if repo.find_branch(candidate, git2::BranchType::Local).is_ok() {
                return Ok(candidate.clone());
            }
        }
        Err(ReleaseError::config(format!(
            "no matching release branch of candidates: {:?}",
            candidates
        )))
    }

    fn current_branch(&self, cancel: &CancellationToken) -> Result<String> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        let head = repo.head()?;
        if !head.is_branch() {
            return Ok(String::new());
        }
        Ok(head.shorthand().unwrap_or_default().to_string())
    }

    fn current_commit(&self, cancel: &CancellationToken) -> Result<String> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        Ok(Self::resolve_commit(&repo, "HEAD")?.to_string())
    }

    fn branch_contains(&self, cancel: &CancellationToken, commit: &str, branch: &str) -> Result<bool> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        let commit = Self::resolve_commit(&repo, commit)?;
        let tip = repo
            .find_branch(branch, git2::BranchType::Local)?
            .get()
            .peel_to_commit()?
            .id();

        Ok(tip == commit || repo.graph_descendant_of(tip, commit)?)
    }

    fn create_tag(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        name: &str,
        opts: &TagOptions,
    ) -> Result<()> {
        ensure_active(cancel)?;
        let repo = self.repo()?;
        let target = repo.find_object(Self::resolve_commit(&repo, commit)?, None)?;

        let tagger = if opts.author.is_empty() || opts.author_email.is_empty() {
            // CI checkouts usually have no user.name configured
            repo.signature()
                .or_else(|_| Signature::now(FALLBACK_TAGGER.0, FALLBACK_TAGGER.1))?
        } else {
            Signature::now(&opts.author, &opts.author_email)?
        };
        let message = if opts.message.is_empty() { name } else { opts.message.as_str() };

        repo.tag(name, &target, &tagger, message, false)?;
        info!(tag = name, commit = %target.id(), "created tag");

        self.created
            .lock()
            .map_err(|_| git2::Error::from_str("tag list lock poisoned"))?
            .push(name.to_string());
        Ok(())
    }

    fn push(
        &self,
        cancel: &CancellationToken,
        upstream: &str,
        refname: &str,
        opts: &PushOptions,
    ) -> Result<()> {
        ensure_active(cancel)?;
        let upstream = if upstream.is_empty() { "origin" } else { upstream };
        let repo = self.repo()?;
        let mut remote = repo
            .find_remote(upstream)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut refspecs = vec![format!("refs/heads/{0}:refs/heads/{0}", refname)];
        if opts.tags {
            refspecs.push("refs/tags/*:refs/tags/*".to_string());
        } else if opts.follow_tags {
            let created = self
                .created
                .lock()
                .map_err(|_| git2::Error::from_str("tag list lock poisoned"))?;
            refspecs.extend(created.iter().map(|t| format!("refs/tags/{0}:refs/tags/{0}", t)));
        }

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, username, allowed| {
            if let Some(token) = TOKEN_VARS.iter().find_map(|v| std::env::var(v).ok()) {
                return Cred::userpass_plaintext("x-access-token", &token);
            }
            if allowed.contains(git2::CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            Cred::default()
        });
        let mut push_opts = Git2PushOptions::new();
        push_opts.remote_callbacks(callbacks);

        info!(upstream, refspecs = ?refspecs, "pushing");
        remote
            .push(&refspecs, Some(&mut push_opts))
            .map_err(|e| ReleaseError::remote(format!("Push failed: {}", e)))?;
        Ok(())
    }
}
