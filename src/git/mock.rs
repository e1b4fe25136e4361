use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use crate::git::{ensure_active, PushOptions, Repository, TagOptions};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A tag created through [MockRepository::create_tag]
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTag {
    pub commit: String,
    pub name: String,
    pub opts: TagOptions,
}

/// A push made through [MockRepository::push]
#[derive(Debug, Clone, PartialEq)]
pub struct PushedRef {
    pub upstream: String,
    pub refname: String,
    pub opts: PushOptions,
}

/// Mock repository for testing without actual git operations.
///
/// Commits are registered per range expression, so a test also pins down
/// which range the caller asks for. Created tags become visible to later
/// tag reads.
pub struct MockRepository {
    tags: Mutex<Vec<String>>,
    commits: HashMap<String, Vec<Commit>>,
    branches: Vec<String>,
    remote_head: Option<String>,
    current_branch: String,
    current_commit: String,
    on_main: bool,
    tag_queries: Mutex<Vec<String>>,
    created: Mutex<Vec<CreatedTag>>,
    pushed: Mutex<Vec<PushedRef>>,
}

impl MockRepository {
    /// Create a new empty mock repository, checked out on `main`
    pub fn new() -> Self {
        MockRepository {
            tags: Mutex::new(Vec::new()),
            commits: HashMap::new(),
            branches: vec!["main".to_string()],
            remote_head: Some("main".to_string()),
            current_branch: "main".to_string(),
            current_commit: "0000000000000000000000000000000000000000".to_string(),
            on_main: true,
            tag_queries: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock_tags().extend(tags.into_iter().map(Into::into));
        self
    }

    /// Commits returned for `range`
    pub fn with_commits(mut self, range: impl Into<String>, commits: Vec<Commit>) -> Self {
        self.commits.insert(range.into(), commits);
        self
    }

    /// Local branches, the first being what `origin/HEAD` points at
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self.remote_head = self.branches.first().cloned();
        self
    }

    pub fn without_remote(mut self) -> Self {
        self.remote_head = None;
        self
    }

    pub fn with_current_branch(mut self, branch: impl Into<String>) -> Self {
        self.current_branch = branch.into();
        self
    }

    pub fn with_current_commit(mut self, commit: impl Into<String>) -> Self {
        self.current_commit = commit.into();
        self
    }

    /// Make `branch_contains` report the current commit as off every branch
    pub fn off_main(mut self) -> Self {
        self.on_main = false;
        self
    }

    /// Every pattern passed to `read_tags`, in call order
    pub fn tag_queries(&self) -> Vec<String> {
        self.tag_queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn created_tags(&self) -> Vec<CreatedTag> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn pushes(&self) -> Vec<PushedRef> {
        self.pushed.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn lock_tags(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.tags.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn read_tags(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<String>> {
        ensure_active(cancel)?;
        if let Ok(mut queries) = self.tag_queries.lock() {
            queries.push(pattern.to_string());
        }

        let glob = glob::Pattern::new(if pattern.is_empty() { "*" } else { pattern })
            .map_err(|e| ReleaseError::template(format!("invalid tag pattern '{}': {}", pattern, e)))?;
        Ok(self
            .lock_tags()
            .iter()
            .filter(|t| glob.matches(t))
            .cloned()
            .collect())
    }

    fn read_commits(&self, cancel: &CancellationToken, range: &str) -> Result<Vec<Commit>> {
        ensure_active(cancel)?;
        Ok(self.commits.get(range).cloned().unwrap_or_default())
    }

    fn get_main_branch(&self, cancel: &CancellationToken, candidates: &[String]) -> Result<String> {
        ensure_active(cancel)?;
        if candidates.is_empty() {
            return self
                .remote_head
                .clone()
                .ok_or_else(|| ReleaseError::remote("Cannot resolve the remote HEAD of origin"));
        }
        candidates
            .iter()
            .find(|c| self.branches.contains(c))
            .cloned()
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "no matching release branch of candidates: {:?}",
                    candidates
                ))
            })
    }

    fn current_branch(&self, cancel: &CancellationToken) -> Result<String> {
        ensure_active(cancel)?;
        Ok(self.current_branch.clone())
    }

    fn current_commit(&self, cancel: &CancellationToken) -> Result<String> {
        ensure_active(cancel)?;
        Ok(self.current_commit.clone())
    }

    fn branch_contains(&self, cancel: &CancellationToken, _commit: &str, branch: &str) -> Result<bool> {
        ensure_active(cancel)?;
        Ok(self.on_main && self.branches.iter().any(|b| b == branch))
    }

    fn create_tag(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        name: &str,
        opts: &TagOptions,
    ) -> Result<()> {
        ensure_active(cancel)?;
        let mut tags = self.lock_tags();
        if tags.iter().any(|t| t == name) {
            return Err(git2::Error::from_str(&format!("tag '{}' already exists", name)).into());
        }
        tags.push(name.to_string());

        if let Ok(mut created) = self.created.lock() {
            created.push(CreatedTag {
                commit: commit.to_string(),
                name: name.to_string(),
                opts: opts.clone(),
            });
        }
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
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(PushedRef {
                upstream: upstream.to_string(),
                refname: refname.to_string(),
                opts: *opts,
            });
        }
        Ok(())
    }
}
