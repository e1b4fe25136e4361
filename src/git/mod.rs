//! Version control abstraction layer
//!
//! The analyzer and runner never talk to git directly. They go through the
//! [Repository] trait, which has two implementations:
//!
//! - [repository::Git2Repository]: a real repository, backed by the `git2` crate
//! - [mock::MockRepository]: canned tags and commits for tests
//!
//! Every call takes a [CancellationToken]. Implementations check it before
//! doing any work and fail with [ReleaseError::Cancelled] once it has fired.
//!
//! ```rust
//! # use trunk_release::git::Repository;
//! # use tokio_util::sync::CancellationToken;
//! # fn example<R: Repository>(repo: &R) -> trunk_release::Result<()> {
//! let cancel = CancellationToken::new();
//! let tags = repo.read_tags(&cancel, "v*")?;
//! let commits = repo.read_commits(&cancel, "v0.1.0..HEAD")?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use tokio_util::sync::CancellationToken;

/// Options for creating an annotated tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagOptions {
    /// Tag message. The tag name is used when empty.
    pub message: String,
    /// Tagger name. The repository's configured identity is used when empty.
    pub author: String,
    pub author_email: String,
}

/// Options for pushing a ref
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PushOptions {
    /// Push every tag
    pub tags: bool,
    /// Push the tags created alongside the ref
    pub follow_tags: bool,
}

/// Version control operations needed to analyze and tag releases
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so scopes could be analyzed from
/// several threads.
pub trait Repository: Send + Sync {
    /// Tag names matching a glob pattern (`*` wildcard)
    ///
    /// # Arguments
    /// * `pattern` - e.g. `v*` or `api/v1.2.0-rc.*`
    fn read_tags(&self, cancel: &CancellationToken, pattern: &str) -> Result<Vec<String>>;

    /// Commits in a range expression such as `v0.1.0..HEAD`
    ///
    /// # Returns
    /// * `Ok(Vec<Commit>)` - Commits reachable from the right side but not the left, newest first
    /// * `Err` - If a side of the range cannot be resolved
    fn read_commits(&self, cancel: &CancellationToken, range: &str) -> Result<Vec<Commit>>;

    /// The first existing branch among `candidates`. With no candidates, the
    /// branch the `origin` remote's HEAD points at.
    fn get_main_branch(&self, cancel: &CancellationToken, candidates: &[String]) -> Result<String>;

    /// Name of the checked out branch, empty when HEAD is detached
    fn current_branch(&self, cancel: &CancellationToken) -> Result<String>;

    /// Full id of the HEAD commit
    fn current_commit(&self, cancel: &CancellationToken) -> Result<String>;

    /// Whether `commit` is reachable from the tip of `branch`
    fn branch_contains(&self, cancel: &CancellationToken, commit: &str, branch: &str) -> Result<bool>;

    /// Create an annotated tag `name` at `commit` (HEAD when empty)
    fn create_tag(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        name: &str,
        opts: &TagOptions,
    ) -> Result<()>;

    /// Push `refname` to `upstream` (`origin` when empty)
    fn push(
        &self,
        cancel: &CancellationToken,
        upstream: &str,
        refname: &str,
        opts: &PushOptions,
    ) -> Result<()>;
}

/// Fail with [ReleaseError::Cancelled] once `cancel` has fired
pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ReleaseError::Cancelled);
    }
    Ok(())
}

/// Split a raw commit message into subject and body.
///
/// The subject is the first line; the body is everything after the blank
/// line that follows it, without trailing whitespace.
pub fn split_message(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((subject, rest)) => (
            subject.trim_end().to_string(),
            rest.trim_start_matches(['\r', '\n']).trim_end().to_string(),
        ),
        None => (message.trim_end().to_string(), String::new()),
    }
}
