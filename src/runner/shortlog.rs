use crate::domain::Version;
use std::fmt::Write;

/// Annotated tag message listing the commits of a release.
///
/// ```text
/// api: v1.2.0
///
/// This release contains the following commits:
///
/// * feat(api): add pagination (0123abcd)
/// ```
pub fn shortlog(version: &Version) -> String {
    let title = if version.is_root() { "release" } else { version.scope.as_str() };
    let mut out = format!(
        "{}: v{}\n\nThis release contains the following commits:\n",
        title, version.semver
    );
    for ac in &version.commits {
        let _ = write!(out, "\n* {} ({})\n", ac.commit.subject, ac.commit.short_id());
    }
    out
}
