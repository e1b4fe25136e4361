use chrono::{DateTime, FixedOffset};

/// A commit as read from the version control collaborator. Never mutated
/// by the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Commit {
    pub id: String,
    pub author: String,
    pub author_email: String,
    pub author_date: Option<DateTime<FixedOffset>>,
    pub committer: String,
    pub committer_email: String,
    pub committer_date: Option<DateTime<FixedOffset>>,
    pub subject: String,
    pub body: String,
}

impl Commit {
    /// Create a commit with only an id and a subject
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Commit {
            id: id.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_committer_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.committer_date = Some(date);
        self
    }

    /// First 8 characters of the commit id
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Parse a raw commit message, as written by `git commit`.
    ///
    /// The first line is the subject. The body starts at the third line;
    /// `#` comment lines are dropped.
    pub fn from_message(message: &str) -> Self {
        let lines: Vec<&str> = message.split('\n').collect();
        if lines.len() < 2 {
            return Commit::new("", message);
        }

        let body = lines[2.min(lines.len())..]
            .iter()
            .filter(|line| !line.starts_with('#'))
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        Commit::new("", lines[0]).with_body(body)
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// A named block extracted from a commit body, e.g. `BREAKING CHANGE: ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyAnnotation {
    pub name: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let commit = Commit::new("deadbeefdeadbeef", "x");
        assert_eq!(commit.short_id(), "deadbeef");

        let short = Commit::new("abc", "x");
        assert_eq!(short.short_id(), "abc");
    }

    #[test]
    fn test_from_message_subject_only() {
        let commit = Commit::from_message("fix: a thing");
        assert_eq!(commit.subject, "fix: a thing");
        assert!(commit.body.is_empty());
    }

    #[test]
    fn test_from_message_with_body_and_comments() {
        let raw = "feat: new thing\n\nsome detail\n# Please enter the commit message\nBREAKING CHANGE: gone";
        let commit = Commit::from_message(raw);
        assert_eq!(commit.subject, "feat: new thing");
        assert_eq!(commit.body, "some detail\nBREAKING CHANGE: gone");
    }

    #[test]
    fn test_from_message_two_lines() {
        let commit = Commit::from_message("fix: x\n");
        assert_eq!(commit.subject, "fix: x");
        assert_eq!(commit.body, "");
    }
}
