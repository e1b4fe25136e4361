//! Tag templates
//!
//! A template is plain text with two placeholders, `{scope}` and `{version}`.
//! Text wrapped in `[...]` is an optional section, rendered only when every
//! placeholder inside it renders non-empty. The default template
//! `[{scope}/]v{version}` therefore yields `v1.2.3` at the root and
//! `api/v1.2.3` for scope `api`.
//!
//! `{version}` must appear exactly once, outside any optional section, so the
//! semantic version (including its prerelease) is always one contiguous token.

use crate::domain::prerelease::PreRelease;
use crate::domain::version::SemVer;
use crate::error::{ReleaseError, Result};

pub const DEFAULT_TAG_TEMPLATE: &str = "[{scope}/]v{version}";

/// How the version token is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// The actual tag name to create
    Normal,
    /// A `git tag -l` style pattern for searching existing tags
    Glob,
    /// Only the text preceding the version token
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Scope,
    Version,
    Optional(Vec<Segment>),
}

/// Parsed tag template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl Default for TagTemplate {
    fn default() -> Self {
        TagTemplate::parse(DEFAULT_TAG_TEMPLATE).expect("default tag template is valid")
    }
}

impl TagTemplate {
    /// Parse a template, falling back to the default for an empty string
    pub fn parse(template: &str) -> Result<Self> {
        if template.is_empty() {
            return TagTemplate::parse(DEFAULT_TAG_TEMPLATE);
        }

        let mut stack: Vec<Vec<Segment>> = vec![Vec::new()];
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(ReleaseError::template(format!(
                            "unclosed '{{' in '{}'",
                            template
                        )));
                    }
                    flush_literal(&mut literal, &mut stack);
                    let segment = match name.as_str() {
                        "scope" => Segment::Scope,
                        "version" => Segment::Version,
                        other => {
                            return Err(ReleaseError::template(format!(
                                "unknown placeholder '{{{}}}' in '{}'",
                                other, template
                            )))
                        }
                    };
                    push_segment(&mut stack, segment);
                }
                '}' => {
                    return Err(ReleaseError::template(format!(
                        "unmatched '}}' in '{}'",
                        template
                    )))
                }
                '[' => {
                    flush_literal(&mut literal, &mut stack);
                    stack.push(Vec::new());
                }
                ']' => {
                    flush_literal(&mut literal, &mut stack);
                    if stack.len() < 2 {
                        return Err(ReleaseError::template(format!(
                            "unmatched ']' in '{}'",
                            template
                        )));
                    }
                    let inner = stack.pop().unwrap_or_default();
                    push_segment(&mut stack, Segment::Optional(inner));
                }
                other => literal.push(other),
            }
        }
        flush_literal(&mut literal, &mut stack);

        if stack.len() != 1 {
            return Err(ReleaseError::template(format!(
                "unclosed '[' in '{}'",
                template
            )));
        }
        let segments = stack.pop().unwrap_or_default();

        let top_level_versions = segments.iter().filter(|s| **s == Segment::Version).count();
        if top_level_versions != 1 || contains_nested_version(&segments) {
            return Err(ReleaseError::template(format!(
                "'{}' must contain {{version}} exactly once, outside optional sections",
                template
            )));
        }

        Ok(TagTemplate {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render `version` for `scope` in the given mode.
    ///
    /// In glob mode a non-zero version carrying a release candidate renders
    /// as `<core>-<label>.*` (every candidate at exactly that core version);
    /// anything else renders as `*` (any version).
    pub fn render(&self, version: &SemVer, scope: &str, mode: RenderMode) -> String {
        let token = match mode {
            RenderMode::Normal => version.to_string(),
            RenderMode::Prefix => String::new(),
            RenderMode::Glob => match &version.pre {
                PreRelease::Candidate { label, .. } if !version.is_zero() => {
                    format!("{}-{}.*", version.core(), label)
                }
                _ => "*".to_string(),
            },
        };

        let mut out = String::new();
        render_segments(&self.segments, scope, &token, mode == RenderMode::Prefix, &mut out);
        out
    }

    /// The tag name to create for `version` in `scope`
    pub fn render_tag(&self, version: &SemVer, scope: &str) -> String {
        self.render(version, scope, RenderMode::Normal)
    }

    /// Pattern matching every tag of `scope`, or every `rc` candidate tag
    /// when a label is given
    pub fn render_glob(&self, scope: &str, rc: Option<&str>) -> String {
        let any = self.render(&SemVer::default(), scope, RenderMode::Glob);
        match rc {
            Some(label) => any.replacen('*', &format!("*-{}.*", label), 1),
            None => any,
        }
    }

    /// Pattern matching every `rc` candidate tag at exactly `core`
    pub fn render_glob_at(&self, scope: &str, core: &SemVer, rc: &str) -> String {
        let query = core.core().with_pre(PreRelease::Candidate {
            label: rc.to_string(),
            sequence: 0,
        });
        self.render(&query, scope, RenderMode::Glob)
    }

    /// Text preceding the version token for `scope`, e.g. `api/v`
    pub fn prefix(&self, scope: &str) -> String {
        self.render(&SemVer::default(), scope, RenderMode::Prefix)
    }
}

fn flush_literal(literal: &mut String, stack: &mut [Vec<Segment>]) {
    if literal.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn push_segment(stack: &mut [Vec<Segment>], segment: Segment) {
    if let Some(top) = stack.last_mut() {
        top.push(segment);
    }
}

fn contains_nested_version(segments: &[Segment]) -> bool {
    segments.iter().any(|s| match s {
        Segment::Optional(inner) => {
            inner.iter().any(|s| *s == Segment::Version) || contains_nested_version(inner)
        }
        _ => false,
    })
}

/// Returns false once the version token has been reached in prefix mode.
fn render_segments(segments: &[Segment], scope: &str, token: &str, prefix: bool, out: &mut String) -> bool {
    for segment in segments {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Scope => out.push_str(scope),
            Segment::Version => {
                if prefix {
                    return false;
                }
                out.push_str(token);
            }
            Segment::Optional(inner) => {
                if placeholders_present(inner, scope)
                    && !render_segments(inner, scope, token, prefix, out)
                {
                    return false;
                }
            }
        }
    }
    true
}

fn placeholders_present(segments: &[Segment], scope: &str) -> bool {
    segments.iter().all(|s| match s {
        Segment::Scope => !scope.is_empty(),
        Segment::Optional(_) | Segment::Literal(_) | Segment::Version => true,
    })
}
