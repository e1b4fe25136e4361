//! Main workflow orchestration logic
//!
//! This module contains the release workflow that main.rs drives. It
//! provides a clean separation between CLI argument parsing and business
//! logic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::analyzer::AnalyzedCommit;
use crate::config::{self, Config};
use crate::domain::{BumpOverride, Version};
use crate::error::ReleaseError;
use crate::git::Repository;
use crate::runner::Runner;
use crate::ui;

/// Arguments for the release workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
/// This decoupling allows the workflow to be called programmatically
/// without depending on clap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    /// Preview mode - don't create tags or push
    pub dry_run: bool,

    /// Analyze every declared release scope
    pub all: bool,

    pub bump: Option<BumpOverride>,

    pub ci: bool,

    pub scope: Option<String>,

    pub template: Option<String>,

    /// Main-branch candidates. Replaces the configured ones when given.
    pub branches: Vec<String>,

    pub release_scopes: Vec<String>,

    pub allowed_scopes: Vec<String>,

    pub allowed_types: Vec<String>,

    /// Policy names. Replaces the configured ones when given.
    pub policies: Vec<String>,

    /// Disable every commit policy
    pub no_policy: bool,

    /// Raw commit messages to check instead of releasing; `-` reads stdin
    pub check_commits: Vec<String>,

    /// Check the commits since the latest release instead of releasing
    pub check: bool,

    /// Skip confirmation prompts
    pub assume_yes: bool,

    /// Print bare tag names only
    pub quiet: bool,

    /// Release candidate label
    pub rc: Option<String>,
}

impl WorkflowArgs {
    /// Whether this run only checks commits
    pub fn is_check(&self) -> bool {
        self.check || !self.check_commits.is_empty()
    }
}

/// Result of a successful release workflow
#[derive(Debug, Clone, Default)]
pub struct WorkflowResult {
    /// The proposed versions, in analysis order
    pub versions: Vec<Version>,

    /// Tag names rendered for `versions`
    pub tags: Vec<String>,

    /// Whether the tags were created (false for dry runs and declined prompts)
    pub created: bool,

    /// Whether the tags were pushed to remote
    pub pushed: bool,
}

/// Build the effective configuration: file, then environment, then flags.
pub fn build_config(args: &WorkflowArgs) -> Result<Config> {
    let mut config = config::load_config(args.config_path.as_deref())
        .context("Failed to load configuration")?;
    config.apply_env();
    apply_args(&mut config, args);
    debug!(?config, "effective configuration");
    Ok(config)
}

/// Overlay command-line flags on a loaded configuration
pub fn apply_args(config: &mut Config, args: &WorkflowArgs) {
    let behavior = &mut config.behavior;
    behavior.dry_run |= args.dry_run;
    behavior.ci |= args.ci;
    behavior.all = args.all;
    behavior.assume_yes = args.assume_yes;
    if args.bump.is_some() {
        behavior.bump = args.bump;
    }
    if let Some(scope) = &args.scope {
        behavior.scope = scope.clone();
    }

    if let Some(template) = &args.template {
        config.tag_template = template.clone();
    }
    replace_if_given(&mut config.branches, &args.branches);
    replace_if_given(&mut config.release_scopes, &args.release_scopes);
    replace_if_given(&mut config.allowed_scopes, &args.allowed_scopes);
    replace_if_given(&mut config.allowed_types, &args.allowed_types);
    replace_if_given(&mut config.policies, &args.policies);
    if args.no_policy {
        config.policies.clear();
    }
}

fn replace_if_given(target: &mut Vec<String>, given: &[String]) {
    if !given.is_empty() {
        *target = given.to_vec();
    }
}

/// Commit checking workflow
///
/// Checks the given raw messages, or with `--check` every commit of the
/// requested scope since its latest release. Failures are printed grouped
/// per commit before the error is returned.
pub fn run_check_workflow<R: Repository>(
    runner: &Runner<R>,
    args: &WorkflowArgs,
    cancel: &CancellationToken,
) -> Result<Vec<AnalyzedCommit>> {
    let checked = if args.check {
        runner.check_commits_from_git(cancel, &runner.config().behavior.scope)
    } else {
        let messages = ui::read_check_messages(&args.check_commits)?;
        runner.check_commits(&messages)
    };

    match checked {
        Ok(commits) => {
            if !args.quiet {
                ui::display_commit_summary(&commits);
                ui::display_success("OK");
            }
            Ok(commits)
        }
        Err(ReleaseError::Check(failure)) => {
            ui::display_check_failure(&failure);
            Err(ReleaseError::Check(failure).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Main release workflow
///
/// Orchestrates the entire tagging process:
/// 1. Check the current branch is the main branch
/// 2. Analyze commits and determine the next versions
/// 3. Print the proposed tags
/// 4. Confirm, unless in CI, `--yes` or a dry run
/// 5. Create the tags
/// 6. Push them in CI
///
/// # Arguments
///
/// * `runner` - Runner over the configured repository
/// * `args` - Workflow arguments (rc label, quiet)
/// * `cancel` - Cancels in-flight repository work
/// * `confirm` - Asks the user before tagging
///
/// # Returns
///
/// Result containing the proposed versions and what was done with them
pub fn run_release_workflow<R, F>(
    runner: &Runner<R>,
    args: &WorkflowArgs,
    cancel: &CancellationToken,
    confirm: F,
) -> Result<WorkflowResult>
where
    R: Repository,
    F: FnOnce(&str) -> Result<bool>,
{
    let behavior = &runner.config().behavior;

    runner.check_branch(cancel)?;
    let versions = runner.analyze(cancel, args.rc.as_deref())?;
    debug!(count = versions.len(), "will tag");

    let proposed: Vec<(Version, String)> = versions
        .iter()
        .map(|v| (v.clone(), runner.render_tag(v)))
        .collect();
    ui::display_proposed_tags(&proposed, args.quiet);

    let mut result = WorkflowResult {
        tags: proposed.into_iter().map(|(_, tag)| tag).collect(),
        versions,
        ..WorkflowResult::default()
    };
    if result.versions.is_empty() {
        return Ok(result);
    }

    let interactive = !behavior.ci && !behavior.assume_yes && !behavior.dry_run;
    if interactive && !confirm("Create these tags?")? {
        info!("tagging declined");
        return Ok(result);
    }

    runner.create_tags(cancel, &result.versions)?;
    result.created = !behavior.dry_run;

    if behavior.ci {
        if !args.quiet {
            ui::display_status("Pushing tags in CI mode...");
        }
        runner.push_tags(cancel)?;
        result.pushed = !behavior.dry_run;
    }
    Ok(result)
}
