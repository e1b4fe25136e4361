use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use trunk_release::cli::{self, WorkflowArgs};
use trunk_release::domain::BumpOverride;
use trunk_release::git::Git2Repository;
use trunk_release::runner::Runner;
use trunk_release::{ui, ReleaseError};

#[derive(clap::Parser)]
#[command(
    name = "trunk-release",
    version,
    about = "Create semantic version tags from conventional commits",
    after_help = "EXAMPLES:\n  \
        trunk-release              bump the version, if there are any new commits\n  \
        trunk-release --minor      bump the minor version regardless of the commits\n  \
        trunk-release rc           create the next release candidate, e.g. v1.2.0-rc.1\n  \
        trunk-release -C -         check a commit message read from stdin"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, help = "Operate on the root and every declared release scope")]
    all: bool,

    #[arg(long, group = "bump", help = "Bump the major version")]
    major: bool,

    #[arg(long, group = "bump", help = "Bump the minor version")]
    minor: bool,

    #[arg(long, group = "bump", help = "Bump the patch version")]
    patch: bool,

    #[arg(long, help = "Run in CI mode: never prompt, push created tags")]
    ci: bool,

    #[arg(short, long, help = "Operate on a single scope")]
    scope: Option<String>,

    #[arg(long, help = "Tag template, e.g. \"[{scope}/]v{version}\"")]
    template: Option<String>,

    #[arg(short, long = "branch", help = "Main branch candidate (repeatable)")]
    branches: Vec<String>,

    #[arg(long = "release-scope", help = "Declare a release scope (repeatable)")]
    release_scopes: Vec<String>,

    #[arg(long = "allowed-scope", help = "Allow a commit scope when checking (repeatable)")]
    allowed_scopes: Vec<String>,

    #[arg(long = "allowed-type", help = "Allow a commit type when checking (repeatable)")]
    allowed_types: Vec<String>,

    #[arg(long = "policy", help = "Commit policy, in evaluation order (repeatable)")]
    policies: Vec<String>,

    #[arg(short = 'P', long, help = "Disable all commit policies")]
    no_policy: bool,

    #[arg(
        short = 'C',
        long = "check-commit",
        help = "Only check this commit message; `-` reads stdin (repeatable)"
    )]
    check_commits: Vec<String>,

    #[arg(long, help = "Only check the commits since the latest release")]
    check: bool,

    #[arg(short = 'y', long = "yes", help = "Skip confirmation prompts")]
    assume_yes: bool,

    #[arg(short, long, conflicts_with = "quiet", help = "Print debugging information")]
    verbose: bool,

    #[arg(short, long, help = "Print as little as necessary")]
    quiet: bool,

    #[arg(help = "Release candidate label, e.g. rc")]
    rc: Option<String>,
}

impl Args {
    fn bump(&self) -> Option<BumpOverride> {
        if self.major {
            Some(BumpOverride::Major)
        } else if self.minor {
            Some(BumpOverride::Minor)
        } else if self.patch {
            Some(BumpOverride::Patch)
        } else {
            None
        }
    }

    fn into_workflow_args(self) -> WorkflowArgs {
        WorkflowArgs {
            bump: self.bump(),
            config_path: self.config,
            dry_run: self.dry_run,
            all: self.all,
            ci: self.ci,
            scope: self.scope,
            template: self.template,
            branches: self.branches,
            release_scopes: self.release_scopes,
            allowed_scopes: self.allowed_scopes,
            allowed_types: self.allowed_types,
            policies: self.policies,
            no_policy: self.no_policy,
            check_commits: self.check_commits,
            check: self.check,
            assume_yes: self.assume_yes,
            quiet: self.quiet,
            rc: self.rc,
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flags
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: WorkflowArgs, cancel: &CancellationToken) -> Result<()> {
    let config = cli::build_config(&args)?;
    let repo = Git2Repository::open(".")?;
    let runner = Runner::new(config, repo)?;

    if args.is_check() {
        cli::run_check_workflow(&runner, &args, cancel)?;
        return Ok(());
    }

    let result = cli::run_release_workflow(&runner, &args, cancel, ui::confirm_action)?;
    if result.pushed && !args.quiet {
        ui::display_success(&format!("Pushed {} tag(s)", result.tags.len()));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    let cancel = CancellationToken::new();
    if let Err(e) = run(args.into_workflow_args(), &cancel) {
        match e.downcast_ref::<ReleaseError>() {
            // failures were already listed per commit
            Some(ReleaseError::Check(_)) => {}
            Some(release_error) => ui::display_error(release_error),
            None => eprintln!("{} {:#}", console::style("ERROR:").red().bold(), e),
        }
        std::process::exit(1);
    }
}
