//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Styling goes through `console`, which drops colors when the stream is not a terminal.

use console::style;

use crate::analyzer::{AnalyzedCommit, Summary};
use crate::domain::Version;
use crate::error::ReleaseError;
use crate::runner::CheckFailure;

/// Format and print an error message in red, with its hint if it has one.
pub fn display_error(error: &ReleaseError) {
    eprintln!("{} {}", style("ERROR:").red().bold(), error);
    if let Some(hint) = error.hint() {
        eprintln!("  {}", style(hint).dim());
    }
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// One line per proposed release: `-> <short commit>:<tag>`
pub fn format_proposed_tag(version: &Version, tag: &str) -> String {
    format!("-> {}:{}", version.short_commit(), tag)
}

/// Display the proposed tags.
///
/// In quiet mode only the bare tag names are printed, for scripting.
pub fn display_proposed_tags(proposed: &[(Version, String)], quiet: bool) {
    for (version, tag) in proposed {
        if quiet {
            println!("{}", tag);
        } else {
            println!("{}", style(format_proposed_tag(version, tag)).bold());
        }
    }
}

/// Display the classification of checked commits
pub fn display_commit_summary(commits: &[AnalyzedCommit]) {
    print!("{}", Summary(commits));
}

/// Display every failure of a commit check, grouped per commit
pub fn display_check_failure(failure: &CheckFailure) {
    for group in failure.by_commit() {
        println!("{}", style(&group[0].commit_title).bold());
        for entry in group {
            println!("  {}", style(&entry.message).red());
        }
    }
}
