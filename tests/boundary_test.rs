use trunk_release::boundary::BoundaryWarning;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_no_release_tags_display() {
    let warning = BoundaryWarning::NoReleaseTags {
        scope: "api".to_string(),
        initial_tag: "api/v0.1.0".to_string(),
    };

    let display_msg = warning.to_string();
    assert_eq!(
        display_msg,
        "[api] No release tags found. To create one: git tag -a api/v0.1.0 -m \"initial tag\""
    );
}

#[test]
fn test_boundary_warning_root_has_no_scope_prefix() {
    let warning = BoundaryWarning::NoNewCommits {
        scope: String::new(),
        latest_tag: "v1.0.0".to_string(),
    };
    assert_eq!(warning.to_string(), "No releasable commits since tag 'v1.0.0'");
}

#[test]
fn test_boundary_warning_invalid_tag_display() {
    let warning = BoundaryWarning::InvalidTag {
        tag: "v01.0.0".to_string(),
        reason: "no semantic version found".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("v01.0.0"),
        "Message should contain the tag, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("no semantic version found"),
        "Message should contain the reason, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_rc_mismatch_display() {
    let warning = BoundaryWarning::RcLabelMismatch {
        tag: "v1.1.0-beta.2".to_string(),
        rc: "rc".to_string(),
    };
    assert_eq!(warning.to_string(), "tag doesn't match rc 'rc', skipping: 'v1.1.0-beta.2'");
}

#[test]
fn test_boundary_warning_wrong_branch_shortens_commit() {
    let warning = BoundaryWarning::WrongBranch {
        commit: "abc1234def5678abc1234def5678".to_string(),
        branch: "main".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("abc1234d "),
        "Message should contain shortened commit hash, got: {}",
        display_msg
    );
    assert!(!display_msg.contains("abc1234def5678abc"));
    assert!(display_msg.contains("'main'"));
}
