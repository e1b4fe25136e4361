// tests/analyzer_test.rs
use chrono::{FixedOffset, TimeZone};
use tokio_util::sync::CancellationToken;
use trunk_release::analyzer::Analyzer;
use trunk_release::boundary::BoundaryWarning;
use trunk_release::config::Config;
use trunk_release::domain::{BumpOverride, Commit, SemVer};
use trunk_release::git::MockRepository;
use trunk_release::ReleaseError;

fn analyze(repo: &MockRepository, config: &Config, rc: Option<&str>) -> trunk_release::Result<Vec<String>> {
    let analyzer = Analyzer::new(config, repo)?;
    let versions = analyzer.analyze(&CancellationToken::new(), rc)?;
    Ok(versions
        .iter()
        .map(|v| analyzer.template().render_tag(&v.semver, &v.scope))
        .collect())
}

fn root_repo(commits: Vec<Commit>) -> MockRepository {
    MockRepository::new()
        .with_tags(["v0.1.0"])
        .with_commits("v0.1.0..HEAD", commits)
}

fn committed_at(id: &str, subject: &str, secs: i64) -> Commit {
    let offset = FixedOffset::east_opt(0).unwrap();
    Commit::new(id, subject).with_committer_date(offset.timestamp_opt(secs, 0).unwrap())
}

#[test]
fn test_fix_bumps_patch() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix: cool fix")]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v0.1.1"]);
}

#[test]
fn test_feat_bumps_minor() {
    let repo = root_repo(vec![Commit::new("1111111111", "feat: cool feature")]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v0.2.0"]);
}

#[test]
fn test_breaking_annotation_bumps_major() {
    let repo = root_repo(vec![
        Commit::new("1111111111", "feat: x").with_body("BREAKING CHANGE: y")
    ]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v1.0.0"]);
}

#[test]
fn test_breaking_bang_bumps_major() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix!: drop old flag")]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v1.0.0"]);
}

#[test]
fn test_highest_release_type_wins() {
    let repo = root_repo(vec![
        Commit::new("1111111111", "docs: readme"),
        Commit::new("2222222222", "feat: new endpoint"),
        Commit::new("3333333333", "fix: typo"),
    ]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v0.2.0"]);
}

#[test]
fn test_next_release_candidate() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "v0.1.1-rc.0", "v0.1.1-rc.1"])
        .with_commits("v0.1.0..HEAD", vec![Commit::new("1111111111", "fix: z")]);
    assert_eq!(
        analyze(&repo, &Config::default(), Some("rc")).unwrap(),
        vec!["v0.1.1-rc.2"]
    );
}

#[test]
fn test_first_release_candidate() {
    let repo = root_repo(vec![Commit::new("1111111111", "feat: z")]);
    assert_eq!(
        analyze(&repo, &Config::default(), Some("beta")).unwrap(),
        vec!["v0.2.0-beta.0"]
    );
}

#[test]
fn test_skip_only_batch_is_not_released() {
    let repo = root_repo(vec![Commit::new("1111111111", "chore: cleanup")]);
    let err = analyze(&repo, &Config::default(), None).unwrap_err();
    assert!(matches!(err, ReleaseError::NoReleasableCommits));

    let mut config = Config::default();
    config.behavior.ci = true;
    assert!(analyze(&repo, &config, None).unwrap().is_empty());
}

#[test]
fn test_no_new_commits_warning() {
    let repo = MockRepository::new().with_tags(["v0.1.0"]);
    let mut config = Config::default();
    config.behavior.ci = true;
    let analyzer = Analyzer::new(&config, &repo).unwrap();

    assert!(analyzer.analyze(&CancellationToken::new(), None).unwrap().is_empty());
    assert_eq!(
        analyzer.warnings(),
        vec![BoundaryWarning::NoNewCommits {
            scope: String::new(),
            latest_tag: "v0.1.0".to_string(),
        }]
    );
}

#[test]
fn test_no_release_tags_has_hint() {
    let repo = MockRepository::new();
    let err = analyze(&repo, &Config::default(), None).unwrap_err();

    assert!(err.is_no_release_tags());
    assert_eq!(
        err.hint().as_deref(),
        Some("To create one: git tag -a v0.1.0 -m \"initial tag\"")
    );
}

#[test]
fn test_unmatched_commit_aborts() {
    let mut config = Config::default();
    config.policies = vec!["conventional-lax".to_string()];
    let repo = root_repo(vec![Commit::new("1111111111", "whatever")]);

    let err = analyze(&repo, &config, None).unwrap_err();
    assert!(matches!(err, ReleaseError::NoPolicyMatched { .. }));
}

#[test]
fn test_lax_policy_falls_back_to_patch() {
    let repo = root_repo(vec![Commit::new("1111111111", "web: tweak colors")]);
    assert_eq!(analyze(&repo, &Config::default(), None).unwrap(), vec!["v0.1.1"]);
}

#[test]
fn test_anchor_is_newest_commit() {
    let repo = root_repo(vec![
        committed_at("1111111111", "fix: older", 1_000),
        committed_at("2222222222", "fix: newest", 3_000),
        committed_at("3333333333", "feat: middle", 2_000),
    ]);
    let analyzer = Analyzer::new(&Config::default(), &repo).unwrap();
    let versions = analyzer.analyze(&CancellationToken::new(), None).unwrap();

    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].semver, SemVer::new(0, 2, 0));
    assert_eq!(versions[0].commit, "2222222222");
    assert_eq!(versions[0].commits.len(), 3);
}

#[test]
fn test_scope_filtering() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "api/v1.0.0"])
        .with_commits(
            "api/v1.0.0..HEAD",
            vec![
                Commit::new("1111111111", "feat(web): new page"),
                Commit::new("2222222222", "fix(api): null check"),
            ],
        );
    let mut config = Config::default();
    config.release_scopes = vec!["api".to_string(), "web".to_string()];
    config.behavior.scope = "api".to_string();

    let analyzer = Analyzer::new(&config, &repo).unwrap();
    let versions = analyzer.analyze(&CancellationToken::new(), None).unwrap();

    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].scope, "api");
    assert_eq!(versions[0].semver, SemVer::new(1, 0, 1));
    assert_eq!(versions[0].commits.len(), 1);
    assert_eq!(versions[0].commit, "2222222222");
}

#[test]
fn test_root_excludes_declared_scopes() {
    let repo = root_repo(vec![
        Commit::new("1111111111", "feat(api): new endpoint"),
        Commit::new("2222222222", "fix: ci cache"),
    ]);
    let mut config = Config::default();
    config.release_scopes = vec!["api".to_string()];

    assert_eq!(analyze(&repo, &config, None).unwrap(), vec!["v0.1.1"]);
}

#[test]
fn test_root_excludes_undeclared_scopes() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix(build): ci cache")]);
    let mut config = Config::default();
    config.release_scopes = vec!["api".to_string()];

    let err = analyze(&repo, &config, None).unwrap_err();
    assert!(matches!(err, ReleaseError::NoReleasableCommits));

    config.behavior.ci = true;
    assert!(analyze(&repo, &config, None).unwrap().is_empty());
}

#[test]
fn test_root_ignores_tags_of_scope_starting_with_v() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "vendor/v5.0.0"])
        .with_commits("v0.1.0..HEAD", vec![Commit::new("1111111111", "fix: root")])
        .with_commits("vendor/v5.0.0..HEAD", vec![Commit::new("2222222222", "feat(vendor): x")]);
    let mut config = Config::default();
    config.release_scopes = vec!["vendor".to_string()];

    assert_eq!(analyze(&repo, &config, None).unwrap(), vec!["v0.1.1"]);

    config.behavior.all = true;
    assert_eq!(
        analyze(&repo, &config, None).unwrap(),
        vec!["v0.1.1", "vendor/v5.1.0"]
    );
}

#[test]
fn test_all_skips_untagged_scopes() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "api/v1.0.0"])
        .with_commits("v0.1.0..HEAD", vec![Commit::new("1111111111", "fix: root")])
        .with_commits("api/v1.0.0..HEAD", vec![Commit::new("2222222222", "feat(api): x")]);
    let mut config = Config::default();
    config.release_scopes = vec!["api".to_string(), "web".to_string()];
    config.behavior.all = true;

    assert_eq!(
        analyze(&repo, &config, None).unwrap(),
        vec!["v0.1.1", "api/v1.1.0"]
    );
}

#[test]
fn test_explicit_untagged_scope_aborts() {
    let repo = MockRepository::new().with_tags(["v0.1.0"]);
    let mut config = Config::default();
    config.release_scopes = vec!["web".to_string()];
    config.behavior.scope = "web".to_string();

    let err = analyze(&repo, &config, None).unwrap_err();
    match err {
        ReleaseError::NoReleaseTags { scope, initial_tag } => {
            assert_eq!(scope, "web");
            assert_eq!(initial_tag, "web/v0.1.0");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bump_override() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix: small")]);
    let mut config = Config::default();
    config.behavior.bump = Some(BumpOverride::Major);

    assert_eq!(analyze(&repo, &config, None).unwrap(), vec!["v1.0.0"]);
}

#[test]
fn test_bump_override_applies_before_rc_numbering() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "v0.2.0-rc.0", "v0.1.1-rc.4"])
        .with_commits("v0.1.0..HEAD", vec![Commit::new("1111111111", "feat: bigger")]);
    let mut config = Config::default();
    config.behavior.bump = Some(BumpOverride::Patch);

    assert_eq!(analyze(&repo, &config, Some("rc")).unwrap(), vec!["v0.1.1-rc.5"]);
}

#[test]
fn test_bump_override_overflow_is_error() {
    let repo = MockRepository::new()
        .with_tags([format!("v{}.0.0", u64::MAX)])
        .with_commits(
            format!("v{}.0.0..HEAD", u64::MAX),
            vec![Commit::new("1111111111", "fix: a")],
        );
    let mut config = Config::default();
    config.behavior.bump = Some(BumpOverride::Major);

    let err = analyze(&repo, &config, None).unwrap_err();
    assert!(matches!(err, ReleaseError::Version(_)));
}

#[test]
fn test_bump_override_tolerates_unmatched_commits() {
    let repo = root_repo(vec![Commit::new("1111111111", "whatever")]);
    let mut config = Config::default();
    config.policies.clear();
    config.behavior.bump = Some(BumpOverride::Minor);

    assert_eq!(analyze(&repo, &config, None).unwrap(), vec!["v0.2.0"]);
}

#[test]
fn test_bump_override_without_commits_anchors_at_head() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0"])
        .with_current_commit("abcdef0123456789");
    let mut config = Config::default();
    config.behavior.bump = Some(BumpOverride::Patch);

    let analyzer = Analyzer::new(&config, &repo).unwrap();
    let versions = analyzer.analyze(&CancellationToken::new(), None).unwrap();
    assert_eq!(versions[0].semver, SemVer::new(0, 1, 1));
    assert_eq!(versions[0].commit, "abcdef0123456789");
}

#[test]
fn test_off_main_branch() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix: a")]).off_main();
    let err = analyze(&repo, &Config::default(), None).unwrap_err();
    assert!(err.is_wrong_branch());

    let mut config = Config::default();
    config.behavior.dry_run = true;
    let analyzer = Analyzer::new(&config, &repo).unwrap();
    assert_eq!(analyzer.analyze(&CancellationToken::new(), None).unwrap().len(), 1);
    assert!(matches!(
        analyzer.warnings()[0],
        BoundaryWarning::WrongBranch { .. }
    ));
}

#[test]
fn test_ignore_policies_skips_branch_check() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix: a")]).off_main();
    let mut config = Config::default();
    config.behavior.ignore_policies = true;

    let analyzer = Analyzer::new(&config, &repo).unwrap();
    let versions = analyzer.analyze(&CancellationToken::new(), None).unwrap();
    assert_eq!(versions[0].semver, SemVer::new(0, 1, 1));
    assert!(analyzer.warnings().is_empty());
}

#[test]
fn test_invalid_tags_are_skipped() {
    let repo = MockRepository::new()
        .with_tags(["v0.1.0", "v01.2.0", "v0.2.0-rc.1.1"])
        .with_commits("v0.1.0..HEAD", vec![Commit::new("1111111111", "fix: a")]);
    let analyzer = Analyzer::new(&Config::default(), &repo).unwrap();
    let versions = analyzer.analyze(&CancellationToken::new(), None).unwrap();

    assert_eq!(versions[0].semver, SemVer::new(0, 1, 1));
    let invalid = analyzer
        .warnings()
        .into_iter()
        .filter(|w| matches!(w, BoundaryWarning::InvalidTag { .. }))
        .count();
    assert_eq!(invalid, 2);
}

#[test]
fn test_cancelled_analysis() {
    let repo = root_repo(vec![Commit::new("1111111111", "fix: a")]);
    let analyzer = Analyzer::new(&Config::default(), &repo).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = analyzer.analyze(&cancel, None).unwrap_err();
    assert!(matches!(err, ReleaseError::Cancelled));
}
