// tests/git_repository_test.rs
use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use trunk_release::config::Config;
use trunk_release::git::{Git2Repository, PushOptions, Repository as _, TagOptions};
use trunk_release::runner::Runner;

fn signature(secs: i64) -> Signature<'static> {
    Signature::new("Test User", "test@example.com", &Time::new(secs, 0)).unwrap()
}

// Commit a file change on `refname`, on top of `parent`
fn commit(repo: &Repository, refname: &str, message: &str, secs: i64, parent: Option<Oid>) -> Oid {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join("README.md"), message).expect("Could not write file");

    let mut index = repo.index().expect("Could not get index");
    index.add_path(Path::new("README.md")).expect("Could not add file to index");
    index.write().expect("Could not write index");
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let parents: Vec<git2::Commit> = parent.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
    let parents: Vec<&git2::Commit> = parents.iter().collect();
    let sig = signature(secs);
    repo.commit(Some(refname), &sig, &sig, message, &tree, &parents)
        .expect("Could not create commit")
}

struct Fixture {
    dir: TempDir,
    initial: Oid,
    feature: Oid,
    fix: Oid,
}

// main: initial (tagged v0.1.0) -> feat -> fix
fn setup_test_repo() -> Fixture {
    let dir = TempDir::new().expect("Could not create temp dir");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir.path(), &opts).expect("Could not init git repo");
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }

    let initial = commit(&repo, "HEAD", "Initial commit", 1_000, None);
    let target = repo.find_object(initial, None).unwrap();
    repo.tag("v0.1.0", &target, &signature(1_000), "initial tag", false)
        .unwrap();
    let feature = commit(&repo, "HEAD", "feat: add new feature\n\nDetails here.", 2_000, Some(initial));
    let fix = commit(&repo, "HEAD", "fix(api): handle empty input", 3_000, Some(feature));

    Fixture {
        dir,
        initial,
        feature,
        fix,
    }
}

#[test]
fn test_read_tags() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let cancel = CancellationToken::new();

    assert_eq!(repo.read_tags(&cancel, "v*").unwrap(), vec!["v0.1.0"]);
    assert!(repo.read_tags(&cancel, "api/v*").unwrap().is_empty());
}

#[test]
fn test_read_commits_since_tag() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let commits = repo
        .read_commits(&CancellationToken::new(), "v0.1.0..HEAD")
        .unwrap();

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].id, fixture.fix.to_string());
    assert_eq!(commits[0].subject, "fix(api): handle empty input");
    assert_eq!(commits[1].id, fixture.feature.to_string());
    assert_eq!(commits[1].body, "Details here.");
    assert_eq!(commits[1].author, "Test User");
    assert_eq!(commits[1].committer_date.unwrap().timestamp(), 2_000);
}

#[test]
fn test_main_and_current_branch() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let cancel = CancellationToken::new();

    let candidates = Config::default_branches();
    assert_eq!(repo.get_main_branch(&cancel, &candidates).unwrap(), "main");
    assert!(repo
        .get_main_branch(&cancel, &["trunk".to_string()])
        .is_err());
    assert_eq!(repo.current_branch(&cancel).unwrap(), "main");
    assert_eq!(repo.current_commit(&cancel).unwrap(), fixture.fix.to_string());
}

#[test]
fn test_main_branch_without_remote_head() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    assert!(repo.get_main_branch(&CancellationToken::new(), &[]).is_err());
}

#[test]
fn test_branch_contains() {
    let fixture = setup_test_repo();
    let raw = Repository::open(fixture.dir.path()).unwrap();
    let side = commit(&raw, "refs/heads/side", "chore: side work", 4_000, Some(fixture.initial));

    let repo = Git2Repository::from_git2(raw);
    let cancel = CancellationToken::new();
    assert!(repo.branch_contains(&cancel, &fixture.initial.to_string(), "main").unwrap());
    assert!(repo.branch_contains(&cancel, &fixture.fix.to_string(), "main").unwrap());
    assert!(!repo.branch_contains(&cancel, &side.to_string(), "main").unwrap());
}

#[test]
fn test_create_annotated_tag() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let cancel = CancellationToken::new();
    let opts = TagOptions {
        message: "release: v0.2.0".to_string(),
        ..TagOptions::default()
    };

    repo.create_tag(&cancel, &fixture.fix.to_string(), "v0.2.0", &opts)
        .unwrap();
    assert!(repo
        .create_tag(&cancel, &fixture.fix.to_string(), "v0.2.0", &opts)
        .is_err());

    let raw = Repository::open(fixture.dir.path()).unwrap();
    let tag = raw
        .find_reference("refs/tags/v0.2.0")
        .unwrap()
        .peel_to_tag()
        .unwrap();
    assert_eq!(tag.message(), Some("release: v0.2.0"));
    assert_eq!(tag.target_id(), fixture.fix);
    assert_eq!(tag.tagger().unwrap().name(), Some("Test User"));
}

#[test]
fn test_push_follows_created_tags() {
    let fixture = setup_test_repo();
    let remote_dir = TempDir::new().unwrap();
    let remote = Repository::init_bare(remote_dir.path()).unwrap();

    let raw = Repository::open(fixture.dir.path()).unwrap();
    raw.remote("origin", remote_dir.path().to_str().unwrap())
        .unwrap();
    let repo = Git2Repository::from_git2(raw);
    let cancel = CancellationToken::new();

    repo.create_tag(&cancel, "", "v0.2.0", &TagOptions::default())
        .unwrap();
    let opts = PushOptions {
        follow_tags: true,
        ..PushOptions::default()
    };
    repo.push(&cancel, "origin", "main", &opts).unwrap();

    assert!(remote.find_reference("refs/heads/main").is_ok());
    assert!(remote.find_reference("refs/tags/v0.2.0").is_ok());
    // only tags created through this handle follow
    assert!(remote.find_reference("refs/tags/v0.1.0").is_err());
}

#[test]
fn test_runner_tags_next_release() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let runner = Runner::new(Config::default(), repo).unwrap();
    let cancel = CancellationToken::new();

    runner.check_branch(&cancel).unwrap();
    let versions = runner.analyze(&cancel, None).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].commit, fixture.fix.to_string());

    let tags = runner.create_tags(&cancel, &versions).unwrap();
    assert_eq!(tags, vec!["v0.2.0"]);
    let mut all_tags = runner.repo().read_tags(&cancel, "v*").unwrap();
    all_tags.sort();
    assert_eq!(all_tags, vec!["v0.1.0", "v0.2.0"]);
}

#[test]
fn test_cancelled_calls_fail() {
    let fixture = setup_test_repo();
    let repo = Git2Repository::open(fixture.dir.path()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(
        repo.read_tags(&cancel, "v*"),
        Err(trunk_release::ReleaseError::Cancelled)
    ));
}
