mod helpers;

use gitpane::git::DiffRequest;
use gitpane::{ChangeRecord, GitError, GitResult, Host, NullHost, Repository, StatusFlags};
use helpers::{create_commit, create_remote_fixture, git, test_config, write_file};
use std::cell::RefCell;
use std::fs;

/// Host that keeps the warnings it was shown
#[derive(Default)]
struct WarningHost {
    warnings: RefCell<Vec<String>>,
    progress: RefCell<Vec<String>>,
}

impl Host for WarningHost {
    fn show_progress(&self, _title: &str, info: &str) {
        self.progress.borrow_mut().push(info.to_string());
    }

    fn warn(&self, _title: &str, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn invoke_diff_tool(&self, _request: &DiffRequest) -> GitResult<()> {
        Ok(())
    }
}

fn paths(records: &[ChangeRecord]) -> Vec<&str> {
    records.iter().map(|r| r.path()).collect()
}

#[test]
fn test_refresh_tracks_upstream() {
    let fixture = create_remote_fixture();
    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();

    repo.refresh_status(true, &NullHost).unwrap();

    let branch = &repo.state().branch;
    assert_eq!(branch.branch, "main");
    assert_eq!(branch.upstream, "origin/main");
    assert_eq!(branch.remote, "origin");
    assert_eq!((branch.ahead, branch.behind), (0, 0));
    assert!(repo.state().remote_updates.is_empty());
    assert!(repo.state().local_pushing.is_empty());
    assert!(!repo.can_pull());
    assert!(!repo.can_push());
}

#[test]
fn test_refresh_sees_commits_pushed_elsewhere() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.other, "README.md", "updated\n", "Update readme");
    git(&fixture.other, &["push", "--quiet"]);

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    let host = WarningHost::default();
    repo.refresh_status(true, &host).unwrap();

    // Counts come from after the fetch
    assert_eq!(repo.state().branch.behind, 1);
    assert_eq!(repo.state().branch.ahead, 0);
    assert_eq!(paths(&repo.state().remote_updates), vec!["README.md"]);
    assert_eq!(paths(&repo.state().remote_diff), vec!["README.md"]);
    assert!(repo.state().local_pushing.is_empty());
    assert!(repo.can_pull());
    assert_eq!(*host.progress.borrow(), vec!["Refreshing Status".to_string()]);
}

#[test]
fn test_local_refresh_keeps_remote_snapshot() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.other, "README.md", "updated\n", "Update readme");
    git(&fixture.other, &["push", "--quiet"]);

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();
    repo.refresh_status(false, &NullHost).unwrap();

    assert_eq!(paths(&repo.state().remote_updates), vec!["README.md"]);
}

#[test]
fn test_local_commits_are_pushing() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.local, "Assets/Player.cs", "class Player {}\n", "Add player");

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();

    assert_eq!(repo.state().branch.ahead, 1);
    assert_eq!(paths(&repo.state().local_pushing), vec!["Assets/Player.cs"]);
    assert!(repo.can_push());

    repo.push().unwrap();
    repo.refresh_status(true, &NullHost).unwrap();

    assert_eq!(repo.state().branch.ahead, 0);
    assert!(repo.state().local_pushing.is_empty());
    let remote_log = git(&fixture.remote, &["log", "-1", "--format=%s"]);
    assert_eq!(remote_log.trim(), "Add player");
}

#[test]
fn test_pull_refused_when_local_changes_overlap() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.other, "Assets/Level.unity", "level v2\n", "Edit level");
    git(&fixture.other, &["push", "--quiet"]);
    fs::write(fixture.local.join("Assets/Level.unity"), "local edit\n").unwrap();

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();
    let head_before = git(&fixture.local, &["rev-parse", "HEAD"]);

    let update = repo.state().remote_updates[0].clone();
    assert!(repo.is_conflicting(&update));
    assert!(!repo.can_pull());

    match repo.pull(&NullHost) {
        Err(GitError::LocalChangesConflict { paths }) => {
            assert_eq!(paths, vec!["Assets/Level.unity".to_string()]);
        }
        other => panic!("expected LocalChangesConflict, got {:?}", other),
    }

    assert_eq!(git(&fixture.local, &["rev-parse", "HEAD"]), head_before);
    assert_eq!(
        fs::read_to_string(fixture.local.join("Assets/Level.unity")).unwrap(),
        "local edit\n"
    );
}

#[test]
fn test_pull_applies_remote_changes() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.other, "README.md", "updated\n", "Update readme");
    git(&fixture.other, &["push", "--quiet"]);
    write_file(&fixture.local, "scratch.txt", "unrelated");

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();

    let host = WarningHost::default();
    let outcome = repo.pull(&host).unwrap();

    assert!(outcome.reverted.is_empty());
    assert!(host.warnings.borrow().is_empty());
    assert_eq!(fs::read_to_string(fixture.local.join("README.md")).unwrap(), "updated\n");

    repo.refresh_status(true, &NullHost).unwrap();
    assert_eq!(repo.state().branch.behind, 0);
    assert!(repo.state().remote_updates.is_empty());
}

#[test]
fn test_pull_keeps_local_version_when_asked() {
    let fixture = create_remote_fixture();
    write_file(&fixture.other, "README.md", "remote readme\n");
    write_file(&fixture.other, "Assets/Level.unity", "remote level\n");
    git(&fixture.other, &["add", "."]);
    git(&fixture.other, &["commit", "--quiet", "-m", "Remote edits"]);
    git(&fixture.other, &["push", "--quiet"]);

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();
    assert_eq!(paths(&repo.state().remote_updates), vec!["Assets/Level.unity", "README.md"]);

    for record in repo.remote_updates_mut() {
        record.discard_remote_on_pull = record.path() == "Assets/Level.unity";
    }

    let host = WarningHost::default();
    let outcome = repo.pull(&host).unwrap();

    assert_eq!(outcome.reverted, vec!["Assets/Level.unity".to_string()]);
    assert_eq!(
        *host.warnings.borrow(),
        vec!["Git pulled, but 1 files were kept from local and are not committed.".to_string()]
    );
    assert_eq!(fs::read_to_string(fixture.local.join("README.md")).unwrap(), "remote readme\n");
    assert_eq!(
        fs::read_to_string(fixture.local.join("Assets/Level.unity")).unwrap(),
        "level v1\n"
    );

    // The kept version shows up as an uncommitted local change
    repo.refresh_status(false, &NullHost).unwrap();
    let level = repo
        .state()
        .local_changes
        .iter()
        .find(|r| r.path() == "Assets/Level.unity")
        .expect("kept file should be a local change");
    assert!(level.has_status(StatusFlags::HAS_STAGED_CHANGES));
}

#[test]
fn test_pull_without_upstream() {
    let fixture = create_remote_fixture();
    git(&fixture.local, &["checkout", "--quiet", "-b", "topic"]);

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();

    assert_eq!(repo.state().branch.branch, "topic");
    assert!(!repo.state().branch.has_upstream());
    assert!(matches!(repo.pull(&NullHost), Err(GitError::NoUpstream)));
}

#[test]
fn test_commit_subject_does_not_move_counts() {
    let fixture = create_remote_fixture();
    create_commit(&fixture.other, "README.md", "tiles\n", "Move player ahead 9 tiles");
    git(&fixture.other, &["push", "--quiet"]);

    let mut repo = Repository::open(&fixture.local, &test_config()).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();
    assert_eq!((repo.state().branch.ahead, repo.state().branch.behind), (0, 1));

    repo.pull(&NullHost).unwrap();
    repo.refresh_status(true, &NullHost).unwrap();

    assert!(repo.state().branch.info.contains("ahead 9"));
    assert_eq!((repo.state().branch.ahead, repo.state().branch.behind), (0, 0));
    assert!(repo.state().local_pushing.is_empty());
}
