#![allow(dead_code)]

use gitpane::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking on failure, and return stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_user(repo_path: &Path) {
    git(repo_path, &["config", "user.name", "Test User"]);
    git(repo_path, &["config", "user.email", "test@example.com"]);
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "--quiet"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_user(&repo_path);

    (temp_dir, repo_path)
}

/// Write `file` (creating parent directories) without staging it
pub fn write_file(repo_path: &Path, file: &str, content: &str) {
    let file_path = repo_path.join(file);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(&file_path, content).expect("Failed to write file");
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    write_file(repo_path, file, content);
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "--quiet", "-m", message]);
}

/// A bare remote plus two clones of it, all on `main` with one commit
pub struct RemoteFixture {
    pub temp: TempDir,
    pub remote: PathBuf,
    pub local: PathBuf,
    pub other: PathBuf,
}

pub fn create_remote_fixture() -> RemoteFixture {
    let temp = TempDir::new().unwrap();
    let seed = temp.path().join("seed");
    let remote = temp.path().join("remote.git");
    let local = temp.path().join("local");
    let other = temp.path().join("other");

    fs::create_dir(&seed).unwrap();
    git(&seed, &["init", "--quiet"]);
    git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_user(&seed);
    create_commit(&seed, "README.md", "seed\n", "Initial commit");
    create_commit(&seed, "Assets/Level.unity", "level v1\n", "Add level");
    create_commit(&seed, "Assets/Level.unity.meta", "guid: 1\n", "Add level meta");

    let root = temp.path();
    git(root, &["clone", "--quiet", "--bare", "seed", "remote.git"]);
    git(root, &["clone", "--quiet", "remote.git", "local"]);
    git(root, &["clone", "--quiet", "remote.git", "other"]);
    configure_user(&local);
    configure_user(&other);

    RemoteFixture {
        temp,
        remote,
        local,
        other,
    }
}

/// Config that never prompts and uses the git on PATH
pub fn test_config() -> Config {
    let mut config = Config::default_config();
    config.behavior.confirm_dangerous_ops = false;
    config
}
