use crate::audit::AuditLogger;
use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::branch::{BranchState, parse_branch_info};
use crate::git::change::{AssetLayout, ChangeRecord, StatusFlags, parse_change_line, parse_status_output};
use crate::git::executor::GitExecutor;
use crate::git::host::{DiffRequest, Host};
use crate::git::log::{LOG_FORMAT, LogRecord, parse_log};
use crate::git::version::GitEnvironment;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Message used for the merge commit created by [`Repository::pull`]
pub const PULL_MERGE_MESSAGE: &str = "Overwrite Merge";

/// Represents a git repository and the state shown by the panel
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    executor: GitExecutor,
    layout: AssetLayout,
    confirm_dangerous_ops: bool,
    state: RepositoryState,
}

/// Branch information and the four file lists kept by [`Repository`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    pub branch: BranchState,
    /// Working tree and index changes
    pub local_changes: Vec<ChangeRecord>,
    /// Committed locally, not yet pushed
    pub local_pushing: Vec<ChangeRecord>,
    /// Committed on the upstream, not yet pulled
    pub remote_updates: Vec<ChangeRecord>,
    /// Everything that differs between the branch and its upstream
    pub remote_diff: Vec<ChangeRecord>,
}

impl RepositoryState {
    /// Check if the working tree has nothing to commit
    pub fn is_clean(&self) -> bool {
        self.local_changes.is_empty()
    }
}

/// Result of a successful [`Repository::pull`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Paths restored to their pre-merge version and left uncommitted
    pub reverted: Vec<String>,
}

impl Repository {
    /// Detect git repository from current working directory
    pub fn discover(config: &Config) -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(&current_dir, config)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P, config: &Config) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            if current.join(".git").exists() {
                return Self::open(current, config);
            }

            // Move up to parent directory
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Open the repository at `path` and probe the configured git executable
    pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> GitResult<Self> {
        let path = path.as_ref().to_path_buf();
        let executor = GitExecutor::new(&path, &config.git.executable, config.timeout())?;

        Ok(Self {
            path,
            executor,
            layout: config.asset_layout(),
            confirm_dangerous_ops: config.behavior.confirm_dangerous_ops,
            state: RepositoryState::default(),
        })
    }

    /// Record every git command run through this repository
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.executor = self.executor.with_audit(logger);
        self
    }

    /// Switch to another git executable; returns whether it is usable
    ///
    /// Callers should only persist the new path when this returns `true`.
    pub fn set_executable_path(&mut self, executable: &str) -> bool {
        self.executor.set_executable(executable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn environment(&self) -> &GitEnvironment {
        self.executor.environment()
    }

    pub fn is_ready(&self) -> bool {
        self.executor.is_ready()
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    /// Local changes, for toggling [`ChangeRecord::selected`]
    pub fn local_changes_mut(&mut self) -> &mut [ChangeRecord] {
        &mut self.state.local_changes
    }

    /// Remote updates, for toggling [`ChangeRecord::discard_remote_on_pull`]
    pub fn remote_updates_mut(&mut self) -> &mut [ChangeRecord] {
        &mut self.state.remote_updates
    }

    /// Get the git executor for this repository
    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    /// Re-read branch and working tree status, and optionally the upstream
    ///
    /// The remote lists are only rebuilt when `include_remote` is set; a
    /// local refresh keeps the last remote snapshot.
    pub fn refresh_status(&mut self, include_remote: bool, host: &dyn Host) -> GitResult<()> {
        self.update_branch_info()?;
        self.check_local_changes()?;

        if include_remote {
            self.check_remote_diffs(host)?;
        }

        Ok(())
    }

    fn update_branch_info(&mut self) -> GitResult<()> {
        {
            let branch = &mut self.state.branch;
            branch.ahead = 0;
            branch.behind = 0;
            branch.upstream.clear();
            branch.remote.clear();
        }

        let output = self.executor.read(&["branch", "-vv"])?;

        for line in output.lines().filter(|line| line.starts_with('*')) {
            self.state.branch.info = line.to_string();
            match parse_branch_info(line) {
                Some(parsed) => self.state.branch = parsed,
                None => debug!(line, "unrecognised current branch line"),
            }
        }

        Ok(())
    }

    fn check_local_changes(&mut self) -> GitResult<()> {
        self.state.local_changes.clear();

        let output = self
            .executor
            .read(&["status", "--porcelain", "--untracked-files"])?;
        self.state.local_changes = parse_status_output(&output, false, &self.layout);

        Ok(())
    }

    fn check_remote_diffs(&mut self, host: &dyn Host) -> GitResult<()> {
        self.state.local_pushing.clear();
        self.state.remote_updates.clear();
        self.state.remote_diff.clear();

        if !self.state.branch.has_upstream() {
            return Ok(());
        }

        host.show_progress("Hold on", "Refreshing Status");
        let result = self.fetch_and_diff(host);
        host.refresh_assets();
        host.clear_progress();

        result
    }

    fn fetch_and_diff(&mut self, host: &dyn Host) -> GitResult<()> {
        let remote = self.state.branch.remote.clone();
        self.executor.execute(&["fetch", remote.as_str()])?;
        host.refresh_assets();

        // Counts from before the fetch describe stale tracking refs
        self.update_branch_info()?;
        if !self.state.branch.has_upstream() {
            return Ok(());
        }

        let BranchState {
            branch,
            upstream,
            ahead,
            behind,
            ..
        } = self.state.branch.clone();

        self.state.remote_diff = self.name_only_diff(&branch, &upstream)?;

        if ahead > 0 {
            self.state.local_pushing = self.name_only_diff(&format!("HEAD~{}", ahead), &branch)?;
        }

        if behind > 0 {
            let base = if ahead > 0 {
                format!("HEAD~{}", ahead)
            } else {
                "HEAD".to_string()
            };
            self.state.remote_updates = self.name_only_diff(&base, &upstream)?;
        }

        debug!(
            branch = %branch,
            ahead,
            behind,
            pushing = self.state.local_pushing.len(),
            updates = self.state.remote_updates.len(),
            "remote status refreshed"
        );

        Ok(())
    }

    fn name_only_diff(&self, from: &str, to: &str) -> GitResult<Vec<ChangeRecord>> {
        let output = self.executor.read(&["diff", "--name-only", from, to])?;
        Ok(parse_status_output(&output, true, &self.layout))
    }

    /// Stage one record (with its companion paths) or everything
    pub fn stage(&self, record: Option<&ChangeRecord>) -> GitResult<()> {
        match record {
            Some(record) => {
                let paths = self.pathspecs_for(record, None)?;
                self.run_with_paths(&["add", "--"], &paths)
            }
            None => self.run(&["add", "."]),
        }
    }

    /// Stage every selected record with unstaged changes
    pub fn stage_selected(&self) -> GitResult<bool> {
        let mut staged = false;

        for record in &self.state.local_changes {
            if record.selected && record.has_status(StatusFlags::HAS_UNSTAGED_CHANGES) {
                self.stage(Some(record))?;
                staged = true;
            }
        }

        Ok(staged)
    }

    /// Unstage one record (with its companion paths) or everything
    ///
    /// For a rename the original path is reset as well, so the deletion
    /// half of the rename leaves the index too.
    pub fn unstage(&self, record: Option<&ChangeRecord>) -> GitResult<()> {
        let Some(record) = record else {
            return self.run(&["reset", "."]);
        };

        let paths = self.pathspecs_for(record, None)?;
        self.run_with_paths(&["reset", "--"], &paths)?;

        if record.has_status(StatusFlags::RENAMED) {
            if let Some(deleted) = parse_change_line(record.source_path(), true, &self.layout) {
                let paths = self.pathspecs_for(&deleted, None)?;
                self.run_with_paths(&["reset", "--"], &paths)?;
            }
        }

        Ok(())
    }

    /// Unstage every selected record with staged changes
    pub fn unstage_selected(&self) -> GitResult<bool> {
        let mut unstaged = false;

        for record in &self.state.local_changes {
            if record.selected && record.has_status(StatusFlags::HAS_STAGED_CHANGES) {
                self.unstage(Some(record))?;
                unstaged = true;
            }
        }

        Ok(unstaged)
    }

    /// Restore `record` from `revision`, then unstage it
    ///
    /// Returns `false` when the host declined the confirmation.
    pub fn checkout(&self, record: &ChangeRecord, revision: &str, host: &dyn Host) -> GitResult<bool> {
        if self.confirm_dangerous_ops
            && !host.confirm(
                "Checkout Entry?",
                &format!("Are you sure you want to checkout {} at {}?", record.path(), revision),
            )
        {
            return Ok(false);
        }

        self.checkout_unconfirmed(record, revision, host)?;
        Ok(true)
    }

    /// [`Repository::checkout`] for a bare repo-relative path
    pub fn checkout_path(&self, path: &str, revision: &str, host: &dyn Host) -> GitResult<bool> {
        match parse_change_line(path, true, &self.layout) {
            Some(record) => self.checkout(&record, revision, host),
            None => Err(GitError::ParseError(format!("Invalid path: {}", path))),
        }
    }

    /// Throw away the changes to `record` by checking out `HEAD^`
    pub fn discard(&self, record: &ChangeRecord, host: &dyn Host) -> GitResult<bool> {
        if self.confirm_dangerous_ops
            && !host.confirm(
                "Discard Entry?",
                &format!("Are you sure you want to discard {}?", record.path()),
            )
        {
            return Ok(false);
        }

        self.checkout_unconfirmed(record, "HEAD^", host)?;
        Ok(true)
    }

    fn checkout_unconfirmed(&self, record: &ChangeRecord, revision: &str, host: &dyn Host) -> GitResult<()> {
        info!(path = record.path(), revision, "checking out");

        let paths = self.pathspecs_for(record, Some(revision))?;
        self.run_with_paths(&["checkout", revision, "--"], &paths)?;
        self.unstage(Some(record))?;

        host.refresh_assets();
        Ok(())
    }

    /// Commit the index; the message is passed to git verbatim
    pub fn commit(&self, message: &str) -> GitResult<()> {
        self.run(&["commit", "--quiet", "-m", message])
    }

    pub fn push(&self) -> GitResult<()> {
        self.run(&["push", "--quiet"])
    }

    /// Merge the upstream preferring its side, then restore opted-out paths
    ///
    /// Refuses to run while any remote update is also changed locally.
    /// Paths flagged [`ChangeRecord::discard_remote_on_pull`] are checked out
    /// from the pre-merge HEAD and left uncommitted.
    pub fn pull(&self, host: &dyn Host) -> GitResult<PullOutcome> {
        let conflicts = self.pull_conflicts();
        if !conflicts.is_empty() {
            error!(count = conflicts.len(), "pull refused, local changes overlap remote updates");
            return Err(GitError::LocalChangesConflict { paths: conflicts });
        }

        if !self.is_ready() {
            return Ok(PullOutcome::default());
        }

        let upstream = self.state.branch.upstream.clone();
        if upstream.is_empty() {
            return Err(GitError::NoUpstream);
        }

        let reverts: Vec<&ChangeRecord> = self
            .state
            .remote_updates
            .iter()
            .filter(|record| record.discard_remote_on_pull)
            .collect();

        host.show_progress("Hold on", "Updating...");
        let result = self.merge_and_revert(&upstream, &reverts);
        host.refresh_assets();
        host.clear_progress();
        let outcome = result?;

        if !outcome.reverted.is_empty() {
            host.warn(
                "Warning",
                &format!(
                    "Git pulled, but {} files were kept from local and are not committed.",
                    outcome.reverted.len()
                ),
            );
        }

        Ok(outcome)
    }

    fn merge_and_revert(&self, upstream: &str, reverts: &[&ChangeRecord]) -> GitResult<PullOutcome> {
        let head = self.executor.read(&["rev-parse", "HEAD"])?;
        let pre_merge = match head.trim() {
            "" => "HEAD~1".to_string(),
            hash => hash.to_string(),
        };

        self.run(&[
            "merge",
            "-s",
            "recursive",
            "-X",
            "theirs",
            upstream,
            "-m",
            PULL_MERGE_MESSAGE,
        ])?;

        let mut outcome = PullOutcome::default();
        for record in reverts {
            info!(paths = %record.quoted_paths(), "discarding remote changes");
            let paths = self.pathspecs_for(record, Some(&pre_merge))?;
            self.run_with_paths(&["checkout", pre_merge.as_str(), "--"], &paths)?;
            outcome.reverted.push(record.path().to_string());
        }

        Ok(outcome)
    }

    /// Remote updates whose path is also changed in the working tree
    pub fn pull_conflicts(&self) -> Vec<String> {
        self.state
            .remote_updates
            .iter()
            .filter(|remote| self.is_locally_changed(remote.path()))
            .map(|remote| remote.path().to_string())
            .collect()
    }

    /// Remote update that collides with local work, committed or not
    pub fn is_conflicting(&self, record: &ChangeRecord) -> bool {
        self.is_locally_changed(record.path())
            || self
                .state
                .local_pushing
                .iter()
                .any(|pushing| pushing.path() == record.path())
    }

    fn is_locally_changed(&self, path: &str) -> bool {
        self.state.local_changes.iter().any(|local| local.path() == path)
    }

    /// There are remote updates and none collides with uncommitted work
    pub fn can_pull(&self) -> bool {
        !self.state.remote_updates.is_empty() && self.pull_conflicts().is_empty()
    }

    /// Up to date with the upstream and holding commits to push
    pub fn can_push(&self) -> bool {
        self.state.branch.behind == 0 && !self.can_pull() && !self.state.local_pushing.is_empty()
    }

    /// Set `selected` on every local change carrying all of `flags`
    pub fn set_selected_where(&mut self, flags: StatusFlags, selected: bool) {
        for record in &mut self.state.local_changes {
            if record.has_status(flags) {
                record.selected = selected;
            }
        }
    }

    /// Write `path` at `revision` to a temp file and open the diff tool
    ///
    /// The temp file only exists while [`Host::invoke_diff_tool`] runs and is
    /// removed once it returns. Hosts that hand the file to a detached
    /// viewer must copy it first.
    pub fn invoke_external_diff(&self, path: &str, revision: &str, host: &dyn Host) -> GitResult<()> {
        let revision = if revision.is_empty() { "HEAD" } else { revision };

        let object = format!("{}:{}", revision, path);
        let Some(output) = self.executor.execute(&["show", object.as_str()])? else {
            return Ok(());
        };

        let extension = Path::new(path)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix("gitpane-")
            .suffix(&extension)
            .tempfile()?;
        temp.write_all(&output.stdout)?;
        temp.flush()?;
        let left = temp.into_temp_path();

        let result = host.invoke_diff_tool(&DiffRequest {
            revision: revision.to_string(),
            left: left.to_path_buf(),
            right: self.path.join(path),
            left_label: format!("{}@{}", path, revision),
            right_label: format!("{} (working copy)", path),
        });

        if let Err(e) = left.close() {
            warn!(error = %e, "failed to remove diff temp file");
        }

        result
    }

    /// Files touched by `revision` (`HEAD` when empty)
    pub fn head_files(&self, revision: &str) -> GitResult<Vec<ChangeRecord>> {
        let revision = if revision.is_empty() { "HEAD" } else { revision };
        let parent = format!("{}~", revision);

        let output = if self.resolves(&parent)? {
            self.executor.read(&["diff", "--name-only", parent.as_str(), revision])?
        } else {
            // Root commit
            self.executor
                .read(&["diff-tree", "--no-commit-id", "--name-only", "-r", "--root", revision])?
        };

        Ok(parse_status_output(&output, true, &self.layout))
    }

    /// Up to `count` commits touching `path`, newest first
    pub fn commit_log(&self, path: &str, count: usize) -> GitResult<Vec<LogRecord>> {
        if !self.resolves("HEAD")? {
            return Ok(Vec::new()); // Empty repo has no commits
        }

        let count = count.to_string();
        let output = self.executor.read(&[
            "log",
            LOG_FORMAT,
            "--abbrev-commit",
            "-n",
            count.as_str(),
            "--",
            path,
        ])?;

        Ok(parse_log(&output))
    }

    /// Whether `spec` names an existing object
    fn resolves(&self, spec: &str) -> GitResult<bool> {
        match self.executor.execute(&["rev-parse", "--verify", "--quiet", spec]) {
            Ok(output) => Ok(output.is_some()),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The record's pathspecs, keeping companions only where they exist
    ///
    /// With a `revision` the companion must exist in that revision;
    /// otherwise in the working tree or the index.
    fn pathspecs_for(&self, record: &ChangeRecord, revision: Option<&str>) -> GitResult<Vec<String>> {
        let mut specs = record.pathspecs().into_iter();
        let mut paths: Vec<String> = specs.next().into_iter().collect();

        for companion in specs {
            let exists = match revision {
                Some(revision) => self.resolves(&format!("{}:{}", revision, companion))?,
                None => {
                    self.path.join(&companion).exists()
                        || !self.executor.read(&["ls-files", "--", companion.as_str()])?.trim().is_empty()
                }
            };

            if exists {
                paths.push(companion);
            } else {
                debug!(path = %companion, "skipping missing companion path");
            }
        }

        Ok(paths)
    }

    fn run(&self, args: &[&str]) -> GitResult<()> {
        self.executor.execute(args).map(|_| ())
    }

    fn run_with_paths(&self, args: &[&str], paths: &[String]) -> GitResult<()> {
        let mut full: Vec<&str> = args.to_vec();
        full.extend(paths.iter().map(String::as_str));
        self.run(&full)
    }
}
