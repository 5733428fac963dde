use crate::audit::AuditLogger;
use crate::error::{GitError, GitResult};
use crate::git::process::{self, CommandOutput, ProcessRunner};
use crate::git::version::GitEnvironment;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Executes git commands within a repository
///
/// Every command is gated on the probed [`GitEnvironment`]: while the
/// executable is not ready, [`GitExecutor::execute`] does nothing and
/// returns `Ok(None)`.
#[derive(Debug)]
pub struct GitExecutor {
    repo_path: PathBuf,
    runner: ProcessRunner,
    environment: GitEnvironment,
    audit: Option<AuditLogger>,
}

impl GitExecutor {
    /// Create an executor for `repo_path` and probe `executable`
    pub fn new<P: AsRef<Path>>(repo_path: P, executable: &str, timeout: Duration) -> GitResult<Self> {
        let runner = ProcessRunner::with_timeout(timeout)?;
        let environment = GitEnvironment::probe(&runner, executable);

        Ok(Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            runner,
            environment,
            audit: None,
        })
    }

    /// Record every executed command in `logger`
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Point at a different git executable and probe it
    ///
    /// Returns whether the new executable is ready.
    pub fn set_executable(&mut self, executable: &str) -> bool {
        self.environment = GitEnvironment::probe(&self.runner, executable);
        self.environment.ready
    }

    pub fn is_ready(&self) -> bool {
        self.environment.ready
    }

    pub fn environment(&self) -> &GitEnvironment {
        &self.environment
    }

    /// Run `git <args>` to completion
    ///
    /// A non-zero exit status becomes [`GitError::CommandFailed`].
    pub fn execute<S: AsRef<OsStr>>(&self, args: &[S]) -> GitResult<Option<CommandOutput>> {
        let command = process::describe("git", args);

        if !self.environment.ready {
            debug!(%command, "git not ready, skipping");
            return Ok(None);
        }

        let output = self
            .runner
            .run(&self.environment.executable, args, Some(&self.repo_path))?;

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(&command, &self.repo_path, output.exit_code) {
                warn!(error = %e, "failed to write command history");
            }
        }

        if !output.success {
            return Err(GitError::CommandFailed {
                command,
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(Some(output))
    }

    /// Run `git <args>` and return its standard output, empty when not ready
    pub fn read<S: AsRef<OsStr>>(&self, args: &[S]) -> GitResult<String> {
        Ok(self
            .execute(args)?
            .map(|output| output.text())
            .unwrap_or_default())
    }

    /// Get the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}
