use crate::error::{GitError, GitResult};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, warn};

/// Default upper bound for a single child process
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Result of running an external command to completion
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CommandOutput {
    /// Standard output decoded as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        }
    }
}

/// Launches external executables with captured output
///
/// Children run inside a private current-thread runtime so callers keep a
/// blocking API while a hung child can still be killed on timeout. Must not
/// be called from inside another tokio runtime.
#[derive(Debug)]
pub struct ProcessRunner {
    runtime: Runtime,
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner with the default timeout
    pub fn new() -> GitResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a runner that kills children running longer than `timeout`
    pub fn with_timeout(timeout: Duration) -> GitResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args` and wait for it to exit
    ///
    /// A non-zero exit status is not an error here; inspect
    /// [`CommandOutput::success`]. Spawn failures are logged and returned as
    /// [`GitError::Spawn`].
    pub fn run<S: AsRef<OsStr>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> GitResult<CommandOutput> {
        let cmdline = describe(program, args);
        debug!(command = %cmdline, "spawning process");

        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let timeout = self.timeout;
        self.runtime.block_on(async move {
            let child = match command.spawn() {
                Ok(child) => child,
                Err(source) => {
                    error!(program, error = %source, "failed to launch process");
                    return Err(GitError::Spawn {
                        program: program.to_string(),
                        source,
                    });
                }
            };

            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(CommandOutput::from(output)),
                Ok(Err(e)) => Err(GitError::IoError(e)),
                Err(_) => {
                    // Dropping the future drops the child, which kills it.
                    warn!(command = %cmdline, seconds = timeout.as_secs(), "process timed out");
                    Err(GitError::Timeout {
                        command: cmdline,
                        seconds: timeout.as_secs(),
                    })
                }
            }
        })
    }

    /// Start `program` without waiting for it and return its process id
    ///
    /// Used for interactive tools (diff viewers) whose lifetime is owned by
    /// the user.
    pub fn launch<S: AsRef<OsStr>>(
        &self,
        program: &str,
        args: &[S],
        cwd: Option<&Path>,
    ) -> GitResult<u32> {
        debug!(command = %describe(program, args), "launching detached process");

        let mut command = std::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let child = command.spawn().map_err(|source| {
            error!(program, error = %source, "failed to launch process");
            GitError::Spawn {
                program: program.to_string(),
                source,
            }
        })?;

        Ok(child.id())
    }
}

/// Human-readable command line for logs and error messages
pub fn describe<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}
