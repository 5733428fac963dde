use crate::error::{GitError, GitResult};
use crate::git::process::ProcessRunner;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

/// Minimum git version the parsers were written against
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

static RE_VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"version \d+\.\d+").expect("invalid RE_VERSION_LINE regex"));

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Parse git version from string like "git version 2.39.2"
    pub fn parse(version_str: &str) -> GitResult<Self> {
        // Expected format: "git version X.Y.Z" or "git version X.Y.Z.windows.1" etc.
        let parts: Vec<&str> = version_str.split_whitespace().collect();

        if parts.len() < 3 || parts[0] != "git" || parts[1] != "version" {
            return Err(GitError::ParseError(format!(
                "Unexpected git version format: {}",
                version_str
            )));
        }

        let nums: Vec<&str> = parts[2].split('.').collect();
        if nums.len() < 2 {
            return Err(GitError::ParseError(format!(
                "Invalid version number format: {}",
                parts[2]
            )));
        }

        let major = nums[0]
            .parse::<u32>()
            .map_err(|_| GitError::ParseError(format!("Invalid major version: {}", nums[0])))?;

        let minor = nums[1]
            .parse::<u32>()
            .map_err(|_| GitError::ParseError(format!("Invalid minor version: {}", nums[1])))?;

        // Patch may carry a non-numeric suffix
        let patch = nums.get(2).and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        self.major > MIN_GIT_VERSION.0
            || (self.major == MIN_GIT_VERSION.0 && self.minor >= MIN_GIT_VERSION.1)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Outcome of probing a git executable
///
/// `ready` gates every other git invocation. It is only set when the
/// executable answered `--version` with a recognisable version line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitEnvironment {
    pub executable: String,
    pub version: String,
    pub parsed: Option<GitVersion>,
    pub ready: bool,
}

impl GitEnvironment {
    /// Run `<executable> --version` and record the first matching line
    pub fn probe(runner: &ProcessRunner, executable: &str) -> Self {
        let mut env = GitEnvironment {
            executable: executable.to_string(),
            ..Default::default()
        };

        let output = match runner.run(executable, &["--version"], None) {
            Ok(output) => output,
            Err(e) => {
                warn!(executable, error = %e, "git probe failed");
                return env;
            }
        };

        env.absorb(&output.text());
        if env.ready {
            info!(executable, version = %env.version, "git environment ready");
        } else {
            warn!(executable, "no git version found in --version output");
        }
        env
    }

    /// Scan `--version` output; the first line containing `version X.Y` wins
    fn absorb(&mut self, output: &str) {
        let Some(line) = output.lines().find(|line| RE_VERSION_LINE.is_match(line)) else {
            return;
        };

        self.version = line.trim().to_string();
        self.ready = true;
        self.parsed = GitVersion::parse(line).ok();

        if let Some(version) = &self.parsed {
            if !version.is_supported() {
                warn!(
                    %version,
                    "git is older than {}.{}; output parsing may be unreliable",
                    MIN_GIT_VERSION.0,
                    MIN_GIT_VERSION.1
                );
            }
        }
    }

    /// Environment for an executable that never answered
    pub fn unavailable(executable: &str) -> Self {
        GitEnvironment {
            executable: executable.to_string(),
            ..Default::default()
        }
    }
}
