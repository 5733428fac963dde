pub mod branch;
pub mod change;
pub mod executor;
pub mod host;
pub mod log;
pub mod process;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use branch::{BranchState, parse_branch_info, parse_branch_output};
pub use change::{AssetLayout, ChangeRecord, StatusFlags, parse_change_line, parse_status_output};
pub use executor::GitExecutor;
pub use host::{DiffRequest, Host, NullHost};
pub use log::{LogRecord, parse_log, parse_log_line};
pub use process::{CommandOutput, ProcessRunner};
pub use repository::{PullOutcome, Repository, RepositoryState};
pub use version::{GitEnvironment, GitVersion};
