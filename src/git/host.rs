use crate::error::GitResult;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Two files to compare in an external diff tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub revision: String,
    /// Blob content at `revision`, written to a temp file
    pub left: PathBuf,
    /// Working copy
    pub right: PathBuf,
    pub left_label: String,
    pub right_label: String,
}

/// Callbacks into the UI that embeds the repository panel
///
/// Everything except the diff tool defaults to doing nothing, so headless
/// callers only implement what they render.
pub trait Host {
    /// The working tree changed underneath the host
    fn refresh_assets(&self) {}

    fn show_progress(&self, _title: &str, _info: &str) {}

    fn clear_progress(&self) {}

    /// Ask before a destructive operation. Declining aborts it.
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }

    /// Non-fatal outcome the user should see
    fn warn(&self, title: &str, message: &str) {
        warn!(title, "{}", message);
    }

    fn invoke_diff_tool(&self, request: &DiffRequest) -> GitResult<()>;
}

/// Host that renders nothing and accepts every confirmation
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn invoke_diff_tool(&self, request: &DiffRequest) -> GitResult<()> {
        debug!(
            left = %request.left.display(),
            right = %request.right.display(),
            "diff tool requested without a host"
        );
        Ok(())
    }
}
