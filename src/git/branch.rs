use regex::Regex;
use std::sync::LazyLock;

static RE_CURRENT_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\s*(\w+)\s+(\w+)\s*(.*)$").expect("invalid RE_CURRENT_BRANCH regex")
});
static RE_TRACKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]").expect("invalid RE_TRACKING regex"));
static RE_BEHIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"behind\s+(\d+)").expect("invalid RE_BEHIND regex"));
static RE_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ahead\s+(\d+)").expect("invalid RE_AHEAD regex"));

/// Current branch as reported by `git branch -vv`
///
/// Upstream, remote and the ahead/behind counters are always derived
/// together from a single line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchState {
    pub branch: String,
    pub last_commit: String,
    /// Raw `*` line the state was parsed from
    pub info: String,
    /// `remote/branch`, empty when the branch tracks nothing
    pub upstream: String,
    /// Part of `upstream` before its first `/`
    pub remote: String,
    pub ahead: u32,
    pub behind: u32,
}

impl BranchState {
    pub fn has_upstream(&self) -> bool {
        !self.upstream.is_empty() && !self.remote.is_empty()
    }
}

/// Parse the current-branch line, e.g.
/// `* main a1b2c3d [origin/main: ahead 2, behind 1] msg`
///
/// Returns `None` when the line does not look like a current-branch line.
pub fn parse_branch_info(line: &str) -> Option<BranchState> {
    let caps = RE_CURRENT_BRANCH.captures(line)?;

    let mut state = BranchState {
        branch: caps[1].to_string(),
        last_commit: caps[2].to_string(),
        info: line.to_string(),
        ..Default::default()
    };

    // Only the bracket is tracking info; the commit subject follows it
    let relations = &caps[3];
    if let Some(tracking) = RE_TRACKING.captures(relations).and_then(|c| c.get(1)) {
        let tracking = tracking.as_str();
        let upstream = tracking.split(':').next().unwrap_or_default();
        state.upstream = upstream.trim().to_string();
        state.remote = state
            .upstream
            .split_once('/')
            .map(|(remote, _)| remote.to_string())
            .unwrap_or_default();

        state.behind = capture_count(&RE_BEHIND, tracking);
        state.ahead = capture_count(&RE_AHEAD, tracking);
    }

    Some(state)
}

/// Find the `*` line in full `branch -vv` output and parse it
pub fn parse_branch_output(output: &str) -> Option<BranchState> {
    output
        .lines()
        .filter(|line| line.starts_with('*'))
        .find_map(parse_branch_info)
}

fn capture_count(re: &Regex, text: &str) -> u32 {
    re.captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}
