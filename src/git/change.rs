use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Status of one path, derived from its two-character porcelain tag
    ///
    /// Position 0 of the tag is the index (staged) side, position 1 the
    /// worktree (unstaged) side.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u32 {
        const UNTRACKED = 1 << 0;
        const HAS_STAGED_CHANGES = 1 << 1;
        const HAS_UNSTAGED_CHANGES = 1 << 2;
        const DELETED = 1 << 3;
        const RENAMED = 1 << 4;
        const UNRESOLVED = 1 << 5;
        const IGNORED = 1 << 6;
    }
}

impl StatusFlags {
    /// Derive flags from a porcelain status tag such as `"M "` or `"??"`
    pub fn from_tag(tag: &str) -> Self {
        let mut chars = tag.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            return Self::empty();
        };

        let mut flags = if index == 'U' || worktree == 'U' || tag == "AA" || tag == "DD" {
            Self::UNRESOLVED
        } else {
            match index {
                '!' => Self::IGNORED,
                '?' => Self::UNTRACKED,
                'R' => Self::HAS_STAGED_CHANGES | Self::RENAMED,
                'D' => Self::HAS_STAGED_CHANGES | Self::DELETED,
                ' ' => Self::empty(),
                _ => Self::HAS_STAGED_CHANGES,
            }
        };

        if worktree != ' ' && worktree != '!' {
            flags |= Self::HAS_UNSTAGED_CHANGES;
        }

        flags
    }
}

/// Where tracked assets live and how their sidecar files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub asset_root: String,
    pub sidecar_suffix: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            asset_root: "Assets".to_string(),
            sidecar_suffix: ".meta".to_string(),
        }
    }
}

/// One path reported by `status --porcelain`, `diff --name-only` or similar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    path: String,
    source_path: String,
    name: String,
    status_tag: String,
    flags: StatusFlags,
    is_tracked_asset: bool,
    is_sidecar: bool,
    is_directory: bool,
    sidecar_suffix: String,
    /// Keep the local version of this path when pulling
    pub discard_remote_on_pull: bool,
    /// Toggled in the host's file list
    pub selected: bool,
}

impl ChangeRecord {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pre-rename path, empty unless the record is a rename
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status_tag(&self) -> &str {
        &self.status_tag
    }

    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    pub fn is_tracked_asset(&self) -> bool {
        self.is_tracked_asset
    }

    pub fn is_sidecar(&self) -> bool {
        self.is_sidecar
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// True when every bit of `status` is set
    pub fn has_status(&self, status: StatusFlags) -> bool {
        self.flags.contains(status)
    }

    pub fn is_modified(&self) -> bool {
        self.status_tag.contains('M')
    }

    pub fn is_deleted(&self) -> bool {
        self.status_tag.contains('D')
    }

    /// Paths that must move together with this record
    ///
    /// A sidecar drags its primary file along and a tracked asset drags its
    /// sidecar along. The record's own path always comes first.
    pub fn pathspecs(&self) -> Vec<String> {
        if self.is_sidecar {
            let primary = self
                .path
                .strip_suffix(self.sidecar_suffix.as_str())
                .unwrap_or(&self.path);
            vec![self.path.clone(), primary.to_string()]
        } else if self.is_tracked_asset {
            vec![self.path.clone(), format!("{}{}", self.path, self.sidecar_suffix)]
        } else {
            vec![self.path.clone()]
        }
    }

    /// `pathspecs` rendered as a double-quoted, space separated list
    pub fn quoted_paths(&self) -> String {
        self.pathspecs()
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source_path.is_empty() {
            write!(f, "{} {}", self.status_tag, self.path)
        } else {
            write!(f, "{} {} -> {}", self.status_tag, self.source_path, self.path)
        }
    }
}

/// Parse one status line (or a bare path when `name_only`) into a record
///
/// Returns `None` for lines shorter than four characters and for `#` header
/// lines.
pub fn parse_change_line(line: &str, name_only: bool, layout: &AssetLayout) -> Option<ChangeRecord> {
    if line.chars().count() < 4 || line.starts_with('#') {
        return None;
    }

    let (status_tag, rest) = if name_only {
        ("  ", line)
    } else {
        (line.get(..2)?, line.get(3..)?)
    };

    let (source_path, path) = match rest.find("->") {
        Some(pos) if pos > 0 => (rest[..pos].trim(), &rest[pos + 2..]),
        _ => ("", rest),
    };

    let source_path = source_path.replace('"', "");
    let mut path = path.replace('"', "").trim().to_string();

    let is_directory = path.ends_with('/');
    let name = {
        let segments: Vec<&str> = path.split('/').collect();
        let idx = if is_directory {
            segments.len().saturating_sub(2)
        } else {
            segments.len() - 1
        };
        segments[idx].to_string()
    };
    if is_directory {
        path.pop();
    }

    let flags = if name_only {
        StatusFlags::empty()
    } else {
        StatusFlags::from_tag(status_tag)
    };

    Some(ChangeRecord {
        is_tracked_asset: path.starts_with(layout.asset_root.as_str()),
        is_sidecar: path.ends_with(layout.sidecar_suffix.as_str()),
        is_directory,
        sidecar_suffix: layout.sidecar_suffix.clone(),
        source_path: source_path.trim().to_string(),
        status_tag: status_tag.to_string(),
        flags,
        name,
        path,
        discard_remote_on_pull: false,
        selected: false,
    })
}

/// Parse every line of a status or `--name-only` listing, skipping rejects
pub fn parse_status_output(output: &str, name_only: bool, layout: &AssetLayout) -> Vec<ChangeRecord> {
    output
        .lines()
        .filter_map(|line| parse_change_line(line, name_only, layout))
        .collect()
}
