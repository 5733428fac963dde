use chrono::{DateTime, Local, TimeZone};

/// Pretty format understood by [`parse_log_line`]
pub const LOG_FORMAT: &str = "--pretty=format:%at|%s|%h|%an";

/// Represents a commit from `git log`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub short_hash: String,
    pub author: String,
}

/// Parse one `%at|%s|%h|%an` line
///
/// Anything other than exactly four fields, or an epoch that is not an
/// integer, yields `None`.
pub fn parse_log_line(line: &str) -> Option<LogRecord> {
    let fields: Vec<&str> = line.split('|').collect();
    let [epoch, message, short_hash, author] = fields.as_slice() else {
        return None;
    };

    let seconds = epoch.trim().parse::<i64>().ok()?;
    let timestamp = Local.timestamp_opt(seconds, 0).single()?;

    Some(LogRecord {
        timestamp,
        message: message.to_string(),
        short_hash: short_hash.to_string(),
        author: author.to_string(),
    })
}

/// Parse full log output, skipping malformed lines
pub fn parse_log(output: &str) -> Vec<LogRecord> {
    output.lines().filter_map(parse_log_line).collect()
}
