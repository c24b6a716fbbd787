//! Supervisord pid file resolution

use std::path::Path;
use tracing::debug;

use crate::workspace::PID_FILE_NAME;

/// Read the supervisord pid from `<pid_dir>/supervisord.pid`
///
/// Returns `None` when the file is absent or unreadable, or when its content
/// does not yield a positive pid. Only the leading integer is considered, so
/// `"1234\n"` and `"1234 trailing"` both resolve to 1234.
pub fn read_pid(pid_dir: &Path) -> Option<u32> {
    let path = pid_dir.join(PID_FILE_NAME);
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let pid = parse_pid(&content);
            if pid.is_none() {
                debug!("Ignoring pid file {:?} without a usable pid", path);
            }
            pid
        }
        Err(e) => {
            debug!("Pid file {:?} unreadable: {}", path, e);
            None
        }
    }
}

/// Parse the leading integer of `content`
///
/// Zero, negative values and content without leading digits yield `None`.
pub fn parse_pid(content: &str) -> Option<u32> {
    let trimmed = content.trim_start();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    match trimmed[..digits_end].parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(pid) => Some(pid),
    }
}
