//! Shared formatting helpers.

use std::time::Duration;

/// Format a wall-clock runtime as human-readable: `"5s"`, `"3m 5s"`, `"2h 4m"`.
pub fn format_runtime(runtime: Duration) -> String {
    let secs = runtime.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
