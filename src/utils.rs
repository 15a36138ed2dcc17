//! Helpers for output naming and operator-facing messages.

use crate::models::Position;
use chrono::{DateTime, Local};

/// Default output file name: `<prefix>_<YYYYmmdd-HHMMSS>_<source>_<page>_<article>.txt`.
///
/// Embedding the start offsets keeps the files of successive resumed runs
/// apart and records where each one began.
///
/// # Examples
///
/// ```ignore
/// // voa_swahili_20250506-101500_1_2_5.txt
/// default_output_filename("voa_swahili", Position::new(1, 2, 5), Local::now());
/// ```
pub fn default_output_filename(prefix: &str, start: Position, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}_{}_{}.txt",
        prefix,
        now.format("%Y%m%d-%H%M%S"),
        start.source,
        start.page,
        start.article
    )
}

/// Command-line flags that restart a traversal at `position`.
pub fn resume_flags(position: Position) -> String {
    format!(
        "--source-to-start-from {} --page-to-start-from {} --article-to-start-from {}",
        position.source, position.page, position.article
    )
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}
