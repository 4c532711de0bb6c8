use std::time::Duration;

use time_humanize::{Accuracy, HumanTime, Tense};

/// `MM:SS`, or `H:MM:SS` once an hour or more is left.
pub fn format_clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Rough English duration, e.g. "2 minutes".
pub fn humanize_seconds(seconds: u64) -> String {
    if seconds == 0 {
        return "no time".to_string();
    }
    HumanTime::from(Duration::from_secs(seconds)).to_text_en(Accuracy::Rough, Tense::Present)
}

/// Whole-number percentage of `part` in `total`; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u64 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u64
    }
}
