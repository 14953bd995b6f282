/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format the time left on a session, e.g. "29m" or "<1m".
pub fn format_remaining(minutes: Option<i64>) -> String {
    match minutes {
        None => "expired".to_string(),
        Some(m) if m <= 0 => "<1m".to_string(),
        Some(m) if m < 60 => format!("{}m", m),
        Some(m) => format!("{}h {}m", m / 60, m % 60),
    }
}
