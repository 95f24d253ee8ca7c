use colored::Colorize;

/// Color a workflow state for terminal output.
pub fn format_state(state: &str) -> String {
    match state {
        "resolved" => state.green().to_string(),
        "failed" | "escalated" => state.red().to_string(),
        "remediating" | "verifying" => state.yellow().to_string(),
        _ => state.to_string(),
    }
}

/// Rough age relative to now, from an epoch-ms timestamp.
pub fn format_age_ms(created_at_ms: i64) -> String {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let age_s = ((now_ms - created_at_ms).max(0)) / 1000;
    if age_s < 60 {
        format!("{age_s}s")
    } else if age_s < 3600 {
        format!("{}m", age_s / 60)
    } else if age_s < 86_400 {
        format!("{}h", age_s / 3600)
    } else {
        format!("{}d", age_s / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets() {
        let now = chrono::Utc::now().timestamp_millis();
        assert_eq!(format_age_ms(now), "0s");
        assert_eq!(format_age_ms(now - 90_000), "1m");
        assert_eq!(format_age_ms(now - 2 * 3_600_000), "2h");
        assert_eq!(format_age_ms(now - 3 * 86_400_000), "3d");
    }

    #[test]
    fn unknown_state_passes_through() {
        assert_eq!(format_state("received"), "received");
    }
}
