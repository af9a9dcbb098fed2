//! Shared helpers used across domains.

use chrono::Duration;

/// Format a remaining duration as whole hours or minutes for
/// human-facing reminder messages.
pub fn format_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "0 minutes".to_string();
    }

    let hours = remaining.num_hours();
    if hours >= 1 {
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        let minutes = remaining.num_minutes().max(1);
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_hours() {
        assert_eq!(format_remaining(Duration::hours(3)), "3 hours");
        assert_eq!(format_remaining(Duration::minutes(90)), "1 hour");
    }

    #[test]
    fn test_minutes_under_an_hour() {
        assert_eq!(format_remaining(Duration::minutes(42)), "42 minutes");
        assert_eq!(format_remaining(Duration::minutes(1)), "1 minute");
    }

    #[test]
    fn test_sub_minute_rounds_up() {
        assert_eq!(format_remaining(Duration::seconds(20)), "1 minute");
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(format_remaining(Duration::seconds(-5)), "0 minutes");
    }
}
