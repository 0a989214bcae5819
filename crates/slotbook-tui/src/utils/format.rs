use chrono::{DateTime, TimeZone};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// "Tue Jan 02, 2024"
pub fn format_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%a %b %d, %Y").to_string()
}

/// "09:00 - 09:30"
pub fn format_time_range<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

/// "Jan 02 09:00"
pub fn format_short<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%b %d %H:%M").to_string()
}

/// Human description of the time until a slot starts, e.g. "in 3d", "in 2h".
pub fn format_countdown(minutes: i64) -> String {
    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("in {}m", minutes)
    } else if minutes < 1440 {
        format!("in {}h", minutes / 60)
    } else {
        format!("in {}d", minutes / 1440)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Héllo wörld", 6), "Hél...");
    }

    #[test]
    fn test_format_date_and_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        assert_eq!(format_date(&start), "Tue Jan 02, 2024");
        assert_eq!(format_time_range(&start, &end), "09:00 - 09:30");
        assert_eq!(format_short(&end), "Jan 02 09:30");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "now");
        assert_eq!(format_countdown(45), "in 45m");
        assert_eq!(format_countdown(150), "in 2h");
        assert_eq!(format_countdown(3000), "in 2d");
    }
}
