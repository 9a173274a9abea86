use std::cmp::Ordering;

/// Case-insensitive string comparison
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive substring check
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

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

/// Format an RFC 3339 timestamp for list display
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y %H:%M").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("alice", "Bruno"), Ordering::Less);
        assert_eq!(cmp_ignore_case("ZOE", "zoe"), Ordering::Equal);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Quarterly REPORT", "report"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("lunch", "dinner"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Señor Díaz", 6), "Señ...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05T12:30:00Z"), "Mar 05, 2024 12:30");
        assert_eq!(format_date("2024-03-05 garbage"), "2024-03-05");
        assert_eq!(format_date("soon"), "soon");
    }
}
