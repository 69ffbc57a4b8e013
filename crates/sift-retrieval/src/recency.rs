//! Publication-date parsing and the age-based score steps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a provider-reported publication date.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD`, `YYYY/MM/DD` and a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp (read as UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    ["%Y-%m-%d", "%Y/%m/%d"].iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Whole days between publication and `now`. Future dates count as 0.
pub fn age_in_days(published: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    let published = parse_published(published?)?;
    Some((now - published).num_days().max(0))
}

/// Score bonus for fresh results: ≤3 days +0.12, ≤7 +0.08, ≤30 +0.05.
pub fn recency_bonus(age_days: Option<i64>) -> f64 {
    match age_days {
        Some(d) if d <= 3 => 0.12,
        Some(d) if d <= 7 => 0.08,
        Some(d) if d <= 30 => 0.05,
        _ => 0.0,
    }
}

/// Time-decay score used by credibility: 1.0 / 0.9 / 0.8 / 0.7 at the
/// 7 / 30 / 90 / 365 day boundaries, 0.6 beyond. Unknown dates score 0.6.
pub fn time_score(age_days: Option<i64>) -> f64 {
    match age_days {
        Some(d) if d <= 7 => 1.0,
        Some(d) if d <= 30 => 0.9,
        Some(d) if d <= 90 => 0.8,
        Some(d) if d <= 365 => 0.7,
        _ => 0.6,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn parses_common_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();

        assert_eq!(parse_published("2024-03-05"), Some(expected));
        assert_eq!(parse_published("2024/03/05"), Some(expected));
        assert_eq!(parse_published("2024-03-05T00:00:00Z"), Some(expected));
        assert_eq!(parse_published("2024-03-05T00:00:00"), Some(expected));
        assert_eq!(parse_published("Tue, 05 Mar 2024 00:00:00 +0000"), Some(expected));
        assert_eq!(parse_published("last tuesday"), None);
        assert_eq!(parse_published(""), None);
    }

    #[test]
    fn age_is_clamped_at_zero_for_future_dates() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(age_in_days(Some("2024-03-10"), now), Some(0));
        assert_eq!(age_in_days(Some("2024-03-01"), now), Some(4));
        assert_eq!(age_in_days(None, now), None);
    }

    #[test]
    fn recency_bonus_steps() {
        assert_eq!(recency_bonus(Some(0)), 0.12);
        assert_eq!(recency_bonus(Some(3)), 0.12);
        assert_eq!(recency_bonus(Some(4)), 0.08);
        assert_eq!(recency_bonus(Some(30)), 0.05);
        assert_eq!(recency_bonus(Some(31)), 0.0);
        assert_eq!(recency_bonus(None), 0.0);
    }

    #[test]
    fn time_score_steps() {
        let now = Utc::now();
        let days_ago = |d: i64| (now - Duration::days(d)).to_rfc3339();

        assert_eq!(time_score(age_in_days(Some(&days_ago(2)), now)), 1.0);
        assert_eq!(time_score(Some(30)), 0.9);
        assert_eq!(time_score(Some(90)), 0.8);
        assert_eq!(time_score(Some(365)), 0.7);
        assert_eq!(time_score(Some(366)), 0.6);
        assert_eq!(time_score(None), 0.6);
    }
}
