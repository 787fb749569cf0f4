use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};

const DEADLINE_FORMATS: [&str; 3] = ["%d.%m.%Y %H:%M", "%d-%m-%Y %H:%M", "%d/%m/%Y %H:%M"];

/// Parses a user-supplied deadline. Accepted formats: `24.12.2026 23:56`,
/// with `-` or `/` as the date separator. Times are read as UTC.
pub fn parse_deadline(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 32 {
        return None;
    }
    for format in DEADLINE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// End of a voting window opened at `now`: `voting_days` days out, pinned
/// to just past midnight UTC so the daily resolution run picks it up the
/// same night it expires. Proposals filed in the afternoon get one extra
/// day so the window never undercuts the advertised day count.
pub fn voting_end_after(now: DateTime<Utc>, voting_days: i64) -> DateTime<Utc> {
    assert!(voting_days >= 1, "Voting window must be at least one day");
    assert!(voting_days <= 365, "Voting window exceeds defensive bound");

    let days = if now.hour() >= 12 {
        voting_days + 1
    } else {
        voting_days
    };
    let target = now + chrono::Duration::days(days);
    Utc.with_ymd_and_hms(target.year(), target.month(), target.day(), 0, 0, 1)
        .single()
        .expect("midnight UTC is always a valid instant")
}

/// Delay from `now` until the next occurrence of `hour:minute` UTC --
/// later today, or tomorrow when the mark has already passed.
pub fn next_daily_run(now: DateTime<Utc>, hour: u32, minute: u32) -> Duration {
    assert!(hour < 24, "Run hour out of range");
    assert!(minute < 60, "Run minute out of range");

    let today = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, minute, 0)
        .single()
        .expect("wall-clock mark is always a valid instant");
    let target = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };

    let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
    assert!(
        wait <= Duration::from_secs(86_400),
        "Daily delay exceeds one day"
    );
    wait
}

/// The storage layer keeps timezone-aware columns; everything is UTC with
/// a zero offset.
pub fn to_fixed_offset(time: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(0).expect("zero offset is always valid");
    let converted = time.with_timezone(&offset);
    assert!(converted.year() >= 1970, "Timestamp predates Unix epoch");
    converted
}

pub fn fixed_now() -> DateTime<FixedOffset> {
    to_fixed_offset(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn deadline_accepts_all_three_separators() {
        let expected = at(2026, 12, 24, 23, 56);
        assert_eq!(parse_deadline("24.12.2026 23:56"), Some(expected));
        assert_eq!(parse_deadline("24-12-2026 23:56"), Some(expected));
        assert_eq!(parse_deadline("24/12/2026 23:56"), Some(expected));
    }

    #[test]
    fn deadline_rejects_garbage() {
        assert!(parse_deadline("").is_none());
        assert!(parse_deadline("tomorrow").is_none());
        assert!(parse_deadline("2026-12-24T23:56:00Z").is_none());
        assert!(parse_deadline("32.01.2026 10:00").is_none());
    }

    #[test]
    fn voting_end_lands_just_past_midnight() {
        let end = voting_end_after(at(2026, 3, 10, 9, 30), 1);
        assert_eq!(end, at(2026, 3, 11, 0, 0) + chrono::Duration::seconds(1));
    }

    #[test]
    fn afternoon_proposals_get_an_extra_day() {
        let end = voting_end_after(at(2026, 3, 10, 14, 0), 1);
        assert_eq!(end, at(2026, 3, 12, 0, 0) + chrono::Duration::seconds(1));
    }

    #[test]
    fn next_run_later_today() {
        let wait = next_daily_run(at(2026, 5, 1, 22, 0), 23, 30);
        assert_eq!(wait, Duration::from_secs(90 * 60));
    }

    #[test]
    fn next_run_rolls_over_to_tomorrow() {
        let wait = next_daily_run(at(2026, 5, 1, 0, 10), 0, 5);
        assert_eq!(wait, Duration::from_secs(23 * 3600 + 55 * 60));
    }
}
