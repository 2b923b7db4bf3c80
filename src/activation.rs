//! Activation decision for the shade overlay
//!
//! Pure functions: the caller supplies `now`, nothing here reads the
//! clock or logs. Suppressing conditions are evaluated in a strict
//! order, short-circuiting on the first match.

use chrono::{DateTime, Local, NaiveTime};

use crate::settings::{DailyOff, Settings};

/// Why the overlay is currently suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Master switch is off
    Disabled,
    /// Inside a snooze window; `until` is the expiry in epoch millis
    Snoozed { until: i64 },
    /// The evaluated host carries an exception flag
    SiteExcluded,
    /// Inside the recurring daily-off window
    DailyOff,
}

/// First suppressing condition in precedence order, or None when the
/// overlay should be active.
pub fn suppression(settings: &Settings, host: &str, now: DateTime<Local>) -> Option<Suppression> {
    if !settings.enabled {
        return Some(Suppression::Disabled);
    }
    if settings.temporary_off_until > 0 && now.timestamp_millis() < settings.temporary_off_until {
        return Some(Suppression::Snoozed {
            until: settings.temporary_off_until,
        });
    }
    if settings.site_exceptions.get(host).copied().unwrap_or(false) {
        return Some(Suppression::SiteExcluded);
    }
    if is_within_daily_off(&settings.daily_off, now) {
        return Some(Suppression::DailyOff);
    }
    None
}

pub fn should_activate(settings: &Settings, host: &str, now: DateTime<Local>) -> bool {
    suppression(settings, host, now).is_none()
}

/// Whether `now` falls inside the daily-off window.
///
/// `start == end` means "always off" (a zero-width window degenerates to
/// the full day). A window with `start > end` wraps past midnight.
/// Unparseable time strings disable the window rather than propagating
/// invalid instants into the comparison.
pub fn is_within_daily_off(daily: &DailyOff, now: DateTime<Local>) -> bool {
    if !daily.enabled {
        return false;
    }
    let (Some(start), Some(end)) = (parse_hhmm(&daily.start), parse_hhmm(&daily.end)) else {
        return false;
    };
    if start == end {
        return true;
    }
    let t = now.time();
    if start <= end {
        t >= start && t <= end
    } else {
        t >= start || t <= end
    }
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, hour, min, 0).unwrap()
    }

    fn daily(enabled: bool, start: &str, end: &str) -> DailyOff {
        DailyOff {
            enabled,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn disabled_window_never_suppresses() {
        assert!(!is_within_daily_off(&daily(false, "00:00", "23:59"), at(12, 0)));
    }

    #[test]
    fn non_crossing_window_is_inclusive() {
        let d = daily(true, "09:00", "17:00");
        assert!(!is_within_daily_off(&d, at(8, 59)));
        assert!(is_within_daily_off(&d, at(9, 0)));
        assert!(is_within_daily_off(&d, at(12, 30)));
        assert!(is_within_daily_off(&d, at(17, 0)));
        assert!(!is_within_daily_off(&d, at(17, 1)));
    }

    #[test]
    fn midnight_crossing_window() {
        let d = daily(true, "22:00", "07:00");
        assert!(is_within_daily_off(&d, at(23, 30)));
        assert!(is_within_daily_off(&d, at(6, 30)));
        assert!(!is_within_daily_off(&d, at(12, 0)));
        // Boundaries are inclusive on both sides
        assert!(is_within_daily_off(&d, at(22, 0)));
        assert!(is_within_daily_off(&d, at(7, 0)));
        assert!(!is_within_daily_off(&d, at(7, 1)));
    }

    #[test]
    fn equal_start_and_end_means_always_off() {
        let d = daily(true, "08:00", "08:00");
        for (h, m) in [(0, 0), (8, 0), (12, 34), (23, 59)] {
            assert!(is_within_daily_off(&d, at(h, m)));
        }
    }

    #[test]
    fn malformed_times_disable_the_window() {
        for (start, end) in [("banana", "07:00"), ("22:00", "7pm"), ("", "")] {
            assert!(!is_within_daily_off(&daily(true, start, end), at(23, 0)));
        }
    }

    #[test]
    fn master_switch_wins_over_everything() {
        let mut s = Settings::default();
        s.enabled = false;
        s.temporary_off_until = at(12, 0).timestamp_millis() + 60_000;
        s.site_exceptions.insert("example.com".to_string(), true);
        s.daily_off = daily(true, "00:00", "23:59");
        assert_eq!(
            suppression(&s, "example.com", at(12, 0)),
            Some(Suppression::Disabled)
        );
    }

    #[test]
    fn snooze_is_checked_before_site_and_daily() {
        let now = at(12, 0);
        let until = now.timestamp_millis() + 30 * 60_000;
        let mut s = Settings::default();
        s.temporary_off_until = until;
        s.site_exceptions.insert("example.com".to_string(), true);
        s.daily_off = daily(true, "00:00", "23:59");
        assert_eq!(
            suppression(&s, "example.com", now),
            Some(Suppression::Snoozed { until })
        );
    }

    #[test]
    fn expired_snooze_is_inert_and_later_checks_apply() {
        let now = at(12, 0);
        let mut s = Settings::default();
        s.temporary_off_until = now.timestamp_millis() - 1;
        s.site_exceptions.insert("example.com".to_string(), true);
        assert_eq!(
            suppression(&s, "example.com", now),
            Some(Suppression::SiteExcluded)
        );
        assert!(should_activate(&s, "other.org", now));
    }

    #[test]
    fn snooze_becomes_inactive_once_the_clock_passes_it() {
        let mut s = Settings::default();
        let expiry = at(12, 30).timestamp_millis();
        s.temporary_off_until = expiry;
        assert!(!should_activate(&s, "example.com", at(12, 0)));
        // Same record, later wall clock: the record is unchanged but the
        // snooze no longer applies.
        assert!(should_activate(&s, "example.com", at(12, 31)));
        assert_eq!(s.temporary_off_until, expiry);
    }

    #[test]
    fn site_exception_only_matches_its_own_host() {
        let mut s = Settings::default();
        s.site_exceptions.insert("example.com".to_string(), true);
        let now = at(12, 0);
        assert!(!should_activate(&s, "example.com", now));
        assert!(should_activate(&s, "sub.example.com", now));
        assert!(should_activate(&s, "other.org", now));
    }

    #[test]
    fn false_exception_flag_does_not_suppress() {
        let mut s = Settings::default();
        s.site_exceptions.insert("example.com".to_string(), false);
        assert!(should_activate(&s, "example.com", at(12, 0)));
    }

    #[test]
    fn daily_window_suppresses_last() {
        let mut s = Settings::default();
        s.daily_off = daily(true, "22:00", "07:00");
        assert_eq!(
            suppression(&s, "example.com", at(23, 0)),
            Some(Suppression::DailyOff)
        );
        assert!(should_activate(&s, "example.com", at(12, 0)));
    }

    #[test]
    fn default_record_is_active() {
        assert!(should_activate(&Settings::default(), "example.com", at(12, 0)));
    }
}
