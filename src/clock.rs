use chrono::{Local, TimeZone, Timelike};

pub(crate) const SECOND_MS: i64 = 1_000;
pub(crate) const HOUR_MS: i64 = 3_600 * SECOND_MS;
pub(crate) const DAY_MS: i64 = 24 * HOUR_MS;

/// One wall-clock read, taken once per frame and shared by everything in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Now {
    pub(crate) ms: i64,
    pub(crate) day: String,
    pub(crate) minutes: u32,
}

impl Now {
    pub(crate) fn wall() -> Self {
        Self::at(Local::now().timestamp_millis())
    }

    pub(crate) fn at(ms: i64) -> Self {
        Self {
            ms,
            day: day_key(ms),
            minutes: minutes_of_day(ms),
        }
    }

    /// Same instant shifted by `delta_ms`, with day and minutes re-derived.
    #[cfg(test)]
    pub(crate) fn later(&self, delta_ms: i64) -> Self {
        Self::at(self.ms + delta_ms)
    }
}

/// Local calendar date as `YYYY-MM-DD`.
pub(crate) fn day_key(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).earliest() {
        Some(t) => t.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

pub(crate) fn minutes_of_day(ms: i64) -> u32 {
    Local
        .timestamp_millis_opt(ms)
        .earliest()
        .map(|t| t.hour() * 60 + t.minute())
        .unwrap_or(0)
}

pub(crate) fn fmt_countdown(ms: i64) -> String {
    if ms <= 0 {
        return "now".to_string();
    }
    let secs = ms.saturating_add(SECOND_MS - 1) / SECOND_MS;
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let mins = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours:02}h")
    } else if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else {
        format!("{mins:02}:{:02}", secs % 60)
    }
}

/// Timestamps further than a century from now are treated as garbage.
pub(crate) fn plausible_ms(ms: i64, now_ms: i64) -> bool {
    ms > 0 && ms.abs_diff(now_ms) <= (100 * 365 * DAY_MS) as u64
}

/// Decrement a countdown toward zero, never below it.
pub(crate) fn countdown(t: &mut f32, dt: f32) {
    *t = (*t - dt).max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_bands() {
        assert_eq!(fmt_countdown(0), "now");
        assert_eq!(fmt_countdown(-5_000), "now");
        assert_eq!(fmt_countdown(65 * SECOND_MS), "01:05");
        assert_eq!(fmt_countdown(HOUR_MS + 5 * 60 * SECOND_MS), "1h 05m");
        assert_eq!(fmt_countdown(2 * DAY_MS + 3 * HOUR_MS), "2d 03h");
    }

    #[test]
    fn partial_seconds_round_up() {
        assert_eq!(fmt_countdown(1), "00:01");
    }

    #[test]
    fn countdown_clamps_at_zero() {
        let mut t = 0.1;
        countdown(&mut t, 0.25);
        assert_eq!(t, 0.0);
        countdown(&mut t, 0.25);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn far_off_timestamps_are_implausible() {
        let now = 1_760_000_000_000;
        assert!(plausible_ms(now - 3 * DAY_MS, now));
        assert!(plausible_ms(now + 3 * DAY_MS, now));
        assert!(!plausible_ms(i64::MIN, now));
        assert!(!plausible_ms(i64::MAX, now));
        assert!(!plausible_ms(-1_000_000_000_000_000_000, now));
        assert!(fmt_countdown(i64::MAX).ends_with('h'));
    }

    #[test]
    fn day_key_changes_after_a_day() {
        let now = Now::at(1_760_000_000_000);
        assert_eq!(now.day.len(), 10);
        assert_ne!(now.day, now.later(DAY_MS).day);
        assert!(now.minutes < 24 * 60);
    }
}
