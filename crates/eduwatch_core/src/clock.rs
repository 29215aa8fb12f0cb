//! Time source for row stamping and "today" queries.
//!
//! # Invariants
//! - `now()` uses the same text layout as SQLite `CURRENT_TIMESTAMP`
//!   (`YYYY-MM-DD HH:MM:SS`, UTC), so stamped and defaulted rows compare.
//! - `today()` is the date prefix of `now()`.

use chrono::{NaiveDateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait Clock {
    /// Current instant formatted as `YYYY-MM-DD HH:MM:SS`.
    fn now(&self) -> String;

    /// Current date formatted as `YYYY-MM-DD`.
    fn today(&self) -> String {
        self.now().chars().take(10).collect()
    }
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Utc::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Clock pinned to one instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, SystemClock};
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_formats_like_current_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), "2024-03-09 07:05:00");
        assert_eq!(clock.today(), "2024-03-09");
    }

    #[test]
    fn system_clock_today_is_date_prefix() {
        let today = SystemClock.today();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
    }
}
