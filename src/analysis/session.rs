//! Trading-session gate for the intraday jobs

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Trading days and inclusive local-time bounds of the market session
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSession {
    timezone: Tz,
    open: NaiveTime,
    close: NaiveTime,
    days: Vec<Weekday>,
}

impl MarketSession {
    pub fn new(timezone: Tz, open: NaiveTime, close: NaiveTime, days: Vec<Weekday>) -> Self {
        Self {
            timezone,
            open,
            close,
            days,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Whether `now` falls on a trading day between open and close (both inclusive).
    /// Compared at minute resolution, so 15:40:59 still counts as 15:40.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);
        if !self.days.contains(&local.weekday()) {
            return false;
        }
        let minutes = local.hour() * 60 + local.minute();
        let open = self.open.hour() * 60 + self.open.minute();
        let close = self.close.hour() * 60 + self.close.minute();
        minutes >= open && minutes <= close
    }

    pub fn is_open(&self) -> bool {
        self.is_open_at(Utc::now())
    }

    /// Calendar date of `now` in the market timezone
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

impl Default for MarketSession {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 40, 0).unwrap_or(NaiveTime::MIN),
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}
