use std::fmt;

use serde::Serialize;

/// In-game minutes added by one tick.
pub const MINUTES_PER_TICK: u32 = 90;
pub const DAYS_PER_MONTH: u32 = 30;
pub const MONTHS_PER_YEAR: u32 = 12;
pub const DAYS_PER_YEAR: u32 = DAYS_PER_MONTH * MONTHS_PER_YEAR;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Coarsest calendar unit that rolled over during an advance.
///
/// Ordered so that `rollover >= TimeRollover::Day` means "a day passed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRollover {
    None,
    Day,
    Month,
    Year,
}

impl TimeRollover {
    /// `true` for any day, month, or year boundary.
    pub fn crossed_day(self) -> bool {
        self >= TimeRollover::Day
    }
}

/// Calendar clock with 30-day months and 12-month years.
///
/// Starts at 08:00 on day 1, month 1, year 1.
///
/// # Examples
///
/// ```
/// use energy_tycoon::sim::clock::{Clock, TimeRollover};
///
/// let mut clock = Clock::new();
/// assert_eq!(clock.advance(), TimeRollover::None);
/// assert_eq!(clock.time_string(), "09:30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clock {
    minute: u32,
    hour: u32,
    day: u32,
    month: u32,
    year: u32,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            minute: 0,
            hour: 8,
            day: 1,
            month: 1,
            year: 1,
        }
    }

    /// Advances one tick ([`MINUTES_PER_TICK`] minutes).
    ///
    /// # Returns
    ///
    /// The coarsest unit that rolled over.
    pub fn advance(&mut self) -> TimeRollover {
        self.advance_minutes(MINUTES_PER_TICK)
    }

    /// Advances exactly one day, keeping the time of day.
    pub fn advance_day(&mut self) -> TimeRollover {
        self.advance_minutes(MINUTES_PER_DAY)
    }

    /// Advances by `minutes`, cascading overflow up to the year.
    ///
    /// At most one day boundary is reported per call; advances longer than a
    /// day are not used by the engine.
    pub fn advance_minutes(&mut self, minutes: u32) -> TimeRollover {
        let total = self.hour * 60 + self.minute + minutes;
        self.hour = (total / 60) % 24;
        self.minute = total % 60;
        let days = total / MINUTES_PER_DAY;

        let mut rollover = TimeRollover::None;
        for _ in 0..days {
            rollover = rollover.max(self.next_day());
        }
        rollover
    }

    fn next_day(&mut self) -> TimeRollover {
        self.day += 1;
        if self.day <= DAYS_PER_MONTH {
            return TimeRollover::Day;
        }
        self.day = 1;
        self.month += 1;
        if self.month <= MONTHS_PER_YEAR {
            return TimeRollover::Month;
        }
        self.month = 1;
        self.year += 1;
        TimeRollover::Year
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    /// Days since the start of the calendar, counting the first day as 1.
    pub fn total_days(&self) -> u32 {
        (self.year - 1) * DAYS_PER_YEAR + (self.month - 1) * DAYS_PER_MONTH + self.day
    }

    /// `"Day D, Month M, Year Y"`.
    pub fn date_string(&self) -> String {
        format!("Day {}, Month {}, Year {}", self.day, self.month, self.year)
    }

    /// `"HH:MM"`.
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Coarse label for the current hour.
    pub fn time_of_day(&self) -> &'static str {
        match self.hour {
            0..=5 => "night",
            6..=11 => "morning",
            12..=17 => "afternoon",
            _ => "evening",
        }
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_string(), self.time_string())
    }
}
