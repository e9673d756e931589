use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    total_millis: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self { total_millis: 0 }
    }

    pub fn total_millis(&self) -> u64 {
        self.total_millis
    }

    pub fn total_seconds_f64(&self) -> f64 {
        self.total_millis as f64 / 1000.0
    }

    pub fn advance_seconds(&mut self, seconds: f64) -> u64 {
        let millis = (seconds * 1000.0).round() as i64;
        assert!(millis >= 0, "advance_seconds に負数は指定できません");
        self.total_millis = self.total_millis.saturating_add(millis as u64);
        millis as u64
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "春",
            Season::Summer => "夏",
            Season::Autumn => "秋",
            Season::Winter => "冬",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonDate {
    pub year: u32,
    pub season: Season,
    pub day: u32,
}

impl SeasonDate {
    pub fn new(year: u32, season: Season, day: u32) -> Self {
        Self { year, season, day }
    }

    pub fn from_start() -> Self {
        Self::new(1, Season::Spring, 1)
    }

    /// Returns the number of season boundaries crossed.
    pub fn advance_days(&mut self, days: u64, days_per_season: u32) -> u32 {
        let days_per_season = days_per_season.max(1) as u64;
        let mut crossed = 0;
        let mut remaining = days;
        while remaining > 0 {
            let left_in_season = days_per_season - self.day as u64;
            if remaining <= left_in_season {
                self.day += remaining as u32;
                break;
            }
            remaining -= left_in_season + 1;
            self.day = 1;
            crossed += 1;
            if self.season == Season::Winter {
                self.year += 1;
            }
            self.season = self.season.next();
        }
        crossed
    }
}

impl fmt::Display for SeasonDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}年目 {} {}日",
            self.year,
            self.season.label(),
            self.day
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTime {
    pub millis: u64,
}

impl ScheduledTime {
    pub fn new(millis: u64) -> Self {
        Self { millis }
    }
}

impl Ord for ScheduledTime {
    fn cmp(&self, other: &Self) -> Ordering {
        other.millis.cmp(&self.millis)
    }
}

impl PartialOrd for ScheduledTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_rounds_to_millis() {
        let mut clock = GameClock::new();
        assert_eq!(clock.advance_seconds(1.25), 1250);
        assert_eq!(clock.advance_seconds(0.0004), 0);
        assert_eq!(clock.total_millis(), 1250);
        assert!((clock.total_seconds_f64() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn season_date_rolls_into_next_year() {
        let mut date = SeasonDate::from_start();
        let crossed = date.advance_days(29, 30);
        assert_eq!(crossed, 0);
        assert_eq!(date.day, 30);

        let crossed = date.advance_days(1, 30);
        assert_eq!(crossed, 1);
        assert_eq!(date.season, Season::Summer);
        assert_eq!(date.day, 1);

        let crossed = date.advance_days(90, 30);
        assert_eq!(crossed, 3);
        assert_eq!(date.year, 2);
        assert_eq!(date.season, Season::Spring);
        assert_eq!(date.day, 1);
    }

    #[test]
    fn scheduled_time_orders_earliest_first() {
        let early = ScheduledTime::new(10);
        let late = ScheduledTime::new(20);
        assert!(early > late);
    }
}
