use anyhow::{Result, ensure};

use super::{MAX_TIME_MULTIPLIER, MIN_TIME_MULTIPLIER};
use crate::{GameClock, ScheduledTask, Scheduler, SeasonDate};

/// Game clock plus season calendar and the task scheduler that runs against it.
pub(crate) struct SimulationClock {
    clock: GameClock,
    calendar: SeasonDate,
    day_millis: u64,
    days_per_season: u32,
    day_progress_millis: u64,
    time_multiplier: f64,
    scheduler: Scheduler,
}

pub(crate) struct TickOutcome {
    pub seasons_crossed: u32,
    pub ready_tasks: Vec<ScheduledTask>,
}

impl SimulationClock {
    pub fn new(scheduler: Scheduler, day_millis: u64, days_per_season: u32) -> Self {
        Self {
            clock: GameClock::new(),
            calendar: SeasonDate::from_start(),
            day_millis: day_millis.max(1),
            days_per_season: days_per_season.max(1),
            day_progress_millis: 0,
            time_multiplier: 1.0,
            scheduler,
        }
    }

    pub fn time_multiplier(&self) -> f64 {
        self.time_multiplier
    }

    pub fn set_time_multiplier(&mut self, multiplier: f64) -> Result<f64> {
        ensure!(
            multiplier.is_finite() && multiplier > 0.0,
            "時間倍率は正の有限値で指定してください"
        );
        self.time_multiplier = multiplier.clamp(MIN_TIME_MULTIPLIER, MAX_TIME_MULTIPLIER);
        Ok(self.time_multiplier)
    }

    pub fn calendar_date(&self) -> SeasonDate {
        self.calendar
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.total_millis()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.total_seconds_f64()
    }

    /// Fraction of the current day already elapsed.
    pub fn day_progress(&self) -> f64 {
        self.day_progress_millis as f64 / self.day_millis as f64
    }

    pub fn schedule(&mut self, task: ScheduledTask) {
        self.scheduler.schedule(task);
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn next_task_in_seconds(&self) -> Option<f64> {
        let current = self.clock.total_millis();
        self.scheduler
            .peek_next_millis(current)
            .map(|next| next.saturating_sub(current) as f64 / 1000.0)
    }

    /// Moves game time forward without applying the multiplier.
    pub fn step(&mut self, seconds: f64) -> Result<TickOutcome> {
        ensure!(seconds.is_finite(), "時間が不正です");
        ensure!(seconds > 0.0, "時間は正の値で指定してください");

        let advanced_millis = self.clock.advance_seconds(seconds);
        let seasons_crossed = self.update_calendar(advanced_millis);
        let ready_tasks = self.scheduler.next_ready_tasks(&self.clock);

        Ok(TickOutcome {
            seasons_crossed,
            ready_tasks,
        })
    }

    fn update_calendar(&mut self, advanced_millis: u64) -> u32 {
        self.day_progress_millis += advanced_millis;
        let days = self.day_progress_millis / self.day_millis;
        self.day_progress_millis %= self.day_millis;
        if days == 0 {
            return 0;
        }
        self.calendar.advance_days(days, self.days_per_season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Season, TaskKind};

    #[test]
    fn calendar_follows_day_length() {
        let mut clock = SimulationClock::new(Scheduler::new(), 10_000, 3);
        clock.step(25.0).expect("step");
        assert_eq!(clock.calendar_date().day, 3);
        assert!((clock.day_progress() - 0.5).abs() < 1e-9);

        let outcome = clock.step(10.0).expect("step");
        assert_eq!(outcome.seasons_crossed, 1);
        assert_eq!(clock.calendar_date().season, Season::Summer);
    }

    #[test]
    fn multiplier_is_clamped_and_validated() {
        let mut clock = SimulationClock::new(Scheduler::new(), 10_000, 30);
        assert_eq!(clock.set_time_multiplier(10.0).expect("set"), 5.0);
        assert_eq!(clock.set_time_multiplier(0.01).expect("set"), 0.1);
        assert!(clock.set_time_multiplier(-1.0).is_err());
        assert!(clock.step(0.0).is_err());
    }

    #[test]
    fn step_returns_due_tasks() {
        let mut clock = SimulationClock::new(Scheduler::new(), 10_000, 30);
        clock.schedule(ScheduledTask::new(TaskKind::FarmerRecovery, 1_500));
        assert_eq!(clock.next_task_in_seconds(), Some(1.5));
        assert!(clock.step(1.0).expect("step").ready_tasks.is_empty());
        let ready = clock.step(1.0).expect("step").ready_tasks;
        assert_eq!(ready.len(), 1);
        assert_eq!(clock.pending_tasks(), 0);
    }
}
