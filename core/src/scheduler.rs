use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use crate::time::{GameClock, ScheduledTime};

pub const DEFAULT_HORIZON_MILLIS: u64 = 10 * 60 * 1000;
pub const DEFAULT_BUCKET_MILLIS: u64 = 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    DailyUpkeep,
    ConstructionComplete(u64),
    ResearchComplete(u64),
    FarmerRecovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSpec {
    EveryMillis(u64),
    Daily(u64),
}

impl ScheduleSpec {
    fn next_execution_millis(&self, last_execution: u64) -> u64 {
        match self {
            ScheduleSpec::EveryMillis(millis) => last_execution + (*millis).max(1),
            ScheduleSpec::Daily(day_millis) => last_execution + (*day_millis).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub execute_at: ScheduledTime,
    pub schedule_spec: Option<ScheduleSpec>,
    sequence: u64,
}

impl ScheduledTask {
    pub fn new(kind: TaskKind, execute_at: u64) -> Self {
        Self {
            kind,
            execute_at: ScheduledTime::new(execute_at),
            schedule_spec: None,
            sequence: 0,
        }
    }

    pub fn with_schedule(mut self, spec: ScheduleSpec) -> Self {
        self.schedule_spec = Some(spec);
        self
    }

    fn reschedule(&self) -> Option<Self> {
        self.schedule_spec.map(|spec| {
            let next_millis = spec.next_execution_millis(self.execute_at.millis);
            let mut next_task = self.clone();
            next_task.execute_at = ScheduledTime::new(next_millis);
            next_task
        })
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.execute_at
            .cmp(&other.execute_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct Scheduler {
    now_millis: u64,
    horizon_millis: u64,
    bucket_millis: u64,
    next_sequence: u64,
    immediate_queue: VecDeque<ScheduledTask>,
    short_term_tasks: BinaryHeap<ScheduledTask>,
    long_term_buckets: BTreeMap<u64, Vec<ScheduledTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_horizon(DEFAULT_HORIZON_MILLIS, DEFAULT_BUCKET_MILLIS)
    }

    pub fn with_horizon(horizon_millis: u64, bucket_millis: u64) -> Self {
        Self {
            now_millis: 0,
            horizon_millis,
            bucket_millis: bucket_millis.max(1),
            next_sequence: 0,
            immediate_queue: VecDeque::new(),
            short_term_tasks: BinaryHeap::new(),
            long_term_buckets: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.immediate_queue.len()
            + self.short_term_tasks.len()
            + self
                .long_term_buckets
                .values()
                .map(|bucket| bucket.len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schedule(&mut self, mut task: ScheduledTask) {
        task.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.place(task);
    }

    fn place(&mut self, task: ScheduledTask) {
        if task.execute_at.millis <= self.now_millis {
            self.immediate_queue.push_back(task);
            return;
        }

        if task.execute_at.millis <= self.now_millis + self.horizon_millis {
            self.short_term_tasks.push(task);
        } else {
            let bucket_index = task.execute_at.millis / self.bucket_millis;
            self.long_term_buckets
                .entry(bucket_index)
                .or_default()
                .push(task);
        }
    }

    fn promote_long_term(&mut self) {
        let limit = self.now_millis + self.horizon_millis;
        while let Some((&index, _)) = self.long_term_buckets.first_key_value() {
            if index * self.bucket_millis > limit {
                break;
            }
            let Some(bucket) = self.long_term_buckets.remove(&index) else {
                break;
            };
            for task in bucket {
                if task.execute_at.millis <= self.now_millis {
                    self.immediate_queue.push_back(task);
                } else {
                    self.short_term_tasks.push(task);
                }
            }
        }
    }

    pub fn peek_next_millis(&self, current: u64) -> Option<u64> {
        if self
            .immediate_queue
            .iter()
            .any(|task| task.execute_at.millis <= current)
        {
            return Some(current);
        }
        let heap_next = self.short_term_tasks.peek().map(|task| task.execute_at.millis);
        let immediate_next = self
            .immediate_queue
            .iter()
            .map(|task| task.execute_at.millis)
            .min();
        let bucket_next = self
            .long_term_buckets
            .values()
            .next()
            .and_then(|bucket| bucket.iter().map(|task| task.execute_at.millis).min());
        [heap_next, immediate_next, bucket_next]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn next_ready_tasks(&mut self, clock: &GameClock) -> Vec<ScheduledTask> {
        self.now_millis = clock.total_millis();
        self.promote_long_term();

        let mut ready = Vec::new();
        while let Some(task) = self.immediate_queue.pop_front() {
            ready.push(task);
        }

        let now = self.now_millis;
        while self
            .short_term_tasks
            .peek()
            .is_some_and(|task| task.execute_at.millis <= now)
        {
            if let Some(task) = self.short_term_tasks.pop() {
                ready.push(task);
            }
        }

        ready.sort_by(|a, b| {
            a.execute_at
                .millis
                .cmp(&b.execute_at.millis)
                .then(a.sequence.cmp(&b.sequence))
        });

        for task in &ready {
            if let Some(next_task) = task.reschedule() {
                self.schedule(next_task);
            }
        }

        ready
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_ready_tasks_by_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledTask::new(TaskKind::DailyUpkeep, 5_000));
        scheduler.schedule(ScheduledTask::new(TaskKind::ConstructionComplete(1), 120_000));
        scheduler.schedule(ScheduledTask::new(
            TaskKind::ResearchComplete(2),
            DEFAULT_HORIZON_MILLIS * 3,
        ));

        let mut clock = GameClock::new();
        clock.advance_seconds(5.0);
        let ready_now = scheduler.next_ready_tasks(&clock);
        assert_eq!(ready_now.len(), 1);
        assert_eq!(ready_now[0].kind, TaskKind::DailyUpkeep);

        clock.advance_seconds(180.0);
        let ready_later = scheduler.next_ready_tasks(&clock);
        assert_eq!(ready_later.len(), 1);
        assert_eq!(ready_later[0].kind, TaskKind::ConstructionComplete(1));

        let mut far_clock = GameClock::new();
        far_clock.advance_seconds((DEFAULT_HORIZON_MILLIS * 3) as f64 / 1000.0);
        let ready_far = scheduler.next_ready_tasks(&far_clock);
        assert!(
            ready_far
                .iter()
                .any(|task| task.kind == TaskKind::ResearchComplete(2))
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn repeating_schedule_spec_requeues_task() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(
            ScheduledTask::new(TaskKind::DailyUpkeep, 10_000)
                .with_schedule(ScheduleSpec::Daily(10_000)),
        );

        let mut clock = GameClock::new();
        clock.advance_seconds(10.0);
        let first = scheduler.next_ready_tasks(&clock);
        assert_eq!(first.len(), 1);

        clock.advance_seconds(5.0);
        assert!(scheduler.next_ready_tasks(&clock).is_empty());

        clock.advance_seconds(5.0);
        let second = scheduler.next_ready_tasks(&clock);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].execute_at.millis, 20_000);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn equal_times_fire_in_scheduling_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ScheduledTask::new(TaskKind::ConstructionComplete(7), 3_000));
        scheduler.schedule(ScheduledTask::new(TaskKind::ConstructionComplete(3), 3_000));
        scheduler.schedule(ScheduledTask::new(TaskKind::FarmerRecovery, 3_000));

        let mut clock = GameClock::new();
        clock.advance_seconds(3.0);
        let kinds: Vec<_> = scheduler
            .next_ready_tasks(&clock)
            .into_iter()
            .map(|task| task.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::ConstructionComplete(7),
                TaskKind::ConstructionComplete(3),
                TaskKind::FarmerRecovery
            ]
        );
    }

    #[test]
    fn far_tasks_do_not_block_behind_empty_buckets() {
        let mut scheduler = Scheduler::with_horizon(1_000, 500);
        let mut clock = GameClock::new();
        clock.advance_seconds(50.0);
        scheduler.next_ready_tasks(&clock);

        scheduler.schedule(ScheduledTask::new(TaskKind::FarmerRecovery, 110_000));
        assert_eq!(scheduler.peek_next_millis(clock.total_millis()), Some(110_000));

        clock.advance_seconds(60.0);
        let ready = scheduler.next_ready_tasks(&clock);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].kind, TaskKind::FarmerRecovery);
    }
}
