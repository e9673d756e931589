use std::collections::VecDeque;
use std::fmt;

use crate::time::SeasonDate;

pub const EVENT_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Danger,
    Diplomatic,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Info => "情報",
            EventKind::Success => "成功",
            EventKind::Warning => "警告",
            EventKind::Danger => "危機",
            EventKind::Diplomatic => "外交",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    pub kind: EventKind,
    pub message: String,
}

impl GameEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventKind::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(EventKind::Danger, message)
    }

    pub fn diplomatic(message: impl Into<String>) -> Self {
        Self::new(EventKind::Diplomatic, message)
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub date: SeasonDate,
    pub kind: EventKind,
    pub message: String,
}

/// Newest-first log with a fixed capacity.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LoggedEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, date: SeasonDate, event: &GameEvent) {
        self.entries.push_front(LoggedEvent {
            date,
            kind: event.kind,
            message: event.message.clone(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
