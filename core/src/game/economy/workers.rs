use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use super::resources::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Farmers,
    Woodcutters,
    Miners,
    Merchants,
    Diplomats,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 5] = [
        WorkerKind::Farmers,
        WorkerKind::Woodcutters,
        WorkerKind::Miners,
        WorkerKind::Merchants,
        WorkerKind::Diplomats,
    ];

    pub fn key(self) -> &'static str {
        match self {
            WorkerKind::Farmers => "farmers",
            WorkerKind::Woodcutters => "woodcutters",
            WorkerKind::Miners => "miners",
            WorkerKind::Merchants => "merchants",
            WorkerKind::Diplomats => "diplomats",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkerKind::Farmers => "農民",
            WorkerKind::Woodcutters => "木こり",
            WorkerKind::Miners => "鉱夫",
            WorkerKind::Merchants => "商人",
            WorkerKind::Diplomats => "外交官",
        }
    }

    pub fn produces(self) -> ResourceKind {
        match self {
            WorkerKind::Farmers => ResourceKind::Food,
            WorkerKind::Woodcutters => ResourceKind::Wood,
            WorkerKind::Miners => ResourceKind::Stone,
            WorkerKind::Merchants => ResourceKind::Gold,
            WorkerKind::Diplomats => ResourceKind::Influence,
        }
    }

    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        let needle = trimmed.to_ascii_lowercase();
        WorkerKind::ALL
            .into_iter()
            .find(|kind| {
                kind.key() == needle
                    || kind.key().trim_end_matches('s') == needle
                    || kind.label() == trimmed
            })
            .ok_or_else(|| anyhow!("不明な労働者種別です: {}", trimmed))
    }

    fn starting_group(self) -> WorkerGroup {
        let (count, max) = match self {
            WorkerKind::Farmers => (5, 10),
            WorkerKind::Woodcutters => (3, 10),
            WorkerKind::Miners => (2, 10),
            WorkerKind::Merchants => (1, 5),
            WorkerKind::Diplomats => (0, 3),
        };
        WorkerGroup {
            count,
            max,
            efficiency: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerGroup {
    pub count: u32,
    pub max: u32,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workforce {
    groups: [WorkerGroup; 5],
}

impl Workforce {
    pub fn new() -> Self {
        Self {
            groups: WorkerKind::ALL.map(WorkerKind::starting_group),
        }
    }

    fn index(kind: WorkerKind) -> usize {
        kind as usize
    }

    pub fn group(&self, kind: WorkerKind) -> &WorkerGroup {
        &self.groups[Self::index(kind)]
    }

    pub(crate) fn group_mut(&mut self, kind: WorkerKind) -> &mut WorkerGroup {
        &mut self.groups[Self::index(kind)]
    }

    pub fn count(&self, kind: WorkerKind) -> u32 {
        self.group(kind).count
    }

    pub fn efficiency(&self, kind: WorkerKind) -> f64 {
        self.group(kind).efficiency
    }

    pub fn total(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerKind, &WorkerGroup)> {
        WorkerKind::ALL.into_iter().zip(self.groups.iter())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut WorkerGroup> {
        self.groups.iter_mut()
    }

    /// The first group holding the most workers.
    pub fn largest(&self) -> Option<WorkerKind> {
        let mut best: Option<(WorkerKind, u32)> = None;
        for (kind, group) in self.iter() {
            if group.count > best.map(|(_, count)| count).unwrap_or(0) {
                best = Some((kind, group.count));
            }
        }
        best.map(|(kind, _)| kind)
    }
}

impl Default for Workforce {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_workforce_matches_defaults() {
        let workforce = Workforce::new();
        assert_eq!(workforce.count(WorkerKind::Farmers), 5);
        assert_eq!(workforce.group(WorkerKind::Merchants).max, 5);
        assert_eq!(workforce.total(), 11);
        assert_eq!(workforce.largest(), Some(WorkerKind::Farmers));
    }

    #[test]
    fn parse_accepts_singular_and_japanese() {
        assert_eq!(WorkerKind::parse("farmer").unwrap(), WorkerKind::Farmers);
        assert_eq!(WorkerKind::parse("外交官").unwrap(), WorkerKind::Diplomats);
        assert!(WorkerKind::parse("knights").is_err());
    }
}
