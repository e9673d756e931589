mod offers;
mod trade;

use std::collections::BTreeMap;

use rand::Rng;
use tracing::info;

pub use offers::{OfferBook, TradeOffer, draft_offer};
pub use trade::{PeaceOutcome, TradeAssessment, TradeOutcome, evaluate_trade};
pub(crate) use trade::{
    accept_offer, counter_offer, declare_war, propose_alliance, propose_peace, propose_trade,
    reject_offer,
};

use super::config::DiplomacyConfig;
use super::constants::{MAX_RELATION, MIN_RELATION};
use super::country::CountryId;
use super::names::random_int;

#[derive(Debug, Clone, PartialEq)]
pub struct Alliance {
    pub id: u64,
    pub name: String,
    pub members: Vec<CountryId>,
    pub formed_at_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct War {
    pub aggressor: CountryId,
    pub defender: CountryId,
    pub started_at_millis: u64,
}

impl War {
    fn involves(&self, a: CountryId, b: CountryId) -> bool {
        (self.aggressor == a && self.defender == b) || (self.aggressor == b && self.defender == a)
    }
}

/// How one country feels about another, from its own friendship value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Allied,
    Friendly,
    Neutral,
    Unfriendly,
    Hostile,
}

impl Stance {
    pub fn label(self) -> &'static str {
        match self {
            Stance::Allied => "同盟的",
            Stance::Friendly => "友好的",
            Stance::Neutral => "中立",
            Stance::Unfriendly => "非友好的",
            Stance::Hostile => "敵対的",
        }
    }
}

/// Display status of the player's relation with another country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStatus {
    AtWar,
    Allied,
    Friendly,
    Cordial,
    Neutral,
    Unfriendly,
    Hostile,
}

impl RelationshipStatus {
    pub fn label(self) -> &'static str {
        match self {
            RelationshipStatus::AtWar => "交戦中",
            RelationshipStatus::Allied => "同盟",
            RelationshipStatus::Friendly => "友好",
            RelationshipStatus::Cordial => "良好",
            RelationshipStatus::Neutral => "中立",
            RelationshipStatus::Unfriendly => "冷淡",
            RelationshipStatus::Hostile => "敵対",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiplomaticEvent {
    AllianceFormed {
        first: CountryId,
        second: CountryId,
    },
    WarStarted {
        aggressor: CountryId,
        defender: CountryId,
    },
    WarEnded {
        first: CountryId,
        second: CountryId,
    },
    Gesture {
        from: CountryId,
        to: CountryId,
    },
}

#[derive(Debug, Clone)]
pub struct Diplomacy {
    settings: DiplomacyConfig,
    relationships: BTreeMap<(CountryId, CountryId), i32>,
    alliances: Vec<Alliance>,
    wars: Vec<War>,
    next_alliance_id: u64,
    now_millis: u64,
    outbox: Vec<DiplomaticEvent>,
}

impl Diplomacy {
    pub fn new(settings: DiplomacyConfig) -> Self {
        Self {
            settings,
            relationships: BTreeMap::new(),
            alliances: Vec::new(),
            wars: Vec::new(),
            next_alliance_id: 1,
            now_millis: 0,
            outbox: Vec::new(),
        }
    }

    pub fn settings(&self) -> &DiplomacyConfig {
        &self.settings
    }

    pub fn initialise_relationships<R: Rng + ?Sized>(&mut self, country_count: usize, rng: &mut R) {
        self.relationships.clear();
        for a in 0..country_count {
            for b in 0..country_count {
                if a == b {
                    continue;
                }
                let value = random_int(
                    rng,
                    self.settings.initial_friendship_min as i64,
                    self.settings.initial_friendship_max as i64,
                ) as i32;
                self.relationships.insert((a, b), value);
            }
        }
    }

    pub(crate) fn set_time(&mut self, now_millis: u64) {
        self.now_millis = now_millis;
    }

    pub fn relationship(&self, from: CountryId, to: CountryId) -> i32 {
        self.relationships.get(&(from, to)).copied().unwrap_or(0)
    }

    pub(crate) fn set_relationship(&mut self, from: CountryId, to: CountryId, value: i32) {
        if from == to {
            return;
        }
        self.relationships
            .insert((from, to), value.clamp(MIN_RELATION, MAX_RELATION));
    }

    /// Clamps to the relation range, then applies alliance and war thresholds.
    pub fn modify_relationship(&mut self, from: CountryId, to: CountryId, delta: i32) -> i32 {
        if from == to {
            return 0;
        }
        let value = (self.relationship(from, to) + delta).clamp(MIN_RELATION, MAX_RELATION);
        self.relationships.insert((from, to), value);
        self.check_thresholds(from, to);
        value
    }

    fn check_thresholds(&mut self, from: CountryId, to: CountryId) {
        let value = self.relationship(from, to);
        if value >= self.settings.alliance_threshold {
            self.form_alliance(from, to);
        }
        if value <= self.settings.war_threshold {
            self.start_war(from, to);
        }
    }

    pub fn form_alliance(&mut self, a: CountryId, b: CountryId) {
        if a == b || self.are_allied(a, b) {
            return;
        }
        if self.are_at_war(a, b) {
            self.end_war(a, b);
        }

        let joined = self.alliances.iter_mut().find_map(|alliance| {
            let has_a = alliance.members.contains(&a);
            let has_b = alliance.members.contains(&b);
            if has_a && !has_b {
                alliance.members.push(b);
                Some(alliance.id)
            } else if has_b && !has_a {
                alliance.members.push(a);
                Some(alliance.id)
            } else {
                None
            }
        });

        let alliance_id = match joined {
            Some(id) => id,
            None => {
                let id = self.next_alliance_id;
                self.next_alliance_id += 1;
                self.alliances.push(Alliance {
                    id,
                    name: format!("{}_{}_alliance", a, b),
                    members: vec![a, b],
                    formed_at_millis: self.now_millis,
                });
                id
            }
        };
        info!(first = a, second = b, alliance = alliance_id, "同盟が成立しました");
        self.outbox.push(DiplomaticEvent::AllianceFormed {
            first: a,
            second: b,
        });
    }

    pub fn start_war(&mut self, aggressor: CountryId, defender: CountryId) {
        if aggressor == defender || self.are_at_war(aggressor, defender) {
            return;
        }
        self.wars.push(War {
            aggressor,
            defender,
            started_at_millis: self.now_millis,
        });
        info!(aggressor, defender, "戦争が始まりました");
        self.outbox.push(DiplomaticEvent::WarStarted {
            aggressor,
            defender,
        });
    }

    pub fn end_war(&mut self, a: CountryId, b: CountryId) -> bool {
        let Some(idx) = self.wars.iter().position(|war| war.involves(a, b)) else {
            return false;
        };
        self.wars.remove(idx);
        info!(first = a, second = b, "戦争が終結しました");
        self.outbox.push(DiplomaticEvent::WarEnded {
            first: a,
            second: b,
        });
        true
    }

    pub fn are_allied(&self, a: CountryId, b: CountryId) -> bool {
        self.alliances
            .iter()
            .any(|alliance| alliance.members.contains(&a) && alliance.members.contains(&b))
    }

    pub fn are_at_war(&self, a: CountryId, b: CountryId) -> bool {
        self.wars.iter().any(|war| war.involves(a, b))
    }

    pub fn allies_of(&self, country: CountryId) -> Vec<CountryId> {
        let mut allies = Vec::new();
        for alliance in &self.alliances {
            if !alliance.members.contains(&country) {
                continue;
            }
            for &member in &alliance.members {
                if member != country && !allies.contains(&member) {
                    allies.push(member);
                }
            }
        }
        allies
    }

    pub fn enemies_of(&self, country: CountryId) -> Vec<CountryId> {
        self.wars
            .iter()
            .filter_map(|war| {
                if war.aggressor == country {
                    Some(war.defender)
                } else if war.defender == country {
                    Some(war.aggressor)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn alliances(&self) -> &[Alliance] {
        &self.alliances
    }

    pub fn wars(&self) -> &[War] {
        &self.wars
    }

    pub fn stance(&self, from: CountryId, to: CountryId) -> Stance {
        let value = self.relationship(from, to);
        if value >= self.settings.alliance_threshold {
            Stance::Allied
        } else if value <= self.settings.war_threshold {
            Stance::Hostile
        } else if value > 50 {
            Stance::Friendly
        } else if value < 0 {
            Stance::Unfriendly
        } else {
            Stance::Neutral
        }
    }

    pub fn relationship_status(&self, from: CountryId, to: CountryId) -> RelationshipStatus {
        if self.are_at_war(from, to) {
            return RelationshipStatus::AtWar;
        }
        if self.are_allied(from, to) {
            return RelationshipStatus::Allied;
        }
        let value = self.relationship(from, to);
        if value >= 50 {
            RelationshipStatus::Friendly
        } else if value >= 20 {
            RelationshipStatus::Cordial
        } else if value >= -20 {
            RelationshipStatus::Neutral
        } else if value >= -50 {
            RelationshipStatus::Unfriendly
        } else {
            RelationshipStatus::Hostile
        }
    }

    pub(crate) fn record(&mut self, event: DiplomaticEvent) {
        self.outbox.push(event);
    }

    pub(crate) fn drain_events(&mut self) -> Vec<DiplomaticEvent> {
        std::mem::take(&mut self.outbox)
    }
}
