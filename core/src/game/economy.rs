mod buildings;
mod research;
mod resources;
mod workers;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow, ensure};
use rand::Rng;

pub use buildings::{BuildingCatalog, BuildingDefinition, BuildingKind, ConstructionProject};
pub use research::{
    AGRICULTURE_EFFICIENCY, EFFICIENT_FOOD_DISTRIBUTION, EFFICIENT_LOGGING, ResearchCatalog,
    ResearchProject, ResearchTopic,
};
pub use resources::{
    ResourceBundle, ResourceKind, bundle_value, describe_bundle, parse_bundle, validate_bundle,
};
pub use workers::{WorkerGroup, WorkerKind, Workforce};

use super::config::EconomyConfig;
use super::events::GameEvent;
use super::names::{chance, random_int};
use crate::time::Season;

const WINTER_FOOD_FACTOR: f64 = 0.7;
const SUMMER_FOOD_FACTOR: f64 = 1.2;
const EMERGENCY_FOOD_THRESHOLD: f64 = 20.0;
const EXHAUSTION_FACTOR: f64 = 0.9;
const MAX_STARVATION_PENALTY: f64 = 0.8;
const RECOVERY_STEP: f64 = 0.05;

/// Outcome of one production step.
#[derive(Debug, Default)]
pub struct EconomyTick {
    pub events: Vec<GameEvent>,
    pub farmers_exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct ResourceManager {
    settings: EconomyConfig,
    amounts: BTreeMap<ResourceKind, f64>,
    rates: BTreeMap<ResourceKind, f64>,
    workforce: Workforce,
    buildings: BTreeMap<BuildingKind, u32>,
    production_bonuses: BTreeMap<ResourceKind, f64>,
    completed_research: BTreeSet<String>,
    season: Season,
    starving: bool,
}

impl ResourceManager {
    pub fn new(settings: EconomyConfig) -> Self {
        let mut amounts: BTreeMap<ResourceKind, f64> =
            ResourceKind::ALL.into_iter().map(|kind| (kind, 0.0)).collect();
        for (kind, amount) in &settings.starting_resources {
            amounts.insert(*kind, *amount);
        }
        let mut buildings: BTreeMap<BuildingKind, u32> =
            BuildingKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
        buildings.insert(BuildingKind::Farms, 1);

        let mut manager = Self {
            settings,
            amounts,
            rates: BTreeMap::new(),
            workforce: Workforce::new(),
            buildings,
            production_bonuses: BTreeMap::new(),
            completed_research: BTreeSet::new(),
            season: Season::Spring,
            starving: false,
        };
        manager.update_resource_rates();
        manager
    }

    pub fn amount(&self, kind: ResourceKind) -> f64 {
        self.amounts.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn rate(&self, kind: ResourceKind) -> f64 {
        self.rates.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn workforce(&self) -> &Workforce {
        &self.workforce
    }

    pub fn building_count(&self, kind: BuildingKind) -> u32 {
        self.buildings.get(&kind).copied().unwrap_or(0)
    }

    pub fn has_research(&self, key: &str) -> bool {
        self.completed_research.contains(key)
    }

    pub fn completed_research(&self) -> impl Iterator<Item = &str> {
        self.completed_research.iter().map(String::as_str)
    }

    pub fn is_starving(&self) -> bool {
        self.starving
    }

    pub fn production_bonus(&self, kind: ResourceKind) -> f64 {
        self.production_bonuses.get(&kind).copied().unwrap_or(1.0)
    }

    pub fn set_production_bonus(&mut self, kind: ResourceKind, multiplier: f64) {
        self.production_bonuses.insert(kind, multiplier);
        self.update_resource_rates();
    }

    pub fn set_season(&mut self, season: Season) {
        self.season = season;
        self.update_resource_rates();
    }

    /// `None` means the resource has no storage limit.
    pub fn storage_capacity(&self, kind: ResourceKind) -> Option<f64> {
        let count = |building| self.building_count(building) as f64;
        match kind {
            ResourceKind::Food => Some(500.0 + 200.0 * count(BuildingKind::Granaries)),
            ResourceKind::Wood => Some(500.0 + 200.0 * count(BuildingKind::LumberjackLodges)),
            ResourceKind::Stone => Some(300.0 + 150.0 * count(BuildingKind::MiningCamps)),
            ResourceKind::Gold => Some(1000.0 + 500.0 * count(BuildingKind::TradingPosts)),
            ResourceKind::Influence => Some(100.0 + 50.0 * count(BuildingKind::Embassies)),
            ResourceKind::Iron | ResourceKind::Gems | ResourceKind::Magic => None,
        }
    }

    pub fn update_resource_rates(&mut self) {
        let workers = |kind: WorkerKind| {
            self.workforce.count(kind) as f64 * self.workforce.efficiency(kind)
        };
        let count = |kind: BuildingKind| self.building_count(kind) as f64;

        let mut food = workers(WorkerKind::Farmers) * 0.2
            + count(BuildingKind::Farms) * 0.5
            + count(BuildingKind::Mills) * 0.3;
        let wood = workers(WorkerKind::Woodcutters) * 0.2
            + count(BuildingKind::Sawmills) * 0.4
            + count(BuildingKind::LumberjackLodges) * 0.2;
        let stone =
            workers(WorkerKind::Miners) * 0.15 + count(BuildingKind::MiningCamps) * 0.3;
        let gold = workers(WorkerKind::Merchants) * 0.1
            + count(BuildingKind::Marketplaces) * 0.2
            + count(BuildingKind::TradingPosts) * 0.3
            + count(BuildingKind::GoldRefineries) * 0.5;
        let influence = workers(WorkerKind::Diplomats) * 0.05
            + count(BuildingKind::Embassies) * 0.1
            + count(BuildingKind::Palaces) * 0.3;

        match self.season {
            Season::Winter => food *= WINTER_FOOD_FACTOR,
            Season::Summer => food *= SUMMER_FOOD_FACTOR,
            Season::Spring | Season::Autumn => {}
        }

        let base = [
            (ResourceKind::Food, food),
            (ResourceKind::Wood, wood),
            (ResourceKind::Stone, stone),
            (ResourceKind::Gold, gold),
            (ResourceKind::Influence, influence),
        ];
        let rates = base
            .into_iter()
            .map(|(kind, rate)| (kind, rate * self.production_bonus(kind)))
            .collect();
        self.rates = rates;
    }

    /// Adds up to the storage limit and returns what was actually stored.
    pub fn add_resource(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let capacity = self.storage_capacity(kind);
        let current = self.amount(kind);
        let target = match capacity {
            Some(cap) => (current + amount).min(cap).max(current),
            None => current + amount,
        };
        self.amounts.insert(kind, target);
        target - current
    }

    pub fn remove_resource(&mut self, kind: ResourceKind, amount: f64) -> Result<()> {
        let current = self.amount(kind);
        ensure!(
            current + 1e-9 >= amount,
            "{}が不足しています (必要 {:.0} / 保有 {:.0})",
            kind.label(),
            amount,
            current
        );
        self.amounts.insert(kind, (current - amount).max(0.0));
        Ok(())
    }

    pub fn has_enough_resources(&self, cost: &ResourceBundle) -> bool {
        cost.iter()
            .all(|(kind, amount)| self.amount(*kind) + 1e-9 >= *amount)
    }

    pub fn deduct_resources(&mut self, cost: &ResourceBundle) -> Result<()> {
        if let Some((kind, amount)) = cost
            .iter()
            .find(|(kind, amount)| self.amount(**kind) + 1e-9 < **amount)
        {
            return Err(anyhow!(
                "{}が不足しています (必要 {:.0} / 保有 {:.0})",
                kind.label(),
                amount,
                self.amount(*kind)
            ));
        }
        for (kind, amount) in cost {
            let current = self.amount(*kind);
            self.amounts.insert(*kind, (current - amount).max(0.0));
        }
        Ok(())
    }

    pub fn add_building(&mut self, kind: BuildingKind) -> u32 {
        let count = self.buildings.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;
        self.update_resource_rates();
        count
    }

    pub fn complete_research(&mut self, key: &str) -> bool {
        self.completed_research.insert(key.to_string())
    }

    pub fn adjust_workers(&mut self, kind: WorkerKind, delta: i32) -> Result<u32> {
        ensure!(delta != 0, "変更数は0以外で指定してください");
        let group = self.workforce.group(kind);
        let target = group.count as i64 + delta as i64;
        ensure!(
            target >= 0,
            "{}は {} 人しかいません",
            kind.label(),
            group.count
        );
        ensure!(
            target <= group.max as i64,
            "{}は最大 {} 人までです",
            kind.label(),
            group.max
        );
        self.workforce.group_mut(kind).count = target as u32;
        self.update_resource_rates();
        Ok(target as u32)
    }

    pub fn daily_food_consumption(&self) -> f64 {
        let base = self.workforce.total() as f64 * self.settings.food_per_worker_daily;
        if self.has_research(EFFICIENT_FOOD_DISTRIBUTION) {
            base * 0.9
        } else {
            base
        }
    }

    pub fn process_tick<R: Rng + ?Sized>(&mut self, seconds: f64, rng: &mut R) -> EconomyTick {
        let mut outcome = EconomyTick::default();
        if seconds <= 0.0 {
            return outcome;
        }
        for kind in ResourceKind::PRODUCED {
            let produced = self.rate(kind) * seconds;
            self.add_resource(kind, produced);
        }
        self.process_special_events(seconds, rng, &mut outcome);
        outcome
    }

    fn process_special_events<R: Rng + ?Sized>(
        &mut self,
        seconds: f64,
        rng: &mut R,
        outcome: &mut EconomyTick,
    ) {
        let miners = self.workforce.count(WorkerKind::Miners) as f64;
        if chance(rng, self.settings.gold_discovery_chance * seconds * miners) {
            let base = random_int(
                rng,
                self.settings.gold_discovery_min as i64,
                self.settings.gold_discovery_max as i64,
            ) as f64;
            let refinery_bonus = self.building_count(BuildingKind::GoldRefineries) as f64 * 0.2;
            let amount = (base
                * (1.0 + refinery_bonus)
                * self.workforce.efficiency(WorkerKind::Miners))
            .round();
            let stored = self.add_resource(ResourceKind::Gold, amount);
            outcome.events.push(GameEvent::success(format!(
                "鉱夫たちが金鉱脈を発見しました！ 金貨 {:.0} を獲得しました。",
                stored
            )));
        }

        let farmers = self.workforce.count(WorkerKind::Farmers) as f64;
        if chance(rng, self.settings.food_surplus_chance * seconds * farmers) {
            let mut amount = random_int(
                rng,
                self.settings.food_surplus_min as i64,
                self.settings.food_surplus_max as i64,
            ) as f64;
            if self.has_research(AGRICULTURE_EFFICIENCY) {
                amount *= 1.5;
            }
            let farms = self.building_count(BuildingKind::Farms);
            if farms > 3 {
                amount *= 1.0 + farms as f64 * 0.1;
            }
            let stored = self.add_resource(ResourceKind::Food, amount);
            let message = if amount > 50.0 {
                format!("大豊作です！ 農民たちが食料 {:.0} を余分に収穫しました。", stored)
            } else {
                format!("農民たちが食料 {:.0} を余分に収穫しました。", stored)
            };
            outcome.events.push(GameEvent::success(message));
        }

        let woodcutters = self.workforce.count(WorkerKind::Woodcutters) as f64;
        let wood_chance = self.settings.wood_bonus_chance
            * (woodcutters / 10.0).min(1.0)
            * self.workforce.efficiency(WorkerKind::Woodcutters)
            * seconds;
        if chance(rng, wood_chance) {
            let mut amount = random_int(
                rng,
                self.settings.wood_bonus_min as i64,
                self.settings.wood_bonus_max as i64,
            ) as f64;
            if self.has_research(EFFICIENT_LOGGING) {
                amount *= 1.4;
            }
            let sawmills = self.building_count(BuildingKind::Sawmills);
            if sawmills > 0 {
                amount *= 1.0 + sawmills as f64 * 0.15;
            }
            let stored = self.add_resource(ResourceKind::Wood, amount);
            outcome.events.push(GameEvent::success(format!(
                "木こりたちが豊かな森を見つけ、木材 {:.0} を得ました。",
                stored
            )));
        }

        let food = self.amount(ResourceKind::Food);
        if food < EMERGENCY_FOOD_THRESHOLD && farmers >= 3.0 {
            let emergency_chance = self.settings.food_emergency_chance
                * (1.0 - food / EMERGENCY_FOOD_THRESHOLD)
                * seconds;
            if chance(rng, emergency_chance) {
                let amount = random_int(rng, 10, 25) as f64;
                let stored = self.add_resource(ResourceKind::Food, amount);
                self.workforce.group_mut(WorkerKind::Farmers).efficiency *= EXHAUSTION_FACTOR;
                self.update_resource_rates();
                outcome.farmers_exhausted = true;
                outcome.events.push(GameEvent::warning(format!(
                    "緊急の食料確保で {:.0} の食料を得ましたが、農民が疲弊しています (効率 -10%)。",
                    stored
                )));
            }
        }
    }

    pub fn recover_farmers(&mut self) -> GameEvent {
        let group = self.workforce.group_mut(WorkerKind::Farmers);
        group.efficiency = (group.efficiency / EXHAUSTION_FACTOR).min(1.0);
        self.update_resource_rates();
        GameEvent::info("農民たちの疲労が回復しました。")
    }

    /// Daily consumption followed by starvation or recovery handling.
    pub fn daily_upkeep<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let consumption = self.daily_food_consumption();
        let before = self.amount(ResourceKind::Food);
        let after = before - consumption;
        if after < 0.0 {
            self.amounts.insert(ResourceKind::Food, 0.0);
            let severity = if consumption > 0.0 {
                (consumption - before) / consumption
            } else {
                0.0
            };
            self.handle_starvation(severity, rng, &mut events);
        } else {
            self.amounts.insert(ResourceKind::Food, after);
            if let Some(event) = self.check_food_recovery(consumption) {
                events.push(event);
            }
        }
        self.update_resource_rates();
        events
    }

    fn handle_starvation<R: Rng + ?Sized>(
        &mut self,
        severity: f64,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        self.starving = true;
        let penalty = severity.min(MAX_STARVATION_PENALTY);
        for group in self.workforce.iter_mut() {
            group.efficiency *= 1.0 - penalty;
        }
        events.push(GameEvent::danger(
            "民が飢えています！ 労働者の効率が低下しました。",
        ));
        if severity > 0.5 {
            events.push(GameEvent::danger(
                "深刻な食料不足です。食料生産を最優先してください。",
            ));
        }

        if severity > 0.7 && chance(rng, severity - 0.3) {
            if let Some(kind) = self.workforce.largest() {
                let group = self.workforce.group_mut(kind);
                if group.count > 1 {
                    let lost = ((group.count as f64) * 0.1).ceil() as u32;
                    group.count -= lost;
                    events.push(GameEvent::danger(format!(
                        "飢饉により{}が {} 人亡くなりました。",
                        kind.label(),
                        lost
                    )));
                }
            }
        }
    }

    fn check_food_recovery(&mut self, consumption: f64) -> Option<GameEvent> {
        if self.amount(ResourceKind::Food) <= consumption * 3.0 {
            return None;
        }
        let weakened = self
            .workforce
            .iter()
            .any(|(_, group)| group.efficiency < 1.0);
        if !weakened {
            return None;
        }
        for group in self.workforce.iter_mut() {
            if group.efficiency < 1.0 {
                group.efficiency = (group.efficiency + RECOVERY_STEP).min(1.0);
            }
        }
        let recovered = self
            .workforce
            .iter()
            .all(|(_, group)| group.efficiency >= 0.99);
        if !recovered {
            return None;
        }
        for group in self.workforce.iter_mut() {
            group.efficiency = 1.0;
        }
        self.starving = false;
        Some(GameEvent::success("民は食料不足から立ち直りました。"))
    }
}
