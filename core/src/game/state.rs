use anyhow::{Result, anyhow, ensure};
use rand::rngs::StdRng;
use tracing::debug;

use super::{
    bootstrap::{GameBootstrap, GameBuilder},
    config::RealmConfig,
    country::{Country, CountryId, PLAYER_ID},
    diplomacy::{
        self, DiplomaticEvent, Diplomacy, OfferBook, PeaceOutcome, TradeOffer, TradeOutcome,
    },
    economy::{
        BuildingCatalog, ConstructionProject, ResearchCatalog, ResearchProject, ResourceBundle,
        ResourceKind, ResourceManager, WorkerKind, describe_bundle,
    },
    events::{EventLog, GameEvent},
    systems::facade::SystemsFacade,
    time::SimulationClock,
    world::WorldMap,
};
use crate::{ScheduledTask, SeasonDate, TaskKind};

pub struct GameState {
    config: RealmConfig,
    simulation_clock: SimulationClock,
    rng: StdRng,
    map: WorldMap,
    countries: Vec<Country>,
    diplomacy: Diplomacy,
    offers: OfferBook,
    economy: ResourceManager,
    building_catalog: BuildingCatalog,
    research_catalog: ResearchCatalog,
    constructions: Vec<ConstructionProject>,
    research_projects: Vec<ResearchProject>,
    next_project_id: u64,
    event_log: EventLog,
    systems: SystemsFacade,
    running: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeStatus {
    pub elapsed_seconds: f64,
    pub date: SeasonDate,
    pub day_progress: f64,
    pub next_task_in_seconds: Option<f64>,
    pub time_multiplier: f64,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KingdomStatus {
    AtWar,
    Starving,
    FoodShortage,
    Stable,
}

impl KingdomStatus {
    pub fn label(self) -> &'static str {
        match self {
            KingdomStatus::AtWar => "戦時下",
            KingdomStatus::Starving => "飢餓",
            KingdomStatus::FoodShortage => "食料不足",
            KingdomStatus::Stable => "安定",
        }
    }
}

impl GameState {
    pub fn from_config(config: RealmConfig) -> Result<Self> {
        GameBuilder::new(config).build()
    }

    pub fn from_config_with_rng(config: RealmConfig, rng: StdRng) -> Result<Self> {
        GameBuilder::new(config).with_rng(rng).build()
    }

    pub fn from_config_with_seed(config: RealmConfig, seed: u64) -> Result<Self> {
        GameBuilder::new(config).with_seed(seed).build()
    }

    pub(crate) fn new(bootstrap: GameBootstrap) -> Self {
        let simulation_clock = SimulationClock::new(
            bootstrap.scheduler,
            bootstrap.config.day_millis(),
            bootstrap.config.calendar.days_per_season,
        );
        let mut game = Self {
            config: bootstrap.config,
            simulation_clock,
            rng: bootstrap.rng,
            map: bootstrap.map,
            countries: bootstrap.countries,
            diplomacy: bootstrap.diplomacy,
            offers: OfferBook::new(),
            economy: bootstrap.economy,
            building_catalog: bootstrap.buildings,
            research_catalog: bootstrap.research,
            constructions: Vec::new(),
            research_projects: Vec::new(),
            next_project_id: 1,
            event_log: EventLog::new(),
            systems: SystemsFacade::new(),
            running: true,
        };
        let welcome = GameEvent::info(format!(
            "{}へようこそ。{}の統治が始まりました。",
            game.config.game_name, game.config.player_name
        ));
        game.record(vec![welcome]);
        game
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    #[cfg(test)]
    pub fn countries_mut(&mut self) -> &mut [Country] {
        &mut self.countries
    }

    pub fn player(&self) -> &Country {
        &self.countries[PLAYER_ID]
    }

    pub fn country(&self, id: CountryId) -> Result<&Country> {
        self.countries
            .get(id)
            .ok_or_else(|| anyhow!("国ID {} は存在しません", id))
    }

    /// Matches a country id or a case-insensitive name.
    pub fn find_country(&self, id_or_name: &str) -> Option<CountryId> {
        let token = id_or_name.trim();
        if let Ok(id) = token.parse::<usize>() {
            if id < self.countries.len() {
                return Some(id);
            }
        }
        let needle = token.to_lowercase();
        self.countries
            .iter()
            .position(|country| country.name.to_lowercase() == needle)
    }

    pub fn country_at(&self, x: f64, y: f64) -> Option<CountryId> {
        self.map.country_at(&self.countries, x, y)
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.economy
    }

    #[cfg(test)]
    pub(crate) fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.economy
    }

    pub fn diplomacy(&self) -> &Diplomacy {
        &self.diplomacy
    }

    #[cfg(test)]
    pub(crate) fn diplomacy_mut(&mut self) -> &mut Diplomacy {
        &mut self.diplomacy
    }

    pub fn offers(&self) -> &[TradeOffer] {
        self.offers.offers()
    }

    pub fn building_catalog(&self) -> &BuildingCatalog {
        &self.building_catalog
    }

    pub fn research_catalog(&self) -> &ResearchCatalog {
        &self.research_catalog
    }

    pub fn constructions(&self) -> &[ConstructionProject] {
        &self.constructions
    }

    pub fn research_projects(&self) -> &[ResearchProject] {
        &self.research_projects
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn now_millis(&self) -> u64 {
        self.simulation_clock.now_millis()
    }

    pub fn calendar_date(&self) -> SeasonDate {
        self.simulation_clock.calendar_date()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn time_multiplier(&self) -> f64 {
        self.simulation_clock.time_multiplier()
    }

    /// Returns the multiplier actually applied after clamping.
    pub fn set_time_multiplier(&mut self, multiplier: f64) -> Result<f64> {
        self.simulation_clock.set_time_multiplier(multiplier)
    }

    pub fn time_status(&self) -> TimeStatus {
        TimeStatus {
            elapsed_seconds: self.simulation_clock.elapsed_seconds(),
            date: self.simulation_clock.calendar_date(),
            day_progress: self.simulation_clock.day_progress(),
            next_task_in_seconds: self.simulation_clock.next_task_in_seconds(),
            time_multiplier: self.simulation_clock.time_multiplier(),
            running: self.running,
        }
    }

    pub fn kingdom_status(&self) -> KingdomStatus {
        if !self.diplomacy.enemies_of(PLAYER_ID).is_empty() {
            KingdomStatus::AtWar
        } else if self.economy.is_starving() {
            KingdomStatus::Starving
        } else if self.economy.amount(ResourceKind::Food) < self.economy.daily_food_consumption() {
            KingdomStatus::FoodShortage
        } else {
            KingdomStatus::Stable
        }
    }

    /// Runs `seconds` of wall time, scaled by the multiplier, in `tick_seconds` steps.
    pub fn advance(&mut self, seconds: f64) -> Result<Vec<GameEvent>> {
        ensure!(self.running, "ゲームは一時停止中です。resume で再開してください。");
        ensure!(
            seconds.is_finite() && seconds > 0.0,
            "時間は正の値で指定してください"
        );

        // The clock counts whole milliseconds, so production steps must too.
        let mut remaining_millis =
            (seconds * self.simulation_clock.time_multiplier() * 1000.0).round() as u64;
        let tick_millis = (self.config.tick_seconds * 1000.0).round().max(1.0) as u64;
        let mut events = Vec::new();
        while remaining_millis > 0 {
            let step_millis = remaining_millis.min(tick_millis);
            events.extend(self.step(step_millis as f64 / 1000.0)?);
            remaining_millis -= step_millis;
        }
        Ok(events)
    }

    fn step(&mut self, seconds: f64) -> Result<Vec<GameEvent>> {
        let tick = self.simulation_clock.step(seconds)?;
        let now = self.simulation_clock.now_millis();
        self.diplomacy.set_time(now);
        let mut events = Vec::new();

        if tick.seasons_crossed > 0 {
            let season = self.simulation_clock.calendar_date().season;
            self.economy.set_season(season);
            events.push(GameEvent::info(format!("季節が{}になりました。", season.label())));
        }

        let production = self.economy.process_tick(seconds, &mut self.rng);
        events.extend(production.events);
        if production.farmers_exhausted {
            let delay = (self.config.economy.farmer_recovery_seconds * 1000.0).round() as u64;
            self.simulation_clock
                .schedule(ScheduledTask::new(TaskKind::FarmerRecovery, now + delay));
        }

        for task in tick.ready_tasks {
            debug!(task = ?task.kind, at = task.execute_at.millis, "予定タスクを実行します");
            events.extend(task.execute(self));
        }

        let report = self.systems.run_ai(
            &mut self.diplomacy,
            &self.countries,
            &mut self.offers,
            now,
            &mut self.rng,
        );
        if report.pulsed {
            debug!(
                pulses = self.systems.pulses(),
                new_offers = report.new_offers.len(),
                "AIの行動を反映します"
            );
        }
        for id in report.new_offers {
            if let Ok(offer) = self.offers.get(id) {
                events.push(GameEvent::diplomatic(format!(
                    "{}から交易の提案 #{} が届きました: {} と引き換えに {} を求めています。",
                    self.countries[offer.from].name,
                    offer.id,
                    describe_bundle(&offer.offered),
                    describe_bundle(&offer.requested)
                )));
            }
        }

        events.extend(self.withdraw_hostile_offers());
        for offer in self.offers.expire(now) {
            events.push(GameEvent::info(format!(
                "{}からの交易提案 #{} は期限切れになりました。",
                self.countries[offer.from].name, offer.id
            )));
        }

        events.extend(self.diplomatic_news());
        Ok(self.record(events))
    }

    fn withdraw_hostile_offers(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for enemy in self.diplomacy.enemies_of(PLAYER_ID) {
            for offer in self.offers.withdraw_from(enemy) {
                events.push(GameEvent::warning(format!(
                    "{}との開戦により交易提案 #{} は取り下げられました。",
                    self.countries[enemy].name, offer.id
                )));
            }
        }
        events
    }

    fn record(&mut self, events: Vec<GameEvent>) -> Vec<GameEvent> {
        let date = self.simulation_clock.calendar_date();
        for event in &events {
            self.event_log.record(date, event);
        }
        events
    }

    fn diplomatic_news(&mut self) -> Vec<GameEvent> {
        let drained = self.diplomacy.drain_events();
        let countries = &self.countries;
        let name = |id: CountryId| countries[id].name.as_str();
        drained
            .into_iter()
            .map(|event| match event {
                DiplomaticEvent::AllianceFormed { first, second } => GameEvent::diplomatic(
                    format!("{}と{}が同盟を結びました。", name(first), name(second)),
                ),
                DiplomaticEvent::WarStarted {
                    aggressor,
                    defender,
                } => {
                    let message =
                        format!("{}が{}に宣戦布告しました！", name(aggressor), name(defender));
                    if aggressor == PLAYER_ID || defender == PLAYER_ID {
                        GameEvent::danger(message)
                    } else {
                        GameEvent::diplomatic(message)
                    }
                }
                DiplomaticEvent::WarEnded { first, second } => GameEvent::diplomatic(format!(
                    "{}と{}の戦争が終結しました。",
                    name(first),
                    name(second)
                )),
                DiplomaticEvent::Gesture { from, .. } => GameEvent::diplomatic(format!(
                    "{}が贈り物を携えた使節を送ってきました。関係が少し改善しました。",
                    name(from)
                )),
            })
            .collect()
    }

    pub fn adjust_workers(&mut self, kind: WorkerKind, delta: i32) -> Result<u32> {
        let count = self.economy.adjust_workers(kind, delta)?;
        self.record(vec![GameEvent::info(format!(
            "{}を {} 人に変更しました。",
            kind.label(),
            count
        ))]);
        Ok(count)
    }

    pub fn start_construction(&mut self, token: &str) -> Result<ConstructionProject> {
        let definition = self.building_catalog.resolve(token)?.clone();
        self.economy.deduct_resources(&definition.cost)?;

        let now = self.simulation_clock.now_millis();
        let duration = (definition.build_seconds * 1000.0).round() as u64;
        let project = ConstructionProject {
            id: self.next_project_id,
            key: definition.key.clone(),
            name: definition.name.clone(),
            kind: definition.kind,
            started_at_millis: now,
            completes_at_millis: now + duration,
        };
        self.next_project_id += 1;
        self.simulation_clock.schedule(ScheduledTask::new(
            TaskKind::ConstructionComplete(project.id),
            project.completes_at_millis,
        ));
        self.constructions.push(project.clone());
        self.record(vec![GameEvent::info(format!(
            "{}の建設を開始しました (完了まで {:.0} 秒)。",
            project.name, definition.build_seconds
        ))]);
        Ok(project)
    }

    pub(crate) fn complete_construction(&mut self, project_id: u64) -> Vec<GameEvent> {
        let Some(idx) = self
            .constructions
            .iter()
            .position(|project| project.id == project_id)
        else {
            debug!(project_id, "完了対象の建設が見つかりません");
            return Vec::new();
        };
        let project = self.constructions.remove(idx);
        let count = self.economy.add_building(project.kind);
        vec![GameEvent::success(format!(
            "{}が完成しました (保有数 {})。",
            project.name, count
        ))]
    }

    pub fn start_research(&mut self, token: &str) -> Result<ResearchProject> {
        let topic = self.research_catalog.resolve(token)?.clone();
        ensure!(
            !self.economy.has_research(&topic.key),
            "「{}」は研究済みです",
            topic.name
        );
        ensure!(
            !self
                .research_projects
                .iter()
                .any(|project| project.key == topic.key),
            "「{}」は研究中です",
            topic.name
        );
        self.economy.deduct_resources(&topic.cost)?;

        let now = self.simulation_clock.now_millis();
        let duration = (topic.research_seconds * 1000.0).round() as u64;
        let project = ResearchProject {
            id: self.next_project_id,
            key: topic.key.clone(),
            name: topic.name.clone(),
            started_at_millis: now,
            completes_at_millis: now + duration,
        };
        self.next_project_id += 1;
        self.simulation_clock.schedule(ScheduledTask::new(
            TaskKind::ResearchComplete(project.id),
            project.completes_at_millis,
        ));
        self.research_projects.push(project.clone());
        self.record(vec![GameEvent::info(format!(
            "研究「{}」を開始しました (完了まで {:.0} 秒)。",
            project.name, topic.research_seconds
        ))]);
        Ok(project)
    }

    pub(crate) fn complete_research(&mut self, project_id: u64) -> Vec<GameEvent> {
        let Some(idx) = self
            .research_projects
            .iter()
            .position(|project| project.id == project_id)
        else {
            debug!(project_id, "完了対象の研究が見つかりません");
            return Vec::new();
        };
        let project = self.research_projects.remove(idx);
        self.economy.complete_research(&project.key);
        self.economy.update_resource_rates();
        vec![GameEvent::success(format!(
            "研究「{}」が完了しました。",
            project.name
        ))]
    }

    pub(crate) fn process_daily_upkeep(&mut self) -> Vec<GameEvent> {
        self.economy.daily_upkeep(&mut self.rng)
    }

    pub(crate) fn process_farmer_recovery(&mut self) -> Vec<GameEvent> {
        vec![self.economy.recover_farmers()]
    }

    pub fn propose_trade(
        &mut self,
        partner: CountryId,
        offered: &ResourceBundle,
        requested: &ResourceBundle,
    ) -> Result<TradeOutcome> {
        let outcome = diplomacy::propose_trade(
            &mut self.diplomacy,
            &mut self.economy,
            &mut self.countries,
            partner,
            offered,
            requested,
        )?;
        let event = self.trade_event(&outcome);
        let mut events = vec![event];
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(outcome)
    }

    fn trade_event(&self, outcome: &TradeOutcome) -> GameEvent {
        let name = &self.countries[outcome.partner].name;
        if outcome.accepted() {
            GameEvent::success(format!(
                "{}との交易が成立しました (公正度 {:.0}%)。受領: {}",
                name,
                outcome.assessment.fairness,
                describe_bundle(&outcome.received)
            ))
        } else {
            GameEvent::warning(format!(
                "{}は交易を拒否しました (公正度 {:.0}% / 必要 {:.0}%)。",
                name, outcome.assessment.fairness, outcome.assessment.threshold
            ))
        }
    }

    pub fn propose_alliance(&mut self, partner: CountryId) -> Result<bool> {
        let accepted = diplomacy::propose_alliance(&mut self.diplomacy, &self.countries, partner)?;
        let mut events = Vec::new();
        if !accepted {
            events.push(GameEvent::warning(format!(
                "{}は同盟の提案を断りました。",
                self.countries[partner].name
            )));
        }
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(accepted)
    }

    pub fn declare_war(&mut self, partner: CountryId) -> Result<()> {
        diplomacy::declare_war(&mut self.diplomacy, &self.countries, partner)?;
        let mut events = self.diplomatic_news();
        events.extend(self.withdraw_hostile_offers());
        self.record(events);
        Ok(())
    }

    pub fn propose_peace(&mut self, partner: CountryId) -> Result<PeaceOutcome> {
        let outcome = diplomacy::propose_peace(&mut self.diplomacy, &self.countries, partner)?;
        let mut events = Vec::new();
        if outcome == PeaceOutcome::Rejected {
            events.push(GameEvent::warning(format!(
                "{}は和平の提案を拒否しました。",
                self.countries[partner].name
            )));
        }
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(outcome)
    }

    pub fn accept_offer(&mut self, offer_id: u64) -> Result<ResourceBundle> {
        let (offer, received) = diplomacy::accept_offer(
            &mut self.diplomacy,
            &mut self.economy,
            &mut self.countries,
            &mut self.offers,
            offer_id,
        )?;
        let mut events = vec![GameEvent::success(format!(
            "{}からの交易提案 #{} を受け入れました。受領: {}",
            self.countries[offer.from].name,
            offer.id,
            describe_bundle(&received)
        ))];
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(received)
    }

    pub fn reject_offer(&mut self, offer_id: u64) -> Result<()> {
        let offer = diplomacy::reject_offer(&mut self.diplomacy, &mut self.offers, offer_id)?;
        let mut events = vec![GameEvent::info(format!(
            "{}からの交易提案 #{} を断りました。",
            self.countries[offer.from].name, offer.id
        ))];
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(())
    }

    pub fn counter_offer(
        &mut self,
        offer_id: u64,
        offered: &ResourceBundle,
        requested: &ResourceBundle,
    ) -> Result<TradeOutcome> {
        let (_, outcome) = diplomacy::counter_offer(
            &mut self.diplomacy,
            &mut self.economy,
            &mut self.countries,
            &mut self.offers,
            offer_id,
            offered,
            requested,
        )?;
        let mut events = vec![self.trade_event(&outcome)];
        events.extend(self.diplomatic_news());
        self.record(events);
        Ok(outcome)
    }

    #[cfg(test)]
    pub(crate) fn push_offer(
        &mut self,
        from: CountryId,
        offered: ResourceBundle,
        requested: ResourceBundle,
    ) -> u64 {
        let now = self.simulation_clock.now_millis();
        self.offers.push(from, offered, requested, now, 60_000)
    }
}

impl ScheduledTask {
    pub fn execute(&self, game: &mut GameState) -> Vec<GameEvent> {
        super::systems::tasks::execute(self, game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::EventKind;

    fn quiet_config() -> RealmConfig {
        let mut config = RealmConfig::from_embedded().expect("config");
        config.diplomacy.ai_pulse_chance = 0.0;
        config.economy.gold_discovery_chance = 0.0;
        config.economy.food_surplus_chance = 0.0;
        config.economy.wood_bonus_chance = 0.0;
        config.economy.food_emergency_chance = 0.0;
        config
    }

    fn game(seed: u64) -> GameState {
        GameState::from_config_with_seed(quiet_config(), seed).expect("game")
    }

    fn bundle(kind: ResourceKind, amount: f64) -> ResourceBundle {
        ResourceBundle::from([(kind, amount)])
    }

    #[test]
    fn new_game_starts_running_with_welcome_entry() {
        let game = game(1);
        assert!(game.is_running());
        assert_eq!(game.event_log().len(), 1);
        assert_eq!(game.player().name, "Eldoria");
        assert_eq!(game.find_country("eldoria"), Some(PLAYER_ID));
        assert_eq!(game.find_country("0"), Some(PLAYER_ID));
        assert_eq!(game.kingdom_status(), KingdomStatus::Stable);
    }

    #[test]
    fn advance_produces_resources_and_respects_pause() {
        let mut game = game(2);
        let wood_rate = game.resources().rate(ResourceKind::Wood);
        game.advance(5.0).expect("advance");
        let expected = 100.0 + wood_rate * 5.0;
        assert!((game.resources().amount(ResourceKind::Wood) - expected).abs() < 1e-6);

        game.pause();
        assert!(game.advance(1.0).is_err());
        game.resume();
        assert!(game.advance(1.0).is_ok());
    }

    #[test]
    fn time_multiplier_scales_elapsed_time() {
        let mut game = game(3);
        assert_eq!(game.set_time_multiplier(2.0).expect("speed"), 2.0);
        game.advance(3.0).expect("advance");
        let status = game.time_status();
        assert!((status.elapsed_seconds - 6.0).abs() < 1e-9);
        assert_eq!(status.time_multiplier, 2.0);
        assert!(status.next_task_in_seconds.is_some());
        assert_eq!(game.set_time_multiplier(50.0).expect("speed"), 5.0);
    }

    #[test]
    fn daily_upkeep_consumes_food_each_day() {
        let mut game = game(4);
        let consumption = game.resources().daily_food_consumption();
        let food_rate = game.resources().rate(ResourceKind::Food);
        game.advance(10.0).expect("advance");
        assert_eq!(game.calendar_date().day, 2);
        let expected = 100.0 + food_rate * 10.0 - consumption;
        assert!((game.resources().amount(ResourceKind::Food) - expected).abs() < 1e-6);
    }

    #[test]
    fn construction_completes_through_the_scheduler() {
        let mut game = game(5);
        let project = game.start_construction("farm").expect("farm");
        assert_eq!(game.resources().amount(ResourceKind::Wood), 50.0);
        assert_eq!(game.constructions().len(), 1);
        assert!(game.start_construction("palace").is_err());

        game.advance(29.0).expect("advance");
        assert!(game.constructions()[0].progress(game.now_millis()) > 0.9);
        let events = game.advance(1.0).expect("advance");
        assert!(game.constructions().is_empty());
        assert_eq!(
            game.resources()
                .building_count(crate::game::economy::BuildingKind::Farms),
            2
        );
        assert!(events.iter().any(|event| event.kind == EventKind::Success
            && event.message.contains(&project.name)));
    }

    #[test]
    fn research_cannot_be_repeated() {
        let mut game = game(6);
        game.resources_mut()
            .add_resource(ResourceKind::Gold, 500.0);
        game.start_research("agriculture_efficiency").expect("research");
        assert!(game.start_research("agriculture_efficiency").is_err());
        game.advance(60.0).expect("advance");
        assert!(game.resources().has_research("agriculture_efficiency"));
        assert!(game.research_projects().is_empty());
        assert!(game.start_research("agriculture_efficiency").is_err());
    }

    #[test]
    fn war_changes_kingdom_status_and_peace_restores_it() {
        let mut game = game(7);
        game.declare_war(1).expect("war");
        assert_eq!(game.kingdom_status(), KingdomStatus::AtWar);
        assert!(
            game.event_log()
                .entries()
                .any(|entry| entry.kind == EventKind::Danger)
        );
        assert!(
            game.propose_trade(
                1,
                &bundle(ResourceKind::Wood, 1.0),
                &bundle(ResourceKind::Gold, 1.0)
            )
            .is_err()
        );

        game.diplomacy_mut().set_relationship(1, PLAYER_ID, 10);
        assert_eq!(
            game.propose_peace(1).expect("peace"),
            PeaceOutcome::Accepted
        );
        assert_eq!(game.kingdom_status(), KingdomStatus::Stable);
    }

    #[test]
    fn offers_flow_through_the_game() {
        let mut game = game(8);
        game.countries_mut()[1].adjust_stock(ResourceKind::Magic, 40.0);
        let id = game.push_offer(
            1,
            bundle(ResourceKind::Magic, 10.0),
            bundle(ResourceKind::Wood, 10.0),
        );
        let received = game.accept_offer(id).expect("accept");
        assert_eq!(received.get(&ResourceKind::Magic), Some(&10.0));
        assert!(game.offers().is_empty());

        let id = game.push_offer(
            1,
            bundle(ResourceKind::Magic, 10.0),
            bundle(ResourceKind::Wood, 10.0),
        );
        let outcome = game
            .counter_offer(
                id,
                &bundle(ResourceKind::Wood, 20.0),
                &bundle(ResourceKind::Magic, 5.0),
            )
            .expect("counter");
        assert!(outcome.accepted());
        assert!(game.offers().is_empty());
    }

    #[test]
    fn offers_expire_after_their_lifetime() {
        let mut game = game(9);
        game.push_offer(
            1,
            bundle(ResourceKind::Gold, 1.0),
            bundle(ResourceKind::Wood, 1.0),
        );
        game.advance(59.0).expect("advance");
        assert_eq!(game.offers().len(), 1);
        game.advance(1.0).expect("advance");
        assert!(game.offers().is_empty());
    }

    #[test]
    fn declaring_war_withdraws_the_enemy_offers() {
        let mut game = game(10);
        game.countries_mut()[1].adjust_stock(ResourceKind::Gems, 20.0);
        game.countries_mut()[2].adjust_stock(ResourceKind::Gems, 20.0);
        let hostile = game.push_offer(
            1,
            bundle(ResourceKind::Gems, 5.0),
            bundle(ResourceKind::Wood, 5.0),
        );
        let neutral = game.push_offer(
            2,
            bundle(ResourceKind::Gems, 5.0),
            bundle(ResourceKind::Wood, 5.0),
        );

        game.declare_war(1).expect("war");
        assert_eq!(game.offers().len(), 1);
        assert_eq!(game.offers()[0].id, neutral);
        assert!(game.accept_offer(hostile).is_err());
        assert_eq!(game.resources().amount(ResourceKind::Wood), 100.0);
        assert!(
            game.event_log()
                .entries()
                .any(|entry| entry.message.contains("取り下げ"))
        );
    }

    #[test]
    fn negative_amounts_are_refused_by_the_game() {
        let mut game = game(11);
        game.countries_mut()[1].adjust_stock(ResourceKind::Iron, 10.0);
        let offered = ResourceBundle::from([
            (ResourceKind::Wood, 100.0),
            (ResourceKind::Gold, -100.0),
        ]);
        assert!(
            game.propose_trade(1, &offered, &bundle(ResourceKind::Iron, 1.0))
                .is_err()
        );
        assert_eq!(game.resources().amount(ResourceKind::Gold), 25.0);

        let id = game.push_offer(
            1,
            bundle(ResourceKind::Iron, 5.0),
            bundle(ResourceKind::Wood, 5.0),
        );
        assert!(
            game.counter_offer(id, &offered, &bundle(ResourceKind::Iron, 1.0))
                .is_err()
        );
        assert_eq!(game.offers().len(), 1);
        assert_eq!(game.resources().amount(ResourceKind::Wood), 100.0);
    }

    #[test]
    fn production_never_runs_ahead_of_the_clock() {
        let mut game = game(12);
        let wood_rate = game.resources().rate(ResourceKind::Wood);

        let events = game.advance(0.0004).expect("advance");
        assert!(events.is_empty());
        assert_eq!(game.now_millis(), 0);
        assert_eq!(game.resources().amount(ResourceKind::Wood), 100.0);

        game.advance(1.0004).expect("advance");
        assert_eq!(game.now_millis(), 1_000);
        let expected = 100.0 + wood_rate;
        assert!((game.resources().amount(ResourceKind::Wood) - expected).abs() < 1e-9);
    }
}
