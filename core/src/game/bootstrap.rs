use anyhow::{Result, ensure};
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use super::{
    config::RealmConfig,
    country::{Country, PLAYER_ID},
    diplomacy::Diplomacy,
    economy::{BuildingCatalog, ResearchCatalog, ResourceManager},
    state::GameState,
    world::WorldMap,
};
use crate::{ScheduleSpec, ScheduledTask, Scheduler, TaskKind};

pub struct GameBuilder {
    config: RealmConfig,
    player_name: Option<String>,
    buildings: Option<BuildingCatalog>,
    research: Option<ResearchCatalog>,
    rng: StdRng,
}

impl GameBuilder {
    pub fn new(config: RealmConfig) -> Self {
        Self {
            config,
            player_name: None,
            buildings: None,
            research: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    pub fn with_building_catalog(mut self, catalog: BuildingCatalog) -> Self {
        self.buildings = Some(catalog);
        self
    }

    pub fn with_research_catalog(mut self, catalog: ResearchCatalog) -> Self {
        self.research = Some(catalog);
        self
    }

    pub fn build(self) -> Result<GameState> {
        let bootstrap = self.into_bootstrap()?;
        Ok(GameState::new(bootstrap))
    }

    pub(crate) fn into_bootstrap(self) -> Result<GameBootstrap> {
        let GameBuilder {
            mut config,
            player_name,
            buildings,
            research,
            mut rng,
        } = self;
        if let Some(name) = player_name {
            ensure!(!name.trim().is_empty(), "プレイヤー国名が空です");
            config.player_name = name.trim().to_string();
        }
        config.validate()?;

        let buildings = match buildings {
            Some(catalog) => catalog,
            None => BuildingCatalog::from_embedded()?,
        };
        let research = match research {
            Some(catalog) => catalog,
            None => ResearchCatalog::from_embedded()?,
        };

        let (map, countries) = WorldMap::generate(&config, &config.player_name, &mut rng);
        ensure!(
            !countries.is_empty(),
            "国を1つも配置できませんでした。地図設定を見直してください。"
        );

        let mut diplomacy = Diplomacy::new(config.diplomacy.clone());
        diplomacy.initialise_relationships(countries.len(), &mut rng);

        let mut economy = ResourceManager::new(config.economy.clone());
        apply_player_bonuses(&mut economy, &countries[PLAYER_ID], &config);

        let mut scheduler = Scheduler::new();
        register_core_tasks(&mut scheduler, &config);

        info!(
            player = %config.player_name,
            countries = countries.len(),
            "ゲームを初期化しました"
        );

        Ok(GameBootstrap {
            config,
            rng,
            scheduler,
            map,
            countries,
            diplomacy,
            economy,
            buildings,
            research,
        })
    }
}

pub(crate) struct GameBootstrap {
    pub(crate) config: RealmConfig,
    pub(crate) rng: StdRng,
    pub(crate) scheduler: Scheduler,
    pub(crate) map: WorldMap,
    pub(crate) countries: Vec<Country>,
    pub(crate) diplomacy: Diplomacy,
    pub(crate) economy: ResourceManager,
    pub(crate) buildings: BuildingCatalog,
    pub(crate) research: ResearchCatalog,
}

fn apply_player_bonuses(economy: &mut ResourceManager, player: &Country, config: &RealmConfig) {
    for (kind, multiplier) in player.production_bonuses(config.abundance.player_bonus) {
        economy.set_production_bonus(kind, multiplier);
    }
}

fn register_core_tasks(scheduler: &mut Scheduler, config: &RealmConfig) {
    let day_millis = config.day_millis();
    scheduler.schedule(
        ScheduledTask::new(TaskKind::DailyUpkeep, day_millis)
            .with_schedule(ScheduleSpec::Daily(day_millis)),
    );
}
