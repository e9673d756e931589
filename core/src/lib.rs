mod game;
mod scheduler;
mod time;

pub use game::{
    AbundanceConfig, Alliance, Army, BoundingBox, BuildingCatalog, BuildingDefinition,
    BuildingKind, CalendarConfig, ConstructionProject, Continent, Country, CountryId,
    CountryResource, CountrySummary, Diplomacy, DiplomacyConfig, DiplomaticEvent,
    EVENT_LOG_CAPACITY, EconomyConfig, EconomyTick, EventKind, EventLog, FeatureKind, GameBuilder,
    GameEvent, GameState, KingdomStatus, LoggedEvent, MapConfig, NameRegistry, OfferBook,
    PLAYER_ID, PeaceOutcome, Point, PowerLevel, RealmConfig, RelationshipStatus, ResearchCatalog,
    ResearchProject, ResearchTopic, ResourceBundle, ResourceKind, ResourceManager, SizeClass,
    Stance, TerrainFeature, TimeStatus, TradeAssessment, TradeOffer, TradeOutcome, TraitConfig,
    Traits, War, WorkerGroup, WorkerKind, Workforce, WorldMap, bundle_value, describe_bundle,
    draft_offer, evaluate_trade, generate_country_name, parse_bundle, point_in_polygon,
};
pub use scheduler::{ScheduleSpec, ScheduledTask, Scheduler, TaskKind};
pub use time::{GameClock, ScheduledTime, Season, SeasonDate};
