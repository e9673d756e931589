mod bootstrap;
mod config;
mod constants;
pub(crate) use constants::*;
mod country;
mod diplomacy;
mod economy;
mod events;
mod names;
mod state;
pub(crate) mod systems;
mod time;
mod world;

pub use bootstrap::GameBuilder;
pub use config::{
    AbundanceConfig, CalendarConfig, DiplomacyConfig, EconomyConfig, MapConfig, RealmConfig,
    TraitConfig,
};
pub use country::{
    Army, Country, CountryId, CountryResource, CountrySummary, PLAYER_ID, PowerLevel, SizeClass,
    Traits,
};
pub use diplomacy::{
    Alliance, Diplomacy, DiplomaticEvent, OfferBook, PeaceOutcome, RelationshipStatus, Stance,
    TradeAssessment, TradeOffer, TradeOutcome, War, draft_offer, evaluate_trade,
};
pub use economy::{
    BuildingCatalog, BuildingDefinition, BuildingKind, ConstructionProject, EconomyTick,
    ResearchCatalog, ResearchProject, ResearchTopic, ResourceBundle, ResourceKind,
    ResourceManager, WorkerGroup, WorkerKind, Workforce, bundle_value, describe_bundle,
    parse_bundle,
};
pub use events::{EVENT_LOG_CAPACITY, EventKind, EventLog, GameEvent, LoggedEvent};
pub use names::{NameRegistry, generate_country_name};
pub use state::{GameState, KingdomStatus, TimeStatus};
pub use world::{
    BoundingBox, Continent, FeatureKind, Point, TerrainFeature, WorldMap, point_in_polygon,
};
