mod geometry;
mod noise;
mod placement;
mod terrain;
mod territory;

use rand::Rng;
use tracing::info;

pub use geometry::{BoundingBox, Point, point_in_polygon, sort_by_angle};
pub use noise::coastline_noise;
pub use placement::continents_by_area;
pub use terrain::{Continent, FeatureKind, TerrainFeature};

use super::config::RealmConfig;
use super::country::{Country, CountryId};

#[derive(Debug, Clone)]
pub struct WorldMap {
    pub width: f64,
    pub height: f64,
    pub continents: Vec<Continent>,
    pub features: Vec<TerrainFeature>,
}

impl WorldMap {
    /// Builds terrain, places countries, partitions territory and links neighbours.
    pub fn generate<R: Rng + ?Sized>(
        config: &RealmConfig,
        player_name: &str,
        rng: &mut R,
    ) -> (Self, Vec<Country>) {
        let mut continents = terrain::generate_continents(&config.map, rng);
        let features = terrain::generate_features(&continents, rng);
        let mut countries = placement::place_countries(&mut continents, config, player_name, rng);
        for continent in &continents {
            territory::divide_continent(
                continent,
                &mut countries,
                config.map.territory_resolution,
                rng,
            );
        }
        territory::link_neighbours(&continents, &mut countries, config.map.adjacency_distance);

        info!(
            continents = continents.len(),
            countries = countries.len(),
            features = features.len(),
            "世界地図を生成しました"
        );

        let map = Self {
            width: config.map.width,
            height: config.map.height,
            continents,
            features,
        };
        (map, countries)
    }

    pub fn continent(&self, id: usize) -> Option<&Continent> {
        self.continents.get(id)
    }

    pub fn country_at(&self, countries: &[Country], x: f64, y: f64) -> Option<CountryId> {
        territory::country_at(countries, Point::new(x, y))
    }
}
