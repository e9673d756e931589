use std::f64::consts::TAU;

use rand::Rng;

use super::geometry::{BoundingBox, Point, point_in_polygon};
use super::noise::coastline_noise;
use crate::game::config::MapConfig;
use crate::game::country::CountryId;
use crate::game::names::{chance, random_int};

#[derive(Debug, Clone)]
pub struct Continent {
    pub id: usize,
    pub seed: Point,
    pub size_factor: f64,
    pub points: Vec<Point>,
    pub bounding_box: BoundingBox,
    pub max_countries: usize,
    pub countries: Vec<CountryId>,
}

impl Continent {
    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.points)
    }

    pub fn area(&self) -> f64 {
        self.bounding_box.area()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Mountain,
    Forest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainFeature {
    pub kind: FeatureKind,
    pub continent: usize,
    pub position: Point,
    pub size: f64,
}

pub fn generate_continents<R: Rng + ?Sized>(config: &MapConfig, rng: &mut R) -> Vec<Continent> {
    let count = random_int(
        rng,
        config.continent_min as i64,
        config.continent_max as i64,
    ) as usize;

    let seeds: Vec<(Point, f64)> = (0..count)
        .map(|_| {
            let x = config.width * (0.1 + 0.8 * rng.gen_range(0.0..1.0));
            let y = config.height * (0.1 + 0.8 * rng.gen_range(0.0..1.0));
            let size = 0.5 + 0.5 * rng.gen_range(0.0..1.0);
            (Point::new(x, y), size)
        })
        .collect();

    seeds
        .into_iter()
        .enumerate()
        .map(|(id, (seed, size_factor))| {
            let points = continent_shape(config, seed, size_factor, rng);
            let bounding_box = BoundingBox::from_points(&points);
            let max_countries = ((bounding_box.area() / config.area_per_country).floor() as usize)
                .clamp(
                    config.min_countries_per_continent,
                    config.max_countries_per_continent,
                );
            Continent {
                id,
                seed,
                size_factor,
                points,
                bounding_box,
                max_countries,
                countries: Vec::new(),
            }
        })
        .collect()
}

fn continent_shape<R: Rng + ?Sized>(
    config: &MapConfig,
    seed: Point,
    size_factor: f64,
    rng: &mut R,
) -> Vec<Point> {
    let vertex_count = 24 + rng.gen_range(0..12);
    let base_radius = config.width.min(config.height) * 0.15 * size_factor;
    (0..vertex_count)
        .map(|i| {
            let angle = i as f64 / vertex_count as f64 * TAU;
            let (sin, cos) = angle.sin_cos();
            let roughness = 0.6 + 0.4 * coastline_noise(seed.x + cos * 100.0, seed.y + sin * 100.0);
            let radius = base_radius * roughness;
            Point::new(seed.x + cos * radius, seed.y + sin * radius)
        })
        .collect()
}

pub fn generate_features<R: Rng + ?Sized>(
    continents: &[Continent],
    rng: &mut R,
) -> Vec<TerrainFeature> {
    let mut features = Vec::new();
    for continent in continents {
        let bbox = continent.bounding_box;
        if chance(rng, 0.5) {
            let candidates = 5 + rng.gen_range(0..10);
            let spread_x = bbox.width * 0.3;
            let spread_y = bbox.height * 0.3;
            for _ in 0..candidates {
                let x = bbox.center_x + (rng.gen_range(0.0..1.0) - 0.5) * spread_x;
                let y = bbox.center_y + (rng.gen_range(0.0..1.0) - 0.5) * spread_y;
                let size = 5.0 + 10.0 * rng.gen_range(0.0..1.0);
                let position = Point::new(x, y);
                if continent.contains(position) {
                    features.push(TerrainFeature {
                        kind: FeatureKind::Mountain,
                        continent: continent.id,
                        position,
                        size,
                    });
                }
            }
        }
        if chance(rng, 0.7) {
            let candidates = 5 + rng.gen_range(0..10);
            for _ in 0..candidates {
                let x = bbox.x + rng.gen_range(0.0..1.0) * bbox.width;
                let y = bbox.y + rng.gen_range(0.0..1.0) * bbox.height;
                let size = 10.0 + 15.0 * rng.gen_range(0.0..1.0);
                let position = Point::new(x, y);
                if continent.contains(position) {
                    features.push(TerrainFeature {
                        kind: FeatureKind::Forest,
                        continent: continent.id,
                        position,
                        size,
                    });
                }
            }
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RealmConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn continents_follow_configured_shape_rules() {
        let config = RealmConfig::from_embedded().expect("config").map;
        let mut rng = StdRng::seed_from_u64(4);
        let continents = generate_continents(&config, &mut rng);
        assert!((4..=6).contains(&continents.len()));
        for continent in &continents {
            assert!((24..36).contains(&continent.points.len()));
            assert!((0.5..1.0).contains(&continent.size_factor));
            assert!((2..=12).contains(&continent.max_countries));
            let max_radius = config.width.min(config.height) * 0.15 * continent.size_factor;
            for point in &continent.points {
                assert!(point.distance_to(&continent.seed) <= max_radius + 1e-9);
            }
        }
    }

    #[test]
    fn features_lie_inside_their_continent() {
        let config = RealmConfig::from_embedded().expect("config").map;
        let mut rng = StdRng::seed_from_u64(8);
        let continents = generate_continents(&config, &mut rng);
        let features = generate_features(&continents, &mut rng);
        for feature in features {
            assert!(continents[feature.continent].contains(feature.position));
            match feature.kind {
                FeatureKind::Mountain => assert!((5.0..15.0).contains(&feature.size)),
                FeatureKind::Forest => assert!((10.0..25.0).contains(&feature.size)),
            }
        }
    }
}
