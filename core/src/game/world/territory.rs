use std::f64::consts::TAU;

use rand::Rng;

use super::geometry::{Point, point_in_polygon, sort_by_angle};
use super::terrain::Continent;
use crate::game::country::{Country, CountryId};

/// Nearest-capital ownership over a regular grid covering a continent's bounding box.
struct TerritoryGrid {
    origin: Point,
    resolution: f64,
    width: usize,
    height: usize,
    owners: Vec<Option<usize>>,
}

impl TerritoryGrid {
    fn build(continent: &Continent, capitals: &[Point], resolution: f64) -> Self {
        let bbox = continent.bounding_box;
        let width = (bbox.width / resolution).ceil().max(0.0) as usize;
        let height = (bbox.height / resolution).ceil().max(0.0) as usize;
        let origin = Point::new(bbox.x, bbox.y);
        let mut owners = vec![None; width * height];
        for gx in 0..width {
            for gy in 0..height {
                let cell = Point::new(
                    origin.x + gx as f64 * resolution,
                    origin.y + gy as f64 * resolution,
                );
                if !point_in_polygon(cell, &continent.points) {
                    continue;
                }
                owners[gy * width + gx] = nearest(cell, capitals);
            }
        }
        Self {
            origin,
            resolution,
            width,
            height,
            owners,
        }
    }

    fn owner(&self, gx: usize, gy: usize) -> Option<usize> {
        self.owners[gy * self.width + gx]
    }

    fn cell_count(&self, owner: usize) -> usize {
        self.owners
            .iter()
            .filter(|cell| **cell == Some(owner))
            .count()
    }

    fn is_boundary(&self, gx: usize, gy: usize, owner: usize) -> bool {
        let x_range = gx.saturating_sub(1)..=(gx + 1).min(self.width - 1);
        for nx in x_range {
            let y_range = gy.saturating_sub(1)..=(gy + 1).min(self.height - 1);
            for ny in y_range {
                if nx == gx && ny == gy {
                    continue;
                }
                if self.owner(nx, ny) != Some(owner) {
                    return true;
                }
            }
        }
        false
    }

    fn boundary_points(&self, owner: usize) -> Vec<Point> {
        let mut points = Vec::new();
        for gx in 0..self.width {
            for gy in 0..self.height {
                if self.owner(gx, gy) != Some(owner) {
                    continue;
                }
                if self.is_boundary(gx, gy, owner) {
                    points.push(Point::new(
                        self.origin.x + gx as f64 * self.resolution,
                        self.origin.y + gy as f64 * self.resolution,
                    ));
                }
            }
        }
        points
    }
}

fn nearest(cell: Point, capitals: &[Point]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, capital) in capitals.iter().enumerate() {
        let dist = capital.distance_to(&cell);
        if best.map(|(_, best_dist)| dist < best_dist).unwrap_or(true) {
            best = Some((idx, dist));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Assigns territory polygons and cell counts to every country on the continent.
pub fn divide_continent<R: Rng + ?Sized>(
    continent: &Continent,
    countries: &mut [Country],
    resolution: f64,
    rng: &mut R,
) {
    if continent.countries.is_empty() {
        return;
    }
    let capitals: Vec<Point> = continent
        .countries
        .iter()
        .map(|&id| countries[id].position())
        .collect();
    let grid = TerritoryGrid::build(continent, &capitals, resolution);

    if continent.countries.len() == 1 {
        let country = &mut countries[continent.countries[0]];
        country.territory = continent.points.clone();
        country.territory_cells = grid.cell_count(0);
        return;
    }

    for (local, &id) in continent.countries.iter().enumerate() {
        let mut points = grid.boundary_points(local);
        let cells = grid.cell_count(local);
        let country = &mut countries[id];
        if points.len() > 2 {
            sort_by_angle(&mut points, country.position());
            country.territory = points;
        } else {
            country.territory = fallback_shape(country.position(), rng);
        }
        country.territory_cells = cells;
    }
}

pub fn fallback_shape<R: Rng + ?Sized>(center: Point, rng: &mut R) -> Vec<Point> {
    let vertex_count = 8 + rng.gen_range(0..4);
    let base_radius = 50.0 + 30.0 * rng.gen_range(0.0..1.0);
    (0..vertex_count)
        .map(|i| {
            let angle = i as f64 / vertex_count as f64 * TAU;
            let radius = base_radius * (0.8 + 0.4 * rng.gen_range(0.0..1.0));
            Point::new(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
        })
        .collect()
}

/// Countries on the same continent whose capitals are closer than `threshold`.
pub fn link_neighbours(continents: &[Continent], countries: &mut [Country], threshold: f64) {
    for country in countries.iter_mut() {
        country.neighbours.clear();
    }
    for continent in continents {
        for (i, &a) in continent.countries.iter().enumerate() {
            for &b in &continent.countries[i + 1..] {
                let dist = countries[a].position().distance_to(&countries[b].position());
                if dist < threshold {
                    countries[a].neighbours.push(b);
                    countries[b].neighbours.push(a);
                }
            }
        }
    }
}

pub fn country_at(countries: &[Country], point: Point) -> Option<CountryId> {
    countries
        .iter()
        .find(|country| point_in_polygon(point, &country.territory))
        .map(|country| country.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RealmConfig;
    use crate::game::country::CountrySeed;
    use crate::game::world::geometry::BoundingBox;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn diamond_continent(countries: Vec<CountryId>) -> Continent {
        let points = vec![
            Point::new(200.0, 0.0),
            Point::new(400.0, 100.0),
            Point::new(200.0, 200.0),
            Point::new(0.0, 100.0),
        ];
        Continent {
            id: 0,
            seed: Point::new(200.0, 100.0),
            size_factor: 1.0,
            bounding_box: BoundingBox::from_points(&points),
            points,
            max_countries: 2,
            countries,
        }
    }

    fn country_at_position(id: CountryId, x: f64, y: f64, rng: &mut StdRng) -> Country {
        let config = RealmConfig::from_embedded().expect("config");
        Country::generate(
            CountrySeed {
                id,
                name: format!("Test{id}"),
                color: "#000000".into(),
                position: Point::new(x, y),
                size: 6,
                continent: 0,
                is_player: id == 0,
            },
            &config.traits,
            &config.abundance,
            rng,
        )
    }

    #[test]
    fn two_countries_split_the_continent() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut countries = vec![
            country_at_position(0, 100.0, 100.0, &mut rng),
            country_at_position(1, 300.0, 100.0, &mut rng),
        ];
        let continent = diamond_continent(vec![0, 1]);
        divide_continent(&continent, &mut countries, 10.0, &mut rng);

        assert!(countries[0].territory.len() > 2);
        assert!(countries[0].territory_cells > 0);
        assert!(countries[1].territory_cells > 0);
        assert!(countries[0].territory.iter().all(|p| p.x <= 200.0));
        assert!(countries[1].territory.iter().all(|p| p.x >= 200.0));
        assert_eq!(country_at(&countries, Point::new(305.0, 102.0)), Some(1));
        assert_eq!(country_at(&countries, Point::new(95.0, 98.0)), Some(0));
    }

    #[test]
    fn lone_country_takes_whole_continent() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut countries = vec![country_at_position(0, 200.0, 100.0, &mut rng)];
        let continent = diamond_continent(vec![0]);
        divide_continent(&continent, &mut countries, 10.0, &mut rng);
        assert_eq!(countries[0].territory, continent.points);
        assert!(countries[0].territory_cells > 0);
    }

    #[test]
    fn fallback_shape_stays_near_capital() {
        let mut rng = StdRng::seed_from_u64(3);
        let center = Point::new(50.0, 50.0);
        let shape = fallback_shape(center, &mut rng);
        assert!((8..12).contains(&shape.len()));
        for point in shape {
            let dist = point.distance_to(&center);
            assert!(dist >= 50.0 * 0.8 - 1e-9 && dist <= 80.0 * 1.2 + 1e-9);
        }
    }

    #[test]
    fn neighbours_are_symmetric_and_distance_bound() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut countries = vec![
            country_at_position(0, 100.0, 100.0, &mut rng),
            country_at_position(1, 200.0, 100.0, &mut rng),
            country_at_position(2, 390.0, 100.0, &mut rng),
        ];
        let mut continent = diamond_continent(vec![0, 1, 2]);
        continent.max_countries = 3;
        link_neighbours(&[continent], &mut countries, 150.0);
        assert_eq!(countries[0].neighbours, vec![1]);
        assert_eq!(countries[1].neighbours, vec![0]);
        assert!(countries[2].neighbours.is_empty());
    }
}
