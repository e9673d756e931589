use std::cmp::Ordering;

use rand::Rng;
use tracing::debug;

use super::geometry::Point;
use super::terrain::Continent;
use crate::game::config::RealmConfig;
use crate::game::country::{Country, CountrySeed, PLAYER_ID};
use crate::game::names::{NameRegistry, chance, random_color, random_int};

const PLAYER_SIZE: u32 = 10;

/// Continent indices ordered by bounding-box area, largest first.
pub fn continents_by_area(continents: &[Continent]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..continents.len()).collect();
    order.sort_by(|&a, &b| {
        continents[b]
            .area()
            .partial_cmp(&continents[a].area())
            .unwrap_or(Ordering::Equal)
    });
    order
}

pub fn place_countries<R: Rng + ?Sized>(
    continents: &mut [Continent],
    config: &RealmConfig,
    player_name: &str,
    rng: &mut R,
) -> Vec<Country> {
    let order = continents_by_area(continents);
    let Some(&largest) = order.first() else {
        return Vec::new();
    };
    let player_continent = if chance(rng, config.map.player_on_largest_chance) {
        largest
    } else {
        order.get(1).copied().unwrap_or(largest)
    };

    let mut names = NameRegistry::new();
    names.reserve(player_name);

    let player_position = continents[player_continent].bounding_box.center();
    let player = Country::generate(
        CountrySeed {
            id: PLAYER_ID,
            name: player_name.to_string(),
            color: config.player_color.clone(),
            position: player_position,
            size: PLAYER_SIZE,
            continent: player_continent,
            is_player: true,
        },
        &config.traits,
        &config.abundance,
        rng,
    );
    continents[player_continent].countries.push(PLAYER_ID);
    let mut countries = vec![player];

    for &continent_idx in &order {
        let remaining = continents[continent_idx]
            .max_countries
            .saturating_sub(continents[continent_idx].countries.len());
        for _ in 0..remaining {
            let Some(position) =
                find_position(&continents[continent_idx], &countries, config, rng)
            else {
                debug!(
                    continent = continent_idx,
                    "国の配置候補が見つからなかったため枠を空けます"
                );
                continue;
            };
            let id = countries.len();
            let seed = CountrySeed {
                id,
                name: names.unique_name(rng),
                color: random_color(rng),
                position,
                size: random_int(rng, 6, 9) as u32,
                continent: continent_idx,
                is_player: false,
            };
            countries.push(Country::generate(
                seed,
                &config.traits,
                &config.abundance,
                rng,
            ));
            continents[continent_idx].countries.push(id);
        }
    }
    countries
}

fn find_position<R: Rng + ?Sized>(
    continent: &Continent,
    countries: &[Country],
    config: &RealmConfig,
    rng: &mut R,
) -> Option<Point> {
    let bbox = continent.bounding_box;
    for _ in 0..config.map.placement_attempts {
        let candidate = Point::new(
            bbox.x + rng.gen_range(0.0..1.0) * bbox.width,
            bbox.y + rng.gen_range(0.0..1.0) * bbox.height,
        );
        if !continent.contains(candidate) {
            continue;
        }
        let too_close = continent.countries.iter().any(|&id| {
            countries[id].position().distance_to(&candidate) < config.map.min_country_distance
        });
        if !too_close {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::terrain::generate_continents;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn player_is_first_and_countries_keep_their_distance() {
        let config = RealmConfig::from_embedded().expect("config");
        let mut rng = StdRng::seed_from_u64(21);
        let mut continents = generate_continents(&config.map, &mut rng);
        let countries = place_countries(&mut continents, &config, "Eldoria", &mut rng);

        let player = &countries[PLAYER_ID];
        assert!(player.is_player);
        assert_eq!(player.name, "Eldoria");
        assert_eq!(player.size, 10);
        assert_eq!(player.color, "#4b86b4");

        let order = continents_by_area(&continents);
        assert!(player.continent == order[0] || player.continent == order[1]);

        for (idx, country) in countries.iter().enumerate() {
            assert_eq!(country.id, idx);
            if !country.is_player {
                assert!((6..=9).contains(&country.size));
                assert!(continents[country.continent].contains(country.position()));
            }
        }
        for continent in &continents {
            assert!(continent.countries.len() <= continent.max_countries);
            for (i, &a) in continent.countries.iter().enumerate() {
                for &b in &continent.countries[i + 1..] {
                    let gap = countries[a].position().distance_to(&countries[b].position());
                    assert!(gap >= config.map.min_country_distance);
                }
            }
        }
    }

    #[test]
    fn area_order_is_descending() {
        let config = RealmConfig::from_embedded().expect("config");
        let mut rng = StdRng::seed_from_u64(5);
        let continents = generate_continents(&config.map, &mut rng);
        let order = continents_by_area(&continents);
        for pair in order.windows(2) {
            assert!(continents[pair[0]].area() >= continents[pair[1]].area());
        }
    }
}
