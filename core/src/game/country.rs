use std::collections::BTreeMap;

use rand::Rng;

use super::config::{AbundanceConfig, TraitConfig};
use super::economy::ResourceKind;
use super::names::{chance, random_float, random_int};
use super::world::Point;

pub type CountryId = usize;

pub const PLAYER_ID: CountryId = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryResource {
    pub production: f64,
    pub abundant: bool,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Traits {
    pub warlike: bool,
    pub trader: bool,
    pub diplomatic: bool,
    pub isolationist: bool,
}

impl Traits {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R, config: &TraitConfig) -> Self {
        let mut traits = Self {
            warlike: chance(rng, config.warlike),
            trader: chance(rng, config.trader),
            diplomatic: chance(rng, config.diplomatic),
            isolationist: chance(rng, config.isolationist),
        };
        if !traits.any() {
            match rng.gen_range(0..4) {
                0 => traits.warlike = true,
                1 => traits.trader = true,
                2 => traits.diplomatic = true,
                _ => traits.isolationist = true,
            }
        }
        traits
    }

    pub fn any(&self) -> bool {
        self.warlike || self.trader || self.diplomatic || self.isolationist
    }

    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.warlike, "Warlike"),
            (self.trader, "Trader"),
            (self.diplomatic, "Diplomatic"),
            (self.isolationist, "Isolationist"),
        ]
        .into_iter()
        .filter_map(|(active, name)| active.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Army {
    pub size: u32,
    pub power: f64,
    pub training: f64,
}

impl Army {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            size: random_int(rng, 10, 100) as u32,
            power: random_float(rng, 0.8, 1.2),
            training: random_float(rng, 0.8, 1.2),
        }
    }

    pub fn military_power(&self) -> f64 {
        self.size as f64 * self.power * self.training
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerLevel {
    Weak,
    Moderate,
    Strong,
    Formidable,
}

impl PowerLevel {
    pub fn from_power(power: f64) -> Self {
        if power < 50.0 {
            PowerLevel::Weak
        } else if power < 100.0 {
            PowerLevel::Moderate
        } else if power < 200.0 {
            PowerLevel::Strong
        } else {
            PowerLevel::Formidable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerLevel::Weak => "弱小",
            PowerLevel::Moderate => "中程度",
            PowerLevel::Strong => "強大",
            PowerLevel::Formidable => "圧倒的",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Massive,
}

impl SizeClass {
    pub fn from_size(size: u32) -> Self {
        if size >= 9 {
            SizeClass::Massive
        } else if size >= 7 {
            SizeClass::Large
        } else if size >= 5 {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeClass::Small => "小国",
            SizeClass::Medium => "中規模",
            SizeClass::Large => "大国",
            SizeClass::Massive => "超大国",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountrySummary {
    pub name: String,
    pub color: String,
    pub power: PowerLevel,
    pub army_size: u32,
    pub abundant_resources: Vec<ResourceKind>,
    pub traits: Vec<&'static str>,
}

/// Placement data handed to `Country::generate`.
#[derive(Debug, Clone)]
pub struct CountrySeed {
    pub id: CountryId,
    pub name: String,
    pub color: String,
    pub position: Point,
    pub size: u32,
    pub continent: usize,
    pub is_player: bool,
}

#[derive(Debug, Clone)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub size: u32,
    pub continent: usize,
    pub resources: BTreeMap<ResourceKind, CountryResource>,
    pub traits: Traits,
    pub army: Army,
    pub neighbours: Vec<CountryId>,
    pub territory: Vec<Point>,
    pub territory_cells: usize,
    pub is_player: bool,
}

impl Country {
    pub fn generate<R: Rng + ?Sized>(
        seed: CountrySeed,
        traits: &TraitConfig,
        abundance: &AbundanceConfig,
        rng: &mut R,
    ) -> Self {
        let mut resources = BTreeMap::new();
        for kind in ResourceKind::COUNTRY {
            let base = random_float(rng, 0.7, 1.3);
            let abundant = chance(rng, abundance.chance);
            let multiplier = if abundant { abundance.multiplier } else { 1.0 };
            let amount = if abundant {
                random_int(rng, 50, 200)
            } else {
                random_int(rng, 10, 50)
            };
            resources.insert(
                kind,
                CountryResource {
                    production: base * multiplier,
                    abundant,
                    amount: amount as f64,
                },
            );
        }
        let traits = Traits::roll(rng, traits);
        let army = Army::roll(rng);

        Self {
            id: seed.id,
            name: seed.name,
            color: seed.color,
            x: seed.position.x,
            y: seed.position.y,
            size: seed.size,
            continent: seed.continent,
            resources,
            traits,
            army,
            neighbours: Vec::new(),
            territory: Vec::new(),
            territory_cells: 0,
            is_player: seed.is_player,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn military_power(&self) -> f64 {
        self.army.military_power()
    }

    pub fn power_level(&self) -> PowerLevel {
        PowerLevel::from_power(self.military_power())
    }

    pub fn size_class(&self) -> SizeClass {
        SizeClass::from_size(self.size)
    }

    pub fn abundant_resources(&self) -> Vec<ResourceKind> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource.abundant)
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn stock(&self, kind: ResourceKind) -> f64 {
        self.resources
            .get(&kind)
            .map(|resource| resource.amount)
            .unwrap_or(0.0)
    }

    pub(crate) fn adjust_stock(&mut self, kind: ResourceKind, delta: f64) {
        let entry = self.resources.entry(kind).or_insert(CountryResource {
            production: 1.0,
            abundant: false,
            amount: 0.0,
        });
        entry.amount = (entry.amount + delta).max(0.0);
    }

    /// Multipliers the player's own economy gets from abundant resources it also produces.
    pub fn production_bonuses(&self, bonus: f64) -> Vec<(ResourceKind, f64)> {
        self.abundant_resources()
            .into_iter()
            .filter(|kind| {
                matches!(
                    kind,
                    ResourceKind::Food | ResourceKind::Wood | ResourceKind::Stone | ResourceKind::Gold
                )
            })
            .map(|kind| (kind, bonus))
            .collect()
    }

    pub fn summary(&self) -> CountrySummary {
        CountrySummary {
            name: self.name.clone(),
            color: self.color.clone(),
            power: self.power_level(),
            army_size: self.army.size,
            abundant_resources: self.abundant_resources(),
            traits: self.traits.names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RealmConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample(rng: &mut StdRng) -> Country {
        let config = RealmConfig::from_embedded().expect("config");
        Country::generate(
            CountrySeed {
                id: 3,
                name: "Valmark".into(),
                color: "#123456".into(),
                position: Point::new(100.0, 200.0),
                size: 7,
                continent: 1,
                is_player: false,
            },
            &config.traits,
            &config.abundance,
            rng,
        )
    }

    #[test]
    fn generated_country_respects_ranges() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let country = sample(&mut rng);
            assert!(country.traits.any());
            assert!((10..=100).contains(&country.army.size));
            assert_eq!(country.resources.len(), 7);
            for resource in country.resources.values() {
                if resource.abundant {
                    assert!((50.0..=200.0).contains(&resource.amount));
                    assert!(resource.production >= 0.7 * 2.5);
                } else {
                    assert!((10.0..=50.0).contains(&resource.amount));
                    assert!(resource.production < 1.3);
                }
            }
        }
    }

    #[test]
    fn power_and_size_descriptions() {
        assert_eq!(PowerLevel::from_power(49.9), PowerLevel::Weak);
        assert_eq!(PowerLevel::from_power(50.0), PowerLevel::Moderate);
        assert_eq!(PowerLevel::from_power(150.0), PowerLevel::Strong);
        assert_eq!(PowerLevel::from_power(200.0), PowerLevel::Formidable);
        assert_eq!(SizeClass::from_size(10), SizeClass::Massive);
        assert_eq!(SizeClass::from_size(7), SizeClass::Large);
        assert_eq!(SizeClass::from_size(5), SizeClass::Medium);
        assert_eq!(SizeClass::from_size(4), SizeClass::Small);
    }

    #[test]
    fn production_bonuses_only_cover_player_goods() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut country = sample(&mut rng);
        for (kind, resource) in country.resources.iter_mut() {
            resource.abundant = matches!(kind, ResourceKind::Food | ResourceKind::Magic);
        }
        let bonuses = country.production_bonuses(1.25);
        assert_eq!(bonuses, vec![(ResourceKind::Food, 1.25)]);
        let summary = country.summary();
        assert_eq!(
            summary.abundant_resources,
            vec![ResourceKind::Food, ResourceKind::Magic]
        );
    }
}
