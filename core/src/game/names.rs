use std::collections::HashSet;

use rand::Rng;

const NAME_PREFIXES: [&str; 20] = [
    "Eld", "Aer", "Syl", "Dra", "Kry", "Myr", "Ith", "Val", "Zor", "Thal", "Ar", "Bre", "Cae",
    "Dun", "Eth", "Fro", "Gil", "Hav", "Ir", "Jor",
];

const NAME_SUFFIXES: [&str; 20] = [
    "oria", "anth", "vain", "mor", "stal", "thas", "lodor", "rain", "gard", "heim", "land", "mark",
    "ren", "wyn", "dale", "ton", "shire", "vale", "crest", "haven",
];

const NAME_REROLLS: usize = 20;

/// Inclusive on both ends.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..max)
}

pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    rng.gen_range(0.0..1.0) < probability
}

pub fn random_choice<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    Some(&items[rng.gen_range(0..items.len())])
}

pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..0xFF_FFFFu32))
}

pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

pub fn generate_country_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    format!("{prefix}{suffix}")
}

/// Hands out country names that are unique within one world.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_ascii_lowercase());
    }

    pub fn unique_name<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let mut candidate = generate_country_name(rng);
        for _ in 0..NAME_REROLLS {
            if !self.is_taken(&candidate) {
                break;
            }
            candidate = generate_country_name(rng);
        }
        if self.is_taken(&candidate) {
            let base = candidate;
            let mut ordinal = 2;
            candidate = format!("{base} {}", roman_numeral(ordinal));
            while self.is_taken(&candidate) {
                ordinal += 1;
                candidate = format!("{base} {}", roman_numeral(ordinal));
            }
        }
        self.reserve(&candidate);
        candidate
    }

    fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name.to_ascii_lowercase())
    }
}

fn roman_numeral(mut value: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (amount, symbol) in TABLE {
        while value >= amount {
            out.push_str(symbol);
            value -= amount;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn helpers_respect_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let value = random_int(&mut rng, 10, 50);
            assert!((10..=50).contains(&value));
            let float = random_float(&mut rng, 0.7, 1.3);
            assert!((0.7..1.3).contains(&float));
        }
        assert!(!chance(&mut rng, 0.0));
        assert!(chance(&mut rng, 1.0));
        assert!(random_choice::<u8, _>(&mut rng, &[]).is_none());
        let color = random_color(&mut rng);
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert_eq!(distance(0.0, 0.0, 3.0, 4.0), 5.0);
    }

    #[test]
    fn generated_names_combine_syllables() {
        let mut rng = StdRng::seed_from_u64(9);
        let name = generate_country_name(&mut rng);
        assert!(NAME_PREFIXES.iter().any(|prefix| name.starts_with(prefix)));
        assert!(NAME_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)));
    }

    #[test]
    fn registry_never_repeats_names() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut registry = NameRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let name = registry.unique_name(&mut rng);
            assert!(seen.insert(name));
        }
    }

    #[test]
    fn roman_numerals_for_suffixes() {
        assert_eq!(roman_numeral(2), "II");
        assert_eq!(roman_numeral(14), "XIV");
    }
}
