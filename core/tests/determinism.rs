use fantasy_realm_core::{GameState, RealmConfig, ResourceKind};

fn snapshot(game: &GameState) -> Vec<(String, u32, Vec<usize>)> {
    game.countries()
        .iter()
        .map(|country| (country.name.clone(), country.size, country.neighbours.clone()))
        .collect()
}

#[test]
fn same_seed_replays_the_same_session() {
    let config = RealmConfig::from_embedded().expect("config");
    let mut first = GameState::from_config_with_seed(config.clone(), 2024).expect("game");
    let mut second = GameState::from_config_with_seed(config, 2024).expect("game");
    assert_eq!(snapshot(&first), snapshot(&second));

    let first_events = first.advance(120.0).expect("advance");
    let second_events = second.advance(120.0).expect("advance");
    assert_eq!(first_events, second_events);
    for kind in ResourceKind::ALL {
        assert_eq!(
            first.resources().amount(kind),
            second.resources().amount(kind)
        );
    }
    assert_eq!(first.diplomacy().wars(), second.diplomacy().wars());
    assert_eq!(first.offers(), second.offers());
}

#[test]
fn different_seeds_build_different_worlds() {
    let config = RealmConfig::from_embedded().expect("config");
    let first = GameState::from_config_with_seed(config.clone(), 1).expect("game");
    let second = GameState::from_config_with_seed(config, 2).expect("game");
    assert_ne!(snapshot(&first), snapshot(&second));
}
