use rand::Rng;
use tracing::debug;

use crate::game::FRIENDLY_GESTURE_MIN;
use crate::game::country::{Country, PLAYER_ID};
use crate::game::diplomacy::{DiplomaticEvent, Diplomacy, OfferBook, Stance, draft_offer};
use crate::game::names::{chance, random_int};

/// One round of country-to-country diplomacy. The player is only ever a target.
pub(crate) fn diplomatic_pulse<R: Rng + ?Sized>(
    diplomacy: &mut Diplomacy,
    countries: &[Country],
    rng: &mut R,
) {
    let settings = diplomacy.settings().clone();
    for actor in countries.iter().filter(|country| !country.is_player) {
        if !chance(rng, settings.ai_action_chance) {
            continue;
        }
        let others: Vec<usize> = countries
            .iter()
            .map(|country| country.id)
            .filter(|&id| id != actor.id)
            .collect();
        if others.is_empty() {
            continue;
        }
        let target = others[rng.gen_range(0..others.len())];
        let relationship = diplomacy.relationship(actor.id, target);

        if relationship <= settings.war_threshold && actor.traits.warlike {
            debug!(actor = actor.id, target, relationship, "AIが戦争を選択しました");
            diplomacy.start_war(actor.id, target);
        } else if (FRIENDLY_GESTURE_MIN..settings.alliance_threshold).contains(&relationship) {
            let gift = random_int(rng, 1, 3) as i32;
            diplomacy.modify_relationship(actor.id, target, gift);
            diplomacy.modify_relationship(target, actor.id, gift);
            debug!(actor = actor.id, target, gift, "AIが友好使節を送りました");
            if target == PLAYER_ID && chance(rng, settings.gesture_notice_chance) {
                diplomacy.record(DiplomaticEvent::Gesture {
                    from: actor.id,
                    to: target,
                });
            }
        } else if relationship >= settings.alliance_threshold
            && !diplomacy.are_allied(actor.id, target)
        {
            debug!(actor = actor.id, target, "AIが同盟を選択しました");
            diplomacy.form_alliance(actor.id, target);
        }
    }
}

/// Traders with spare abundance may send the player an offer. Returns the new offer ids.
pub(crate) fn trader_offers<R: Rng + ?Sized>(
    diplomacy: &Diplomacy,
    countries: &[Country],
    book: &mut OfferBook,
    now_millis: u64,
    rng: &mut R,
) -> Vec<u64> {
    let settings = diplomacy.settings();
    let lifetime_millis = (settings.offer_lifetime_seconds * 1000.0).round().max(1.0) as u64;
    let mut created = Vec::new();
    for country in countries {
        if book.len() >= settings.max_pending_offers {
            break;
        }
        if country.is_player || !country.traits.trader || book.has_offer_from(country.id) {
            continue;
        }
        if diplomacy.are_at_war(country.id, PLAYER_ID)
            || diplomacy.stance(country.id, PLAYER_ID) == Stance::Hostile
        {
            continue;
        }
        if !chance(rng, settings.trade_offer_chance) {
            continue;
        }
        let Some((offered, requested)) = draft_offer(country, rng) else {
            continue;
        };
        let id = book.push(country.id, offered, requested, now_millis, lifetime_millis);
        debug!(country = country.id, offer = id, "交易提案を作成しました");
        created.push(id);
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RealmConfig;
    use crate::game::country::CountrySeed;
    use crate::game::world::Point;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn countries(count: usize, rng: &mut StdRng) -> Vec<Country> {
        let config = RealmConfig::from_embedded().expect("config");
        (0..count)
            .map(|id| {
                Country::generate(
                    CountrySeed {
                        id,
                        name: format!("Land{id}"),
                        color: "#222222".into(),
                        position: Point::new(id as f64 * 200.0, 0.0),
                        size: 7,
                        continent: 0,
                        is_player: id == PLAYER_ID,
                    },
                    &config.traits,
                    &config.abundance,
                    rng,
                )
            })
            .collect()
    }

    fn eager_diplomacy(count: usize) -> Diplomacy {
        let mut config = RealmConfig::from_embedded().expect("config");
        config.diplomacy.ai_action_chance = 1.0;
        config.diplomacy.trade_offer_chance = 1.0;
        config.diplomacy.gesture_notice_chance = 1.0;
        let mut diplomacy = Diplomacy::new(config.diplomacy);
        for a in 0..count {
            for b in 0..count {
                diplomacy.set_relationship(a, b, 50);
            }
        }
        diplomacy
    }

    #[test]
    fn friendly_pulse_raises_relationships_both_ways() {
        let mut rng = StdRng::seed_from_u64(3);
        let countries = countries(2, &mut rng);
        let mut diplomacy = eager_diplomacy(2);
        diplomatic_pulse(&mut diplomacy, &countries, &mut rng);

        let forward = diplomacy.relationship(1, 0);
        let backward = diplomacy.relationship(0, 1);
        assert!((51..=53).contains(&forward));
        assert_eq!(forward, backward);
        assert_eq!(
            diplomacy.drain_events(),
            vec![DiplomaticEvent::Gesture { from: 1, to: 0 }]
        );
    }

    #[test]
    fn warlike_countries_attack_hated_neighbours() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut countries = countries(2, &mut rng);
        countries[1].traits.warlike = true;
        let mut diplomacy = eager_diplomacy(2);
        diplomacy.set_relationship(1, 0, -80);
        diplomatic_pulse(&mut diplomacy, &countries, &mut rng);
        assert!(diplomacy.are_at_war(1, 0));
        assert_eq!(diplomacy.wars()[0].aggressor, 1);
    }

    #[test]
    fn trader_offers_respect_limits_and_hostility() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut countries = countries(6, &mut rng);
        for country in countries.iter_mut().skip(1) {
            country.traits.trader = true;
            let kind = crate::game::economy::ResourceKind::Gems;
            if let Some(resource) = country.resources.get_mut(&kind) {
                resource.abundant = true;
                resource.amount = 100.0;
            }
        }
        let mut diplomacy = eager_diplomacy(6);
        diplomacy.set_relationship(1, PLAYER_ID, -90);

        let mut book = OfferBook::new();
        let created = trader_offers(&diplomacy, &countries, &mut book, 0, &mut rng);
        assert_eq!(created.len(), 3);
        assert!(!book.has_offer_from(1));
        assert!(book.offers().iter().all(|offer| offer.expires_at_millis == 60_000));

        assert!(trader_offers(&diplomacy, &countries, &mut book, 0, &mut rng).is_empty());
    }
}
