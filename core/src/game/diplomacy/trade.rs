use anyhow::{Result, ensure};
use tracing::debug;

use super::offers::{OfferBook, TradeOffer};
use super::Diplomacy;
use crate::game::country::{Country, CountryId, PLAYER_ID};
use crate::game::economy::{
    ResourceBundle, ResourceManager, bundle_value, describe_bundle, validate_bundle,
};

/// Fairness check for a proposal, seen from the receiving country.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeAssessment {
    pub fairness: f64,
    pub threshold: f64,
    pub accepted: bool,
    pub relationship_gain: i32,
}

pub fn evaluate_trade(
    offered: &ResourceBundle,
    requested: &ResourceBundle,
    relationship: i32,
) -> TradeAssessment {
    let fairness = bundle_value(offered) / bundle_value(requested).max(1.0) * 100.0;
    let threshold = 90.0 - relationship as f64 * 0.5;
    let accepted = fairness >= threshold;
    let relationship_gain = if accepted {
        ((fairness / 20.0).floor() as i32).min(5)
    } else {
        0
    };
    TradeAssessment {
        fairness,
        threshold,
        accepted,
        relationship_gain,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub partner: CountryId,
    pub assessment: TradeAssessment,
    /// What actually entered the player's stores after storage limits.
    pub received: ResourceBundle,
}

impl TradeOutcome {
    pub fn accepted(&self) -> bool {
        self.assessment.accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeaceOutcome {
    Accepted,
    Rejected,
}

fn ensure_partner(countries: &[Country], partner: CountryId) -> Result<()> {
    ensure!(partner < countries.len(), "国ID {} は存在しません", partner);
    ensure!(partner != PLAYER_ID, "自国を相手に外交はできません");
    Ok(())
}

fn ensure_partner_holds(partner: &Country, bundle: &ResourceBundle) -> Result<()> {
    for (kind, amount) in bundle {
        ensure!(
            partner.stock(*kind) + 1e-9 >= *amount,
            "{}は{}を {:.0} しか持っていません",
            partner.name,
            kind.label(),
            partner.stock(*kind)
        );
    }
    Ok(())
}

/// Player gives `given`, partner gives `taken`. Both sides are checked beforehand.
fn exchange(
    economy: &mut ResourceManager,
    partner: &mut Country,
    given: &ResourceBundle,
    taken: &ResourceBundle,
) -> Result<ResourceBundle> {
    economy.deduct_resources(given)?;
    for (kind, amount) in given {
        partner.adjust_stock(*kind, *amount);
    }
    let mut received = ResourceBundle::new();
    for (kind, amount) in taken {
        partner.adjust_stock(*kind, -*amount);
        received.insert(*kind, economy.add_resource(*kind, *amount));
    }
    Ok(received)
}

pub(crate) fn propose_trade(
    diplomacy: &mut Diplomacy,
    economy: &mut ResourceManager,
    countries: &mut [Country],
    partner: CountryId,
    offered: &ResourceBundle,
    requested: &ResourceBundle,
) -> Result<TradeOutcome> {
    ensure_partner(countries, partner)?;
    ensure!(!offered.is_empty(), "提供する資源を指定してください");
    ensure!(!requested.is_empty(), "要求する資源を指定してください");
    validate_bundle(offered)?;
    validate_bundle(requested)?;
    ensure!(
        !diplomacy.are_at_war(PLAYER_ID, partner),
        "{}とは交戦中のため交易できません",
        countries[partner].name
    );
    ensure!(
        economy.has_enough_resources(offered),
        "提供する資源が足りません ({})",
        describe_bundle(offered)
    );
    ensure_partner_holds(&countries[partner], requested)?;

    let assessment = evaluate_trade(
        offered,
        requested,
        diplomacy.relationship(PLAYER_ID, partner),
    );
    debug!(
        partner,
        fairness = assessment.fairness,
        threshold = assessment.threshold,
        accepted = assessment.accepted,
        "交易提案を評価しました"
    );
    if !assessment.accepted {
        return Ok(TradeOutcome {
            partner,
            assessment,
            received: ResourceBundle::new(),
        });
    }

    let received = exchange(economy, &mut countries[partner], offered, requested)?;
    diplomacy.modify_relationship(PLAYER_ID, partner, assessment.relationship_gain);
    Ok(TradeOutcome {
        partner,
        assessment,
        received,
    })
}

pub(crate) fn propose_alliance(
    diplomacy: &mut Diplomacy,
    countries: &[Country],
    partner: CountryId,
) -> Result<bool> {
    ensure_partner(countries, partner)?;
    ensure!(
        !diplomacy.are_allied(PLAYER_ID, partner),
        "{}とは既に同盟を結んでいます",
        countries[partner].name
    );
    if diplomacy.relationship(PLAYER_ID, partner) >= diplomacy.settings().alliance_threshold {
        diplomacy.form_alliance(PLAYER_ID, partner);
        Ok(true)
    } else {
        Ok(false)
    }
}

pub(crate) fn declare_war(
    diplomacy: &mut Diplomacy,
    countries: &[Country],
    partner: CountryId,
) -> Result<()> {
    ensure_partner(countries, partner)?;
    ensure!(
        !diplomacy.are_at_war(PLAYER_ID, partner),
        "{}とは既に交戦中です",
        countries[partner].name
    );
    ensure!(
        !diplomacy.are_allied(PLAYER_ID, partner),
        "同盟国の{}には宣戦布告できません",
        countries[partner].name
    );
    diplomacy.modify_relationship(PLAYER_ID, partner, -100);
    diplomacy.start_war(PLAYER_ID, partner);
    Ok(())
}

pub(crate) fn propose_peace(
    diplomacy: &mut Diplomacy,
    countries: &[Country],
    partner: CountryId,
) -> Result<PeaceOutcome> {
    ensure_partner(countries, partner)?;
    ensure!(
        diplomacy.are_at_war(PLAYER_ID, partner),
        "{}とは交戦していません",
        countries[partner].name
    );
    let war_threshold = diplomacy.settings().war_threshold;
    let willing = diplomacy.relationship(partner, PLAYER_ID) > war_threshold;
    let outmatched =
        countries[partner].military_power() < countries[PLAYER_ID].military_power() * 0.8;
    if !(willing || outmatched) {
        return Ok(PeaceOutcome::Rejected);
    }

    diplomacy.end_war(PLAYER_ID, partner);
    let floor = war_threshold + 1;
    for (from, to) in [(PLAYER_ID, partner), (partner, PLAYER_ID)] {
        if diplomacy.relationship(from, to) < floor {
            diplomacy.set_relationship(from, to, floor);
        }
    }
    Ok(PeaceOutcome::Accepted)
}

pub(crate) fn accept_offer(
    diplomacy: &mut Diplomacy,
    economy: &mut ResourceManager,
    countries: &mut [Country],
    book: &mut OfferBook,
    offer_id: u64,
) -> Result<(TradeOffer, ResourceBundle)> {
    let offer = book.get(offer_id)?.clone();
    ensure!(
        !diplomacy.are_at_war(PLAYER_ID, offer.from),
        "{}とは交戦中のため交易できません",
        countries[offer.from].name
    );
    ensure!(
        economy.has_enough_resources(&offer.requested),
        "要求された資源が足りません ({})",
        describe_bundle(&offer.requested)
    );
    ensure_partner_holds(&countries[offer.from], &offer.offered)?;
    book.take(offer_id)?;

    let received = exchange(
        economy,
        &mut countries[offer.from],
        &offer.requested,
        &offer.offered,
    )?;
    diplomacy.modify_relationship(PLAYER_ID, offer.from, 2);
    diplomacy.modify_relationship(offer.from, PLAYER_ID, 2);
    Ok((offer, received))
}

pub(crate) fn reject_offer(
    diplomacy: &mut Diplomacy,
    book: &mut OfferBook,
    offer_id: u64,
) -> Result<TradeOffer> {
    let offer = book.take(offer_id)?;
    diplomacy.modify_relationship(offer.from, PLAYER_ID, -1);
    Ok(offer)
}

/// Puts the player's own terms to the offering country. The offer closes once
/// the counter is judged, whether or not it is accepted.
pub(crate) fn counter_offer(
    diplomacy: &mut Diplomacy,
    economy: &mut ResourceManager,
    countries: &mut [Country],
    book: &mut OfferBook,
    offer_id: u64,
    offered: &ResourceBundle,
    requested: &ResourceBundle,
) -> Result<(TradeOffer, TradeOutcome)> {
    let partner = book.get(offer_id)?.from;
    let outcome = propose_trade(diplomacy, economy, countries, partner, offered, requested)?;
    let offer = book.take(offer_id)?;
    Ok((offer, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RealmConfig;
    use crate::game::country::CountrySeed;
    use crate::game::economy::ResourceKind;
    use crate::game::world::Point;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        diplomacy: Diplomacy,
        economy: ResourceManager,
        countries: Vec<Country>,
    }

    fn fixture() -> Fixture {
        let config = RealmConfig::from_embedded().expect("config");
        let mut rng = StdRng::seed_from_u64(12);
        let countries = (0..2)
            .map(|id| {
                Country::generate(
                    CountrySeed {
                        id,
                        name: format!("Realm{id}"),
                        color: "#123456".into(),
                        position: Point::new(id as f64 * 300.0, 0.0),
                        size: 7,
                        continent: 0,
                        is_player: id == PLAYER_ID,
                    },
                    &config.traits,
                    &config.abundance,
                    &mut rng,
                )
            })
            .collect();
        let mut diplomacy = Diplomacy::new(config.diplomacy.clone());
        diplomacy.set_relationship(0, 1, 0);
        diplomacy.set_relationship(1, 0, 0);
        Fixture {
            diplomacy,
            economy: ResourceManager::new(config.economy.clone()),
            countries,
        }
    }

    fn bundle(kind: ResourceKind, amount: f64) -> ResourceBundle {
        ResourceBundle::from([(kind, amount)])
    }

    #[test]
    fn fairness_threshold_moves_with_relationship() {
        let offered = bundle(ResourceKind::Gold, 80.0);
        let requested = bundle(ResourceKind::Gold, 100.0);
        assert!(!evaluate_trade(&offered, &requested, 0).accepted);
        let friendly = evaluate_trade(&offered, &requested, 40);
        assert!(friendly.accepted);
        assert_eq!(friendly.relationship_gain, 4);

        let generous = evaluate_trade(&bundle(ResourceKind::Wood, 100.0), &requested, 0);
        assert!((generous.fairness - 200.0).abs() < 1e-9);
        assert_eq!(generous.relationship_gain, 5);
    }

    #[test]
    fn accepted_trade_moves_goods_and_improves_relations() {
        let mut f = fixture();
        f.countries[1].adjust_stock(ResourceKind::Iron, 100.0);
        let stone_before = f.countries[1].stock(ResourceKind::Stone);
        let outcome = propose_trade(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            1,
            &bundle(ResourceKind::Stone, 20.0),
            &bundle(ResourceKind::Iron, 10.0),
        )
        .expect("trade");
        assert!(outcome.accepted());
        assert_eq!(f.economy.amount(ResourceKind::Stone), 30.0);
        assert_eq!(f.economy.amount(ResourceKind::Iron), 10.0);
        assert_eq!(f.countries[1].stock(ResourceKind::Stone), stone_before + 20.0);
        assert_eq!(f.diplomacy.relationship(0, 1), 5);
    }

    #[test]
    fn trade_is_refused_during_war_or_without_goods() {
        let mut f = fixture();
        let huge = bundle(ResourceKind::Gold, 10_000.0);
        assert!(
            propose_trade(
                &mut f.diplomacy,
                &mut f.economy,
                &mut f.countries,
                1,
                &huge,
                &bundle(ResourceKind::Gold, 1.0),
            )
            .is_err()
        );
        f.diplomacy.start_war(0, 1);
        assert!(
            propose_trade(
                &mut f.diplomacy,
                &mut f.economy,
                &mut f.countries,
                1,
                &bundle(ResourceKind::Gold, 1.0),
                &bundle(ResourceKind::Gold, 1.0),
            )
            .is_err()
        );
    }

    #[test]
    fn war_and_peace_cycle() {
        let mut f = fixture();
        declare_war(&mut f.diplomacy, &f.countries, 1).expect("war");
        assert!(f.diplomacy.are_at_war(0, 1));
        assert_eq!(f.diplomacy.relationship(0, 1), -100);
        assert!(declare_war(&mut f.diplomacy, &f.countries, 1).is_err());

        // The partner still tolerates the player, so peace is accepted.
        let outcome = propose_peace(&mut f.diplomacy, &f.countries, 1).expect("peace");
        assert_eq!(outcome, PeaceOutcome::Accepted);
        assert!(!f.diplomacy.are_at_war(0, 1));
        assert_eq!(f.diplomacy.relationship(0, 1), -49);
        assert!(propose_peace(&mut f.diplomacy, &f.countries, 1).is_err());
    }

    #[test]
    fn alliance_requires_high_friendship() {
        let mut f = fixture();
        assert!(!propose_alliance(&mut f.diplomacy, &f.countries, 1).expect("proposal"));
        f.diplomacy.set_relationship(0, 1, 80);
        assert!(propose_alliance(&mut f.diplomacy, &f.countries, 1).expect("proposal"));
        assert!(f.diplomacy.are_allied(0, 1));
        assert!(propose_alliance(&mut f.diplomacy, &f.countries, 1).is_err());
        assert!(declare_war(&mut f.diplomacy, &f.countries, 1).is_err());
        assert!(propose_alliance(&mut f.diplomacy, &f.countries, 0).is_err());
    }

    #[test]
    fn offers_can_be_accepted_or_rejected() {
        let mut f = fixture();
        f.countries[1].adjust_stock(ResourceKind::Gems, 50.0);
        let mut book = OfferBook::new();
        let first = book.push(
            1,
            bundle(ResourceKind::Gems, 10.0),
            bundle(ResourceKind::Wood, 15.0),
            0,
            60_000,
        );
        let second = book.push(
            1,
            bundle(ResourceKind::Gems, 5.0),
            bundle(ResourceKind::Wood, 5.0),
            0,
            60_000,
        );

        let (_, received) = accept_offer(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            &mut book,
            first,
        )
        .expect("accept");
        assert_eq!(received.get(&ResourceKind::Gems), Some(&10.0));
        assert_eq!(f.economy.amount(ResourceKind::Wood), 85.0);
        assert_eq!(f.diplomacy.relationship(0, 1), 2);
        assert_eq!(f.diplomacy.relationship(1, 0), 2);

        reject_offer(&mut f.diplomacy, &mut book, second).expect("reject");
        assert_eq!(f.diplomacy.relationship(1, 0), 1);
        assert!(book.is_empty());
        assert!(reject_offer(&mut f.diplomacy, &mut book, second).is_err());
    }

    #[test]
    fn offers_from_an_enemy_cannot_be_accepted() {
        let mut f = fixture();
        f.countries[1].adjust_stock(ResourceKind::Gems, 50.0);
        let mut book = OfferBook::new();
        let id = book.push(
            1,
            bundle(ResourceKind::Gems, 10.0),
            bundle(ResourceKind::Wood, 15.0),
            0,
            60_000,
        );
        declare_war(&mut f.diplomacy, &f.countries, 1).expect("war");

        let result = accept_offer(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            &mut book,
            id,
        );
        assert!(result.is_err());
        assert_eq!(f.economy.amount(ResourceKind::Wood), 100.0);
        assert_eq!(f.economy.amount(ResourceKind::Gems), 0.0);
    }

    #[test]
    fn failed_counter_keeps_the_offer_open() {
        let mut f = fixture();
        f.countries[1].adjust_stock(ResourceKind::Iron, 100.0);
        let mut book = OfferBook::new();
        let id = book.push(
            1,
            bundle(ResourceKind::Iron, 10.0),
            bundle(ResourceKind::Wood, 30.0),
            0,
            60_000,
        );

        let result = counter_offer(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            &mut book,
            id,
            &bundle(ResourceKind::Gold, 99_999.0),
            &bundle(ResourceKind::Iron, 10.0),
        );
        assert!(result.is_err());
        assert_eq!(book.len(), 1);

        let (closed, outcome) = counter_offer(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            &mut book,
            id,
            &bundle(ResourceKind::Gold, 1.0),
            &bundle(ResourceKind::Iron, 10.0),
        )
        .expect("counter");
        assert_eq!(closed.id, id);
        assert!(!outcome.accepted());
        assert!(book.is_empty());
    }

    #[test]
    fn negative_amounts_never_reach_the_stores() {
        let mut f = fixture();
        f.countries[1].adjust_stock(ResourceKind::Iron, 10.0);
        let gold_before = f.economy.amount(ResourceKind::Gold);
        let offered = ResourceBundle::from([
            (ResourceKind::Wood, 100.0),
            (ResourceKind::Gold, -100.0),
        ]);

        let result = propose_trade(
            &mut f.diplomacy,
            &mut f.economy,
            &mut f.countries,
            1,
            &offered,
            &bundle(ResourceKind::Iron, 1.0),
        );
        assert!(result.is_err());
        assert_eq!(f.economy.amount(ResourceKind::Gold), gold_before);
        assert_eq!(f.economy.amount(ResourceKind::Wood), 100.0);
        assert!(
            propose_trade(
                &mut f.diplomacy,
                &mut f.economy,
                &mut f.countries,
                1,
                &bundle(ResourceKind::Wood, 10.0),
                &bundle(ResourceKind::Iron, -1.0),
            )
            .is_err()
        );
    }
}
