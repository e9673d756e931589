use anyhow::{Result, anyhow};
use rand::Rng;

use crate::game::country::{Country, CountryId};
use crate::game::economy::{ResourceBundle, ResourceKind};
use crate::game::names::{random_choice, random_float};

const MIN_OFFER_AMOUNT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOffer {
    pub id: u64,
    pub from: CountryId,
    /// Goods the sending country hands over.
    pub offered: ResourceBundle,
    /// Goods it expects from the player.
    pub requested: ResourceBundle,
    pub created_at_millis: u64,
    pub expires_at_millis: u64,
}

impl TradeOffer {
    pub fn remaining_seconds(&self, now_millis: u64) -> f64 {
        self.expires_at_millis.saturating_sub(now_millis) as f64 / 1000.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferBook {
    offers: Vec<TradeOffer>,
    next_id: u64,
}

impl OfferBook {
    pub fn new() -> Self {
        Self {
            offers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn offers(&self) -> &[TradeOffer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn has_offer_from(&self, country: CountryId) -> bool {
        self.offers.iter().any(|offer| offer.from == country)
    }

    pub(crate) fn push(
        &mut self,
        from: CountryId,
        offered: ResourceBundle,
        requested: ResourceBundle,
        now_millis: u64,
        lifetime_millis: u64,
    ) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.offers.push(TradeOffer {
            id,
            from,
            offered,
            requested,
            created_at_millis: now_millis,
            expires_at_millis: now_millis + lifetime_millis,
        });
        id
    }

    pub fn get(&self, id: u64) -> Result<&TradeOffer> {
        self.offers
            .iter()
            .find(|offer| offer.id == id)
            .ok_or_else(|| anyhow!("交易提案 #{} は存在しません", id))
    }

    pub(crate) fn take(&mut self, id: u64) -> Result<TradeOffer> {
        let idx = self
            .offers
            .iter()
            .position(|offer| offer.id == id)
            .ok_or_else(|| anyhow!("交易提案 #{} は存在しません", id))?;
        Ok(self.offers.remove(idx))
    }

    pub(crate) fn withdraw_from(&mut self, country: CountryId) -> Vec<TradeOffer> {
        let (withdrawn, open): (Vec<_>, Vec<_>) = self
            .offers
            .drain(..)
            .partition(|offer| offer.from == country);
        self.offers = open;
        withdrawn
    }

    /// Removes and returns offers whose deadline has passed.
    pub(crate) fn expire(&mut self, now_millis: u64) -> Vec<TradeOffer> {
        let (expired, open): (Vec<_>, Vec<_>) = self
            .offers
            .drain(..)
            .partition(|offer| offer.expires_at_millis <= now_millis);
        self.offers = open;
        expired
    }
}

/// Terms a trader would propose: a slice of one abundant stock for one player resource.
pub fn draft_offer<R: Rng + ?Sized>(
    country: &Country,
    rng: &mut R,
) -> Option<(ResourceBundle, ResourceBundle)> {
    let abundant = country.abundant_resources();
    let &offered_kind = random_choice(rng, &abundant)?;
    let stock = country.stock(offered_kind);
    if stock < MIN_OFFER_AMOUNT {
        return None;
    }
    let offered_amount = (stock * random_float(rng, 0.1, 0.3))
        .floor()
        .max(MIN_OFFER_AMOUNT);

    let wanted: Vec<ResourceKind> = ResourceKind::PRODUCED
        .iter()
        .copied()
        .filter(|kind| *kind != offered_kind && *kind != ResourceKind::Influence)
        .collect();
    let &requested_kind = random_choice(rng, &wanted)?;
    let offer_value = offered_amount * offered_kind.trade_value();
    let requested_amount = (offer_value / requested_kind.trade_value()
        * random_float(rng, 0.8, 1.1))
    .round()
    .max(1.0);

    Some((
        ResourceBundle::from([(offered_kind, offered_amount)]),
        ResourceBundle::from([(requested_kind, requested_amount)]),
    ))
}
