use rand::Rng;
use tracing::debug;

use super::ai;
use crate::game::country::Country;
use crate::game::diplomacy::{Diplomacy, OfferBook};
use crate::game::names::chance;

/// Drives the non-player side of the world once per tick.
pub(crate) struct SystemsFacade {
    pulses: u64,
}

pub(crate) struct AiReport {
    pub pulsed: bool,
    pub new_offers: Vec<u64>,
}

impl SystemsFacade {
    pub fn new() -> Self {
        Self { pulses: 0 }
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    pub fn run_ai<R: Rng + ?Sized>(
        &mut self,
        diplomacy: &mut Diplomacy,
        countries: &[Country],
        offers: &mut OfferBook,
        now_millis: u64,
        rng: &mut R,
    ) -> AiReport {
        if !chance(rng, diplomacy.settings().ai_pulse_chance) {
            return AiReport {
                pulsed: false,
                new_offers: Vec::new(),
            };
        }
        self.pulses += 1;
        debug!(pulse = self.pulses, "AI外交パルスを実行します");
        ai::diplomatic_pulse(diplomacy, countries, rng);
        let new_offers = ai::trader_offers(diplomacy, countries, offers, now_millis, rng);
        AiReport {
            pulsed: true,
            new_offers,
        }
    }
}
