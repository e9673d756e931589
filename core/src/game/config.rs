use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use super::economy::ResourceBundle;

const EMBEDDED_REALM: &str = include_str!("../../../config/realm.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    pub game_name: String,
    pub player_name: String,
    pub player_color: String,
    pub tick_seconds: f64,
    pub map: MapConfig,
    pub traits: TraitConfig,
    pub abundance: AbundanceConfig,
    pub diplomacy: DiplomacyConfig,
    pub calendar: CalendarConfig,
    pub economy: EconomyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
    pub continent_min: u32,
    pub continent_max: u32,
    pub territory_resolution: f64,
    pub min_country_distance: f64,
    pub adjacency_distance: f64,
    pub placement_attempts: u32,
    pub player_on_largest_chance: f64,
    pub area_per_country: f64,
    pub min_countries_per_continent: usize,
    pub max_countries_per_continent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConfig {
    pub warlike: f64,
    pub trader: f64,
    pub diplomatic: f64,
    pub isolationist: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbundanceConfig {
    pub chance: f64,
    pub multiplier: f64,
    pub player_bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiplomacyConfig {
    pub alliance_threshold: i32,
    pub war_threshold: i32,
    pub initial_friendship_min: i32,
    pub initial_friendship_max: i32,
    pub ai_pulse_chance: f64,
    pub ai_action_chance: f64,
    pub gesture_notice_chance: f64,
    pub trade_offer_chance: f64,
    pub max_pending_offers: usize,
    pub offer_lifetime_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub seconds_per_day: u64,
    pub days_per_season: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub starting_resources: ResourceBundle,
    pub food_per_worker_daily: f64,
    pub gold_discovery_chance: f64,
    pub gold_discovery_min: u32,
    pub gold_discovery_max: u32,
    pub food_surplus_chance: f64,
    pub food_surplus_min: u32,
    pub food_surplus_max: u32,
    pub wood_bonus_chance: f64,
    pub wood_bonus_min: u32,
    pub wood_bonus_max: u32,
    pub food_emergency_chance: f64,
    pub farmer_recovery_seconds: f64,
}

impl RealmConfig {
    pub fn from_embedded() -> Result<Self> {
        let config: RealmConfig = serde_yaml::from_str(EMBEDDED_REALM)
            .context("組み込み設定ファイルの解析に失敗しました")?;
        config.validate()?;
        Ok(config)
    }

    /// `.json` files go through serde_json, everything else through serde_yaml.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("設定ファイルの読み込みに失敗しました: {}", path.display()))?;
        let is_json = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("json")
        );
        let config: RealmConfig = if is_json {
            serde_json::from_str(&content).with_context(|| {
                format!("設定 JSON の解析に失敗しました: {}", path.display())
            })?
        } else {
            serde_yaml::from_str(&content).with_context(|| {
                format!("設定 YAML の解析に失敗しました: {}", path.display())
            })?
        };
        config
            .validate()
            .with_context(|| format!("設定値が不正です: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.player_name.trim().is_empty(),
            "プレイヤー国名が空です"
        );
        ensure!(
            self.tick_seconds.is_finite() && self.tick_seconds > 0.0,
            "tick_seconds は正の値で指定してください"
        );
        self.map.validate()?;
        self.traits.validate()?;
        self.abundance.validate()?;
        self.diplomacy.validate()?;
        ensure!(
            self.calendar.seconds_per_day > 0,
            "seconds_per_day は1以上で指定してください"
        );
        ensure!(
            self.calendar.days_per_season > 0,
            "days_per_season は1以上で指定してください"
        );
        self.economy.validate()
    }

    pub fn day_millis(&self) -> u64 {
        self.calendar.seconds_per_day * 1000
    }
}

impl MapConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0.0 && self.height > 0.0,
            "マップサイズは正の値で指定してください"
        );
        ensure!(self.continent_min > 0, "大陸数は1以上で指定してください");
        ensure!(
            self.continent_min <= self.continent_max,
            "continent_min は continent_max 以下で指定してください"
        );
        ensure!(
            self.territory_resolution > 0.0,
            "territory_resolution は正の値で指定してください"
        );
        ensure!(
            self.area_per_country > 0.0,
            "area_per_country は正の値で指定してください"
        );
        ensure!(
            self.min_countries_per_continent <= self.max_countries_per_continent,
            "大陸あたりの国数の範囲が不正です"
        );
        ensure_probability("player_on_largest_chance", self.player_on_largest_chance)
    }
}

impl TraitConfig {
    fn validate(&self) -> Result<()> {
        ensure_probability("traits.warlike", self.warlike)?;
        ensure_probability("traits.trader", self.trader)?;
        ensure_probability("traits.diplomatic", self.diplomatic)?;
        ensure_probability("traits.isolationist", self.isolationist)
    }
}

impl AbundanceConfig {
    fn validate(&self) -> Result<()> {
        ensure_probability("abundance.chance", self.chance)?;
        ensure!(
            self.multiplier > 0.0 && self.player_bonus > 0.0,
            "豊富資源の倍率は正の値で指定してください"
        );
        Ok(())
    }
}

impl DiplomacyConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.alliance_threshold > self.war_threshold,
            "同盟閾値は戦争閾値より大きくしてください"
        );
        ensure!(
            self.initial_friendship_min <= self.initial_friendship_max,
            "初期友好度の範囲が不正です"
        );
        ensure_probability("diplomacy.ai_pulse_chance", self.ai_pulse_chance)?;
        ensure_probability("diplomacy.ai_action_chance", self.ai_action_chance)?;
        ensure_probability("diplomacy.gesture_notice_chance", self.gesture_notice_chance)?;
        ensure_probability("diplomacy.trade_offer_chance", self.trade_offer_chance)?;
        ensure!(
            self.offer_lifetime_seconds > 0.0,
            "offer_lifetime_seconds は正の値で指定してください"
        );
        Ok(())
    }
}

impl EconomyConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.food_per_worker_daily >= 0.0,
            "food_per_worker_daily は0以上で指定してください"
        );
        ensure_probability("economy.gold_discovery_chance", self.gold_discovery_chance)?;
        ensure_probability("economy.food_surplus_chance", self.food_surplus_chance)?;
        ensure_probability("economy.wood_bonus_chance", self.wood_bonus_chance)?;
        ensure_probability("economy.food_emergency_chance", self.food_emergency_chance)?;
        ensure!(
            self.gold_discovery_min <= self.gold_discovery_max
                && self.food_surplus_min <= self.food_surplus_max
                && self.wood_bonus_min <= self.wood_bonus_max,
            "特殊イベントの量の範囲が不正です"
        );
        ensure!(
            self.starting_resources
                .values()
                .all(|amount| amount.is_finite() && *amount >= 0.0),
            "初期資源は0以上で指定してください"
        );
        Ok(())
    }
}

fn ensure_probability(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{} は 0 から 1 の範囲で指定してください: {}",
        name,
        value
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::economy::ResourceKind;

    #[test]
    fn embedded_config_is_valid() {
        let config = RealmConfig::from_embedded().expect("config");
        assert_eq!(config.player_name, "Eldoria");
        assert_eq!(config.map.continent_min, 4);
        assert_eq!(config.diplomacy.alliance_threshold, 75);
        assert_eq!(config.day_millis(), 10_000);
        assert_eq!(
            config.economy.starting_resources.get(&ResourceKind::Food),
            Some(&100.0)
        );
    }

    #[test]
    fn validation_rejects_inverted_thresholds() {
        let mut config = RealmConfig::from_embedded().expect("config");
        config.diplomacy.war_threshold = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_probabilities_and_continents() {
        let mut config = RealmConfig::from_embedded().expect("config");
        config.traits.trader = 1.5;
        assert!(config.validate().is_err());

        let mut config = RealmConfig::from_embedded().expect("config");
        config.map.continent_min = 7;
        assert!(config.validate().is_err());

        let mut config = RealmConfig::from_embedded().expect("config");
        config.map.continent_min = 0;
        config.map.continent_max = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_json_override() {
        let config = RealmConfig::from_embedded().expect("config");
        let mut path = std::env::temp_dir();
        path.push(format!("fantasy-realm-config-{}.json", std::process::id()));
        let mut json = serde_json::to_value(&config).expect("serialise");
        json["player_name"] = serde_json::Value::String("Valoria".into());
        fs::write(&path, json.to_string()).expect("write");

        let loaded = RealmConfig::load_from_path(&path).expect("load");
        assert_eq!(loaded.player_name, "Valoria");
        let _ = fs::remove_file(&path);
    }
}
