use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::resources::{ResourceBundle, describe_bundle};

const EMBEDDED_BUILDINGS: &str = include_str!("../../../../config/buildings.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Farms,
    Granaries,
    Mills,
    MiningCamps,
    GoldRefineries,
    Sawmills,
    LumberjackLodges,
    Marketplaces,
    TradingPosts,
    Embassies,
    Palaces,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 11] = [
        BuildingKind::Farms,
        BuildingKind::Granaries,
        BuildingKind::Mills,
        BuildingKind::MiningCamps,
        BuildingKind::GoldRefineries,
        BuildingKind::Sawmills,
        BuildingKind::LumberjackLodges,
        BuildingKind::Marketplaces,
        BuildingKind::TradingPosts,
        BuildingKind::Embassies,
        BuildingKind::Palaces,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BuildingKind::Farms => "農場",
            BuildingKind::Granaries => "穀物庫",
            BuildingKind::Mills => "製粉所",
            BuildingKind::MiningCamps => "採掘場",
            BuildingKind::GoldRefineries => "金精錬所",
            BuildingKind::Sawmills => "製材所",
            BuildingKind::LumberjackLodges => "木こり小屋",
            BuildingKind::Marketplaces => "市場",
            BuildingKind::TradingPosts => "交易所",
            BuildingKind::Embassies => "大使館",
            BuildingKind::Palaces => "宮殿",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDefinition {
    pub key: String,
    pub name: String,
    pub kind: BuildingKind,
    pub build_seconds: f64,
    #[serde(default)]
    pub cost: ResourceBundle,
}

impl BuildingDefinition {
    pub fn cost_summary(&self) -> String {
        describe_bundle(&self.cost)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingCatalog {
    buildings: Vec<BuildingDefinition>,
}

impl BuildingCatalog {
    pub fn from_embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_BUILDINGS).context("組み込み建築定義の解析に失敗しました")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("ファイルの読み込みに失敗しました: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("建築定義 YAML の解析に失敗しました: {}", path.display()))
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let catalog: BuildingCatalog = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for (idx, building) in self.buildings.iter().enumerate() {
            ensure!(
                !self.buildings[..idx]
                    .iter()
                    .any(|other| other.key == building.key),
                "建築キーが重複しています: {}",
                building.key
            );
            ensure!(
                building.build_seconds.is_finite() && building.build_seconds > 0.0,
                "建築時間は正の値で指定してください: {}",
                building.key
            );
            ensure!(
                building
                    .cost
                    .values()
                    .all(|amount| amount.is_finite() && *amount >= 0.0),
                "建築コストが不正です: {}",
                building.key
            );
        }
        Ok(())
    }

    pub fn buildings(&self) -> &[BuildingDefinition] {
        &self.buildings
    }

    pub fn get(&self, key: &str) -> Option<&BuildingDefinition> {
        self.buildings.iter().find(|building| building.key == key)
    }

    /// Resolves a key, a display name or a 1-based catalog index.
    pub fn resolve(&self, token: &str) -> Result<&BuildingDefinition> {
        let token = token.trim();
        if let Ok(index) = token.parse::<usize>() {
            if index > 0 && index <= self.buildings.len() {
                return Ok(&self.buildings[index - 1]);
            }
        }
        let needle = token.to_ascii_lowercase();
        self.buildings
            .iter()
            .find(|building| building.key == needle || building.name == token)
            .ok_or_else(|| anyhow!("不明な建物です: {}", token))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionProject {
    pub id: u64,
    pub key: String,
    pub name: String,
    pub kind: BuildingKind,
    pub started_at_millis: u64,
    pub completes_at_millis: u64,
}

impl ConstructionProject {
    pub fn progress(&self, now_millis: u64) -> f64 {
        let total = self.completes_at_millis.saturating_sub(self.started_at_millis);
        if total == 0 {
            return 1.0;
        }
        let elapsed = now_millis.saturating_sub(self.started_at_millis);
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn remaining_seconds(&self, now_millis: u64) -> f64 {
        self.completes_at_millis.saturating_sub(now_millis) as f64 / 1000.0
    }
}
