use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::resources::ResourceBundle;

const EMBEDDED_RESEARCH: &str = include_str!("../../../../config/research.yaml");

pub const AGRICULTURE_EFFICIENCY: &str = "agriculture_efficiency";
pub const EFFICIENT_LOGGING: &str = "efficient_logging";
pub const EFFICIENT_FOOD_DISTRIBUTION: &str = "efficient_food_distribution";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchTopic {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub research_seconds: f64,
    #[serde(default)]
    pub cost: ResourceBundle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchCatalog {
    topics: Vec<ResearchTopic>,
}

impl ResearchCatalog {
    pub fn from_embedded() -> Result<Self> {
        let catalog: ResearchCatalog = serde_yaml::from_str(EMBEDDED_RESEARCH)
            .context("組み込み研究定義の解析に失敗しました")?;
        for topic in &catalog.topics {
            ensure!(
                topic.research_seconds.is_finite() && topic.research_seconds > 0.0,
                "研究時間は正の値で指定してください: {}",
                topic.key
            );
        }
        Ok(catalog)
    }

    pub fn topics(&self) -> &[ResearchTopic] {
        &self.topics
    }

    pub fn resolve(&self, token: &str) -> Result<&ResearchTopic> {
        let token = token.trim();
        if let Ok(index) = token.parse::<usize>() {
            if index > 0 && index <= self.topics.len() {
                return Ok(&self.topics[index - 1]);
            }
        }
        let needle = token.to_ascii_lowercase();
        self.topics
            .iter()
            .find(|topic| topic.key == needle || topic.name == token)
            .ok_or_else(|| anyhow!("不明な研究です: {}", token))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchProject {
    pub id: u64,
    pub key: String,
    pub name: String,
    pub started_at_millis: u64,
    pub completes_at_millis: u64,
}
