use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Wood,
    Iron,
    Gems,
    Stone,
    Food,
    Magic,
    Influence,
}

pub type ResourceBundle = BTreeMap<ResourceKind, f64>;

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Gold,
        ResourceKind::Influence,
        ResourceKind::Iron,
        ResourceKind::Gems,
        ResourceKind::Magic,
    ];

    /// Resources tracked in every country's profile.
    pub const COUNTRY: [ResourceKind; 7] = [
        ResourceKind::Gold,
        ResourceKind::Wood,
        ResourceKind::Iron,
        ResourceKind::Gems,
        ResourceKind::Stone,
        ResourceKind::Food,
        ResourceKind::Magic,
    ];

    /// Resources the player's economy produces on its own.
    pub const PRODUCED: [ResourceKind; 5] = [
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Gold,
        ResourceKind::Influence,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::Gold => "gold",
            ResourceKind::Wood => "wood",
            ResourceKind::Iron => "iron",
            ResourceKind::Gems => "gems",
            ResourceKind::Stone => "stone",
            ResourceKind::Food => "food",
            ResourceKind::Magic => "magic",
            ResourceKind::Influence => "influence",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Gold => "金貨",
            ResourceKind::Wood => "木材",
            ResourceKind::Iron => "鉄",
            ResourceKind::Gems => "宝石",
            ResourceKind::Stone => "石材",
            ResourceKind::Food => "食料",
            ResourceKind::Magic => "魔力",
            ResourceKind::Influence => "影響力",
        }
    }

    /// Relative worth used when weighing trades.
    pub fn trade_value(self) -> f64 {
        match self {
            ResourceKind::Gold => 1.0,
            _ => 2.0,
        }
    }

    pub fn parse(token: &str) -> Result<Self> {
        let needle = token.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.key() == needle || kind.label() == token.trim())
            .ok_or_else(|| anyhow!("不明な資源です: {}", token.trim()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn bundle_value(bundle: &ResourceBundle) -> f64 {
    bundle
        .iter()
        .map(|(kind, amount)| kind.trade_value() * amount)
        .sum()
}

/// Every amount in a traded bundle must be a positive finite number.
pub fn validate_bundle(bundle: &ResourceBundle) -> Result<()> {
    for (kind, amount) in bundle {
        ensure!(
            amount.is_finite() && *amount > 0.0,
            "{}の数量は正の値で指定してください: {}",
            kind.label(),
            amount
        );
    }
    Ok(())
}

/// Parses `gold:50,wood:20` style text into a bundle.
pub fn parse_bundle(text: &str) -> Result<ResourceBundle> {
    let mut bundle = ResourceBundle::new();
    for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let (name, amount) = part
            .split_once(':')
            .or_else(|| part.split_once('='))
            .ok_or_else(|| anyhow!("資源は 名前:量 の形式で指定してください: {}", part))?;
        let kind = ResourceKind::parse(name)?;
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| anyhow!("数量が不正です: {}", amount.trim()))?;
        ensure!(
            amount.is_finite() && amount > 0.0,
            "数量は正の値で指定してください: {}",
            part
        );
        *bundle.entry(kind).or_insert(0.0) += amount;
    }
    Ok(bundle)
}

pub fn describe_bundle(bundle: &ResourceBundle) -> String {
    if bundle.is_empty() {
        return "なし".to_string();
    }
    bundle
        .iter()
        .map(|(kind, amount)| format!("{} {:.0}", kind.label(), amount))
        .collect::<Vec<_>>()
        .join(", ")
}
