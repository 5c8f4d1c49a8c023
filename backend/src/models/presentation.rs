use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::market_regime::RegimeLabel;

/// Currency amounts are shown in. Everything is stored in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Idr,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Idr => "Rp",
        }
    }

    /// `$12,345.68` or `Rp 200,000,000`.
    pub fn format(&self, amount: f64) -> String {
        let decimals = match self {
            Currency::Usd => 2,
            Currency::Idr => 0,
        };
        let digits = group_thousands(amount.abs(), decimals);
        let sign = if amount < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        match self {
            Currency::Usd => format!("{}${}", sign, digits),
            Currency::Idr => format!("{}Rp {}", sign, digits),
        }
    }
}

fn group_thousands(amount: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}

/// Which vocabulary the dashboard speaks. Only labels change; numbers never do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Terminology {
    #[default]
    Standard,
    WarRoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Title,
    MarketHealth,
    FearGreed,
    Dominance,
    Regime,
    PortfolioValue,
    Capital,
    ProfitLoss,
    AssetColumn,
    QuantityColumn,
    AllocationColumn,
    GrowthChart,
    AllocationModule,
    StrategyAutomatic,
    StrategyRiskBased,
    StrategyProportional,
    StrategyCustom,
    Recommendation,
    Research,
    Journal,
    WhaleWatcher,
}

impl Label {
    pub const ALL: [Label; 21] = [
        Label::Title,
        Label::MarketHealth,
        Label::FearGreed,
        Label::Dominance,
        Label::Regime,
        Label::PortfolioValue,
        Label::Capital,
        Label::ProfitLoss,
        Label::AssetColumn,
        Label::QuantityColumn,
        Label::AllocationColumn,
        Label::GrowthChart,
        Label::AllocationModule,
        Label::StrategyAutomatic,
        Label::StrategyRiskBased,
        Label::StrategyProportional,
        Label::StrategyCustom,
        Label::Recommendation,
        Label::Research,
        Label::Journal,
        Label::WhaleWatcher,
    ];
}

impl Terminology {
    pub fn text(&self, label: Label) -> &'static str {
        use Label::*;
        match (self, label) {
            (Terminology::Standard, Title) => "Pandu Terminal",
            (Terminology::Standard, MarketHealth) => "Market Health",
            (Terminology::Standard, FearGreed) => "Fear & Greed Index",
            (Terminology::Standard, Dominance) => "BTC Dominance",
            (Terminology::Standard, Regime) => "Market Regime",
            (Terminology::Standard, PortfolioValue) => "Portfolio Value",
            (Terminology::Standard, Capital) => "Invested Capital",
            (Terminology::Standard, ProfitLoss) => "Profit/Loss",
            (Terminology::Standard, AssetColumn) => "Asset",
            (Terminology::Standard, QuantityColumn) => "Quantity",
            (Terminology::Standard, AllocationColumn) => "Allocation",
            (Terminology::Standard, GrowthChart) => "Portfolio Growth",
            (Terminology::Standard, AllocationModule) => "Strategic Asset Allocation",
            (Terminology::Standard, StrategyAutomatic) => "Automatic Smart Allocation",
            (Terminology::Standard, StrategyRiskBased) => "Risk-Based",
            (Terminology::Standard, StrategyProportional) => "Proportional",
            (Terminology::Standard, StrategyCustom) => "Custom",
            (Terminology::Standard, Recommendation) => "Recommendation",
            (Terminology::Standard, Research) => "AI Research Assistant",
            (Terminology::Standard, Journal) => "Trading Journal",
            (Terminology::Standard, WhaleWatcher) => "Whale Watcher",

            (Terminology::WarRoom, Title) => "Digital Command Center",
            (Terminology::WarRoom, MarketHealth) => "Battlefield Intelligence Report",
            (Terminology::WarRoom, FearGreed) => "Enemy Morale",
            (Terminology::WarRoom, Dominance) => "Main Territory Control",
            (Terminology::WarRoom, Regime) => "War Weather",
            (Terminology::WarRoom, PortfolioValue) => "Total Combat Strength",
            (Terminology::WarRoom, Capital) => "Total Resources",
            (Terminology::WarRoom, ProfitLoss) => "Territory Gained/Lost",
            (Terminology::WarRoom, AssetColumn) => "Unit",
            (Terminology::WarRoom, QuantityColumn) => "Strength",
            (Terminology::WarRoom, AllocationColumn) => "Troop Dispersion",
            (Terminology::WarRoom, GrowthChart) => "Combat Strength Chart",
            (Terminology::WarRoom, AllocationModule) => "Strategic Planning Table",
            (Terminology::WarRoom, StrategyAutomatic) => "The AI General",
            (Terminology::WarRoom, StrategyRiskBased) => "Defensive Formation",
            (Terminology::WarRoom, StrategyProportional) => "Synchronized Advance",
            (Terminology::WarRoom, StrategyCustom) => "Own Battle Plan",
            (Terminology::WarRoom, Recommendation) => "Operation Orders",
            (Terminology::WarRoom, Research) => "AI General's Advisor",
            (Terminology::WarRoom, Journal) => "After Action Report",
            (Terminology::WarRoom, WhaleWatcher) => "Intelligence Unit",
        }
    }

    pub fn labels(&self) -> BTreeMap<Label, &'static str> {
        Label::ALL.iter().map(|l| (*l, self.text(*l))).collect()
    }

    pub fn regime_text(&self, label: RegimeLabel) -> &'static str {
        match (self, label) {
            (Terminology::Standard, RegimeLabel::RiskOn) => "Bullish (Risk-On)",
            (Terminology::Standard, RegimeLabel::RiskOff) => "Bearish (Risk-Off)",
            (Terminology::WarRoom, RegimeLabel::RiskOn) => "Clear Skies (Risk-On)",
            (Terminology::WarRoom, RegimeLabel::RiskOff) => "Storm (Risk-Off)",
        }
    }

    pub fn regime_reason(
        &self,
        asset: &str,
        label: RegimeLabel,
        current_price: f64,
        moving_average: f64,
    ) -> String {
        let price = Currency::Usd.format(current_price);
        let sma = Currency::Usd.format(moving_average);
        match (self, label) {
            (Terminology::Standard, RegimeLabel::RiskOn) => {
                format!("{} price ({}) is above its 200-day SMA ({}).", asset, price, sma)
            }
            (Terminology::Standard, RegimeLabel::RiskOff) => {
                format!("{} price ({}) is below its 200-day SMA ({}).", asset, price, sma)
            }
            (Terminology::WarRoom, RegimeLabel::RiskOn) => {
                format!("The main army ({}) leads ahead of the supply line ({}).", price, sma)
            }
            (Terminology::WarRoom, RegimeLabel::RiskOff) => {
                format!("The main army ({}) lags behind the supply line ({}).", price, sma)
            }
        }
    }
}

/// Query string for endpoints that render amounts or labels.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DisplayQuery {
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub terminology: Terminology,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::Usd.format(1234567.891), "$1,234,567.89");
        assert_eq!(Currency::Usd.format(12.5), "$12.50");
        assert_eq!(Currency::Idr.format(16200000.4), "Rp 16,200,000");
        assert_eq!(Currency::Usd.format(-950.0), "-$950.00");
        assert_eq!(Currency::Usd.format(-0.001), "$0.00");
        assert_eq!(Currency::Usd.format(0.0), "$0.00");
    }

    #[test]
    fn test_every_label_has_both_vocabularies() {
        for label in Label::ALL {
            assert!(!Terminology::Standard.text(label).is_empty());
            assert!(!Terminology::WarRoom.text(label).is_empty());
        }
        assert_eq!(Terminology::WarRoom.labels().len(), Label::ALL.len());
    }

    #[test]
    fn test_label_keys_serialize_as_snake_case() {
        let json = serde_json::to_value(Terminology::Standard.labels()).unwrap();
        assert_eq!(json["portfolio_value"], "Portfolio Value");
        assert_eq!(json["fear_greed"], "Fear & Greed Index");
    }
}
