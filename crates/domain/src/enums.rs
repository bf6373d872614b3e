use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange protocol a pool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Raydium AMM v4.
    Raydium,
}

/// How the `volume` field of a candle is computed from its observations.
///
/// `PriceSum` reproduces an older export format that added prices together.
/// It mixes units and is only kept so those files can be regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeRule {
    /// Number of trades in the interval.
    #[default]
    TradeCount,
    /// Sum of the observed prices.
    PriceSum,
    /// Sum of the traded quote-token amounts.
    QuoteAmount,
}

impl VolumeRule {
    /// All rules, in declaration order.
    pub const ALL: [VolumeRule; 3] = [
        VolumeRule::TradeCount,
        VolumeRule::PriceSum,
        VolumeRule::QuoteAmount,
    ];

    /// Kebab-case name used on the command line and in serialized config.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeRule::TradeCount => "trade-count",
            VolumeRule::PriceSum => "price-sum",
            VolumeRule::QuoteAmount => "quote-amount",
        }
    }
}

impl fmt::Display for VolumeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeRule {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        VolumeRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == needle)
            .ok_or_else(|| DomainError::UnknownVariant {
                kind: "volume rule",
                value: s.to_string(),
            })
    }
}
