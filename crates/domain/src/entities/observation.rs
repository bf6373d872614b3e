use crate::value_objects::price::Price;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single trade price observed at a point in time, one per detected swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Unix timestamp in seconds (block time of the swap).
    pub timestamp: i64,
    /// Execution price in quote tokens per base token.
    pub price: Price,
    /// Absolute quote-token amount exchanged, when the source measured it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_amount: Option<f64>,
}

impl PriceObservation {
    /// Creates an observation without a traded amount.
    #[must_use]
    pub fn new(timestamp: i64, price: Price) -> Self {
        Self {
            timestamp,
            price,
            quote_amount: None,
        }
    }

    /// Attaches the traded quote amount.
    #[must_use]
    pub fn with_quote_amount(mut self, amount: f64) -> Self {
        self.quote_amount = Some(amount);
        self
    }

    /// Converts a timestamp-keyed price map into an ordered observation list.
    ///
    /// Stops at the first entry with an invalid price and returns its error;
    /// no partial list is produced.
    pub fn from_price_map(
        prices: &BTreeMap<i64, f64>,
    ) -> Result<Vec<PriceObservation>, crate::error::DomainError> {
        prices
            .iter()
            .map(|(&timestamp, &value)| Price::new(value).map(|p| Self::new(timestamp, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_price_map_is_ordered() {
        let mut prices = BTreeMap::new();
        prices.insert(170, 1.5);
        prices.insert(100, 1.0);
        prices.insert(110, 1.2);

        let observations = PriceObservation::from_price_map(&prices).unwrap();
        let timestamps: Vec<i64> = observations.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![100, 110, 170]);
        assert!(observations.iter().all(|o| o.quote_amount.is_none()));
    }

    #[test]
    fn test_from_price_map_rejects_bad_price() {
        let mut prices = BTreeMap::new();
        prices.insert(100, 1.0);
        prices.insert(101, 0.0);
        prices.insert(102, -1.0);
        assert_eq!(
            PriceObservation::from_price_map(&prices),
            Err(crate::error::DomainError::InvalidPrice(0.0))
        );
    }

    #[test]
    fn test_serde_omits_missing_amount() {
        let obs = PriceObservation::new(5, Price::new(2.0).unwrap());
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(json, r#"{"timestamp":5,"price":2.0}"#);

        let back: PriceObservation =
            serde_json::from_str(r#"{"timestamp":5,"price":2.0,"quote_amount":10.0}"#).unwrap();
        assert_eq!(back.quote_amount, Some(10.0));
    }
}
