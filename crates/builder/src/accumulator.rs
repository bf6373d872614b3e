//! Per-interval OHLCV accumulation.

use candle_replay_domain::{PriceObservation, VolumeRule};

/// Running OHLCV state for the interval currently being filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    /// Aligned interval start, Unix seconds.
    pub start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades: u32,
    rule: VolumeRule,
}

impl Accumulator {
    /// Opens a new interval with its first observation.
    #[must_use]
    pub fn open(start: i64, first: &PriceObservation, rule: VolumeRule) -> Self {
        let price = first.price.value();
        let mut acc = Self {
            start,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
            trades: 0,
            rule,
        };
        acc.add_volume(first);
        acc
    }

    /// Folds a later observation of the same interval into the state.
    pub fn push(&mut self, obs: &PriceObservation) {
        let price = obs.price.value();
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.add_volume(obs);
    }

    fn add_volume(&mut self, obs: &PriceObservation) {
        self.trades = self.trades.saturating_add(1);
        self.volume += match self.rule {
            VolumeRule::TradeCount => 1.0,
            VolumeRule::PriceSum => obs.price.value(),
            VolumeRule::QuoteAmount => obs.quote_amount.unwrap_or(0.0),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_replay_domain::Price;

    fn obs(ts: i64, price: f64, amount: Option<f64>) -> PriceObservation {
        PriceObservation {
            timestamp: ts,
            price: Price::new(price).unwrap(),
            quote_amount: amount,
        }
    }

    #[test]
    fn test_ohlc_tracking() {
        let mut acc = Accumulator::open(60, &obs(61, 100.0, None), VolumeRule::TradeCount);
        acc.push(&obs(62, 110.0, None));
        acc.push(&obs(63, 95.0, None));
        acc.push(&obs(64, 105.0, None));

        assert_eq!(acc.open, 100.0);
        assert_eq!(acc.high, 110.0);
        assert_eq!(acc.low, 95.0);
        assert_eq!(acc.close, 105.0);
        assert_eq!(acc.volume, 4.0);
        assert_eq!(acc.trades, 4);
    }

    #[test]
    fn test_volume_rules() {
        let a = obs(0, 2.0, Some(10.0));
        let b = obs(1, 3.0, None);

        let mut sum = Accumulator::open(0, &a, VolumeRule::PriceSum);
        sum.push(&b);
        assert_eq!(sum.volume, 5.0);

        let mut quote = Accumulator::open(0, &a, VolumeRule::QuoteAmount);
        quote.push(&b);
        assert_eq!(quote.volume, 10.0);
        assert_eq!(quote.trades, 2);
    }
}
