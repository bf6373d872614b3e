//! Validation applied to a whole observation batch before any candle is built.

use crate::error::BuildError;
use candle_replay_domain::PriceObservation;

/// Checks every observation and rejects the batch on the first invalid one.
///
/// Prices must be positive and finite; traded amounts, when present, must be
/// finite and non-negative.
///
/// # Errors
/// Returns [`BuildError::InvalidObservation`] naming the first bad entry.
pub fn validate_batch(observations: &[PriceObservation]) -> Result<(), BuildError> {
    for (index, obs) in observations.iter().enumerate() {
        let price = obs.price.value();
        if !price.is_finite() || price <= 0.0 {
            return Err(BuildError::InvalidObservation {
                index,
                timestamp: obs.timestamp,
                reason: format!("price {price} is not a positive finite number"),
            });
        }
        if let Some(amount) = obs.quote_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(BuildError::InvalidObservation {
                    index,
                    timestamp: obs.timestamp,
                    reason: format!("quote amount {amount} is negative or not finite"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_replay_domain::Price;

    fn obs(ts: i64, price: f64) -> PriceObservation {
        PriceObservation::new(ts, Price::new(price).unwrap())
    }

    #[test]
    fn test_valid_batch() {
        let batch = vec![obs(1, 1.0), obs(2, 2.0).with_quote_amount(0.0)];
        assert!(validate_batch(&batch).is_ok());
        assert!(validate_batch(&[]).is_ok());
    }

    #[test]
    fn test_negative_amount_rejects_batch() {
        let batch = vec![obs(1, 1.0), obs(2, 2.0).with_quote_amount(-5.0)];
        match validate_batch(&batch) {
            Err(BuildError::InvalidObservation { index, timestamp, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(timestamp, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_nan_amount_rejects_batch() {
        let batch = vec![obs(1, 1.0).with_quote_amount(f64::NAN)];
        assert!(validate_batch(&batch).is_err());
    }
}
