use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive, finite trade price expressed in quote tokens per base token.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price {
    value: f64,
}

impl Price {
    /// Creates a price, rejecting zero, negative and non-finite values.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPrice`] for anything that is not a finite positive number.
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self { value })
        } else {
            Err(DomainError::InvalidPrice(value))
        }
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl TryFrom<f64> for Price {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.value
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
