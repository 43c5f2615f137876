use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A monetary amount in minor currency units (cents, lipa).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    /// Converts a provider amount expressed in major units (e.g. `125.5`) to minor units, rounding to the nearest
    /// cent.
    pub fn from_major_f64(value: f64) -> Result<Self, AmountConversionError> {
        const LIMIT: f64 = 9.0e15;
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() > LIMIT {
            return Err(AmountConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let cents = cents as i64;
        Ok(Self(cents))
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Formats in major units with two decimals, e.g. `125.50`. This is the format KEKS Pay expects in payment links.
impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
