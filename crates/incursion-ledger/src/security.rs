//! Severity classification from a staging system's security status.
//!
//! The feed reports security status as a float. It is converted to
//! [`Decimal`] once, rounded to the configured precision (half away from
//! zero, the way in-game displays round it) and compared against decimal
//! thresholds, so no float comparison is involved.
//!
//! Defaults: round to one decimal place, `< 0.1` is null-security,
//! `< 0.5` is low-security, anything else is high-security.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use incursion_types::SecurityTier;

use crate::LedgerError;

/// Thresholds mapping a security status onto a [`SecurityTier`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityPolicy {
    /// Rounded values strictly below this are null-security.
    #[serde(default = "default_null_below")]
    pub null_below: Decimal,
    /// Rounded values strictly below this (and not null) are low-security.
    #[serde(default = "default_low_below")]
    pub low_below: Decimal,
    /// Decimal places kept before comparing.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            null_below: default_null_below(),
            low_below: default_low_below(),
            precision: default_precision(),
        }
    }
}

impl SecurityPolicy {
    /// Reject threshold pairs that would make the low band negative.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.null_below > self.low_below {
            return Err(LedgerError::InvalidPolicy(format!(
                "null threshold {} is above the low/high boundary {}",
                self.null_below, self.low_below
            )));
        }
        Ok(())
    }

    /// Round a raw security status the way the thresholds expect.
    pub fn round(&self, security_status: f64) -> Result<Decimal, LedgerError> {
        let value = Decimal::try_from(security_status)
            .map_err(|_e| LedgerError::NonFiniteSecurity(security_status))?;
        Ok(value.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Classify a raw security status.
    pub fn classify(&self, security_status: f64) -> Result<SecurityTier, LedgerError> {
        let rounded = self.round(security_status)?;
        let tier = if rounded < self.null_below {
            SecurityTier::Null
        } else if rounded < self.low_below {
            SecurityTier::Low
        } else {
            SecurityTier::High
        };
        Ok(tier)
    }
}

fn default_null_below() -> Decimal {
    Decimal::new(1, 1)
}

fn default_low_below() -> Decimal {
    Decimal::new(5, 1)
}

const fn default_precision() -> u32 {
    1
}
