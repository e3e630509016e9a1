//! Instrument identifiers
//!
//! An instrument is either a plain equity ticker or one option contract
//! (underlying, expiry, strike, right). Identifiers double as output path
//! components, so names colliding with reserved device names are renamed
//! with a `_` prefix before any path is derived.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names that cannot be used as path components on Windows volumes
const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Option right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Lowercase name used in archive entry names
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionRight::Call => "call",
            OptionRight::Put => "put",
        }
    }
}

/// Contract terms for a single option
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    pub expiry: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
}

/// Uniquely names one tradable contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker for equities, underlying ticker for options
    underlying: String,
    /// Present for options, absent for equities
    contract: Option<OptionContract>,
}

impl Instrument {
    /// Create an equity instrument
    pub fn equity(ticker: impl Into<String>) -> Self {
        Self {
            underlying: ticker.into().to_uppercase(),
            contract: None,
        }
    }

    /// Create an option contract instrument
    pub fn option(
        underlying: impl Into<String>,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    ) -> Self {
        Self {
            underlying: underlying.into().to_uppercase(),
            contract: Some(OptionContract {
                expiry,
                strike,
                right,
            }),
        }
    }

    /// Underlying ticker (the equity ticker itself for equities)
    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    /// Contract terms, when this is an option
    pub fn contract(&self) -> Option<&OptionContract> {
        self.contract.as_ref()
    }

    pub fn is_option(&self) -> bool {
        self.contract.is_some()
    }

    /// Asset category directory under the destination tree
    pub fn category(&self) -> &'static str {
        if self.is_option() {
            "option"
        } else {
            "equity"
        }
    }

    /// Rename the underlying if it matches a reserved device name.
    ///
    /// Idempotent: an already-prefixed name no longer matches the reserved
    /// list and passes through unchanged. A genuine instrument named like
    /// the prefixed form (e.g. `_CON`) would collide; that limitation is
    /// accepted.
    pub fn sanitized(&self) -> Instrument {
        if RESERVED_DEVICE_NAMES.contains(&self.underlying.as_str()) {
            Instrument {
                underlying: format!("_{}", self.underlying),
                contract: self.contract.clone(),
            }
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contract {
            Some(c) => write!(
                f,
                "{} {} {} {}",
                self.underlying,
                c.expiry.format("%Y%m%d"),
                c.right.as_str(),
                c.strike
            ),
            None => write!(f, "{}", self.underlying),
        }
    }
}
