//! Tick types

use crate::instrument::Instrument;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Record kind of a raw market event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickKind {
    Trade,
    Quote,
}

impl TickKind {
    /// Lowercase name used in output paths
    pub fn as_str(&self) -> &'static str {
        match self {
            TickKind::Trade => "trade",
            TickKind::Quote => "quote",
        }
    }
}

/// Kind-specific payload of a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickData {
    Trade {
        price: Decimal,
        size: Decimal,
    },
    Quote {
        bid_price: Decimal,
        bid_size: Decimal,
        ask_price: Decimal,
        ask_size: Decimal,
    },
}

/// One raw market event, immutable once read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Contract this event belongs to
    pub instrument: Instrument,
    /// Absolute local exchange time (reference date + time-of-day offset)
    pub time: NaiveDateTime,
    /// Trade or quote payload
    pub data: TickData,
}

impl Tick {
    pub fn kind(&self) -> TickKind {
        match self.data {
            TickData::Trade { .. } => TickKind::Trade,
            TickData::Quote { .. } => TickKind::Quote,
        }
    }
}
