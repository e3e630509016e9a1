//! Tick consolidation
//!
//! A consolidator is a per-(instrument, kind) state machine folding ticks
//! into the bar for the active time bucket. Completed bars are the explicit
//! return value of `update`/`scan`: at most one per call, exactly once per
//! closed bucket, and a bucket once emitted is never reopened.

mod quote;
mod trade;
mod types;

pub use quote::QuoteBarConsolidator;
pub use trade::TradeBarConsolidator;
pub use types::{ms_of_day, Bar, QuoteBar, Resolution, TradeBar};

use crate::source::{Tick, TickKind};
use chrono::NaiveDateTime;

/// Closed set of consolidation behaviors, selected once at processor
/// construction
pub enum Consolidator {
    Trade(TradeBarConsolidator),
    Quote(QuoteBarConsolidator),
    /// Tick resolution: no bucketing, every tick is output verbatim
    Passthrough,
}

impl Consolidator {
    /// Pick the behavior for a record kind at a resolution
    pub fn for_kind(kind: TickKind, resolution: Resolution) -> Self {
        match resolution.bucket_width() {
            None => Consolidator::Passthrough,
            Some(width) => match kind {
                TickKind::Trade => Consolidator::Trade(TradeBarConsolidator::new(width)),
                TickKind::Quote => Consolidator::Quote(QuoteBarConsolidator::new(width)),
            },
        }
    }

    /// Fold in a tick; returns the bar completed by this tick, if any.
    /// In passthrough mode the tick itself is returned immediately.
    pub fn update(&mut self, tick: &Tick) -> Option<Bar> {
        match self {
            Consolidator::Trade(c) => c.update(tick).map(Bar::Trade),
            Consolidator::Quote(c) => c.update(tick).map(Bar::Quote),
            Consolidator::Passthrough => Some(Bar::Tick(tick.clone())),
        }
    }

    /// Close the working bucket if the frontier has moved past its end
    pub fn scan(&mut self, frontier: NaiveDateTime) -> Option<Bar> {
        match self {
            Consolidator::Trade(c) => c.scan(frontier).map(Bar::Trade),
            Consolidator::Quote(c) => c.scan(frontier).map(Bar::Quote),
            Consolidator::Passthrough => None,
        }
    }

    /// Unconditionally emit any working bar (final flush only)
    pub fn take_working(&mut self) -> Option<Bar> {
        match self {
            Consolidator::Trade(c) => c.take_working().map(Bar::Trade),
            Consolidator::Quote(c) => c.take_working().map(Bar::Quote),
            Consolidator::Passthrough => None,
        }
    }
}
