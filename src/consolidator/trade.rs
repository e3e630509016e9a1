//! Trade bar consolidation

use super::types::{round_down, TradeBar};
use crate::source::{Tick, TickData};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;

/// Folds trade ticks into fixed-width OHLCV bars.
///
/// Holds at most one working bar. A tick at or beyond the working bucket's
/// end closes the bucket and opens a new one seeded from that tick; empty
/// buckets are never emitted.
pub struct TradeBarConsolidator {
    width: Duration,
    working: Option<TradeBar>,
}

impl TradeBarConsolidator {
    pub fn new(width: Duration) -> Self {
        Self {
            width,
            working: None,
        }
    }

    /// Fold in one trade tick, returning the completed bar if this tick
    /// closed the previous bucket
    pub fn update(&mut self, tick: &Tick) -> Option<TradeBar> {
        let TickData::Trade { price, size } = tick.data else {
            return None;
        };
        match self.working.as_mut() {
            None => {
                self.working = Some(self.open_bar(tick.time, price, size));
                None
            }
            Some(bar) if tick.time < bar.time + self.width => {
                bar.high = bar.high.max(price);
                bar.low = bar.low.min(price);
                bar.close = price;
                bar.volume += size;
                None
            }
            Some(_) => {
                let completed = self.working.take();
                self.working = Some(self.open_bar(tick.time, price, size));
                completed
            }
        }
    }

    /// Close the working bar if its bucket end is at or before `frontier`.
    ///
    /// No-op (and idempotent) while the frontier is still inside the bucket.
    pub fn scan(&mut self, frontier: NaiveDateTime) -> Option<TradeBar> {
        match &self.working {
            Some(bar) if bar.time + self.width <= frontier => self.working.take(),
            _ => None,
        }
    }

    /// Unconditionally emit the working bar; used only for the final flush
    /// where a trailing partial bucket is still valid output
    pub fn take_working(&mut self) -> Option<TradeBar> {
        self.working.take()
    }

    fn open_bar(&self, time: NaiveDateTime, price: Decimal, size: Decimal) -> TradeBar {
        TradeBar {
            time: round_down(time, self.width),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: size,
        }
    }
}
