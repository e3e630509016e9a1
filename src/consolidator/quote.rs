//! Quote bar consolidation

use super::types::{round_down, QuoteBar};
use crate::source::{Tick, TickData};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;

/// Folds quote ticks into fixed-width best bid/ask bars.
///
/// Bid and ask sides each track their own OHLC within the bucket; the last
/// bid/ask sizes are carried from the most recent tick folded in.
pub struct QuoteBarConsolidator {
    width: Duration,
    working: Option<QuoteBar>,
}

impl QuoteBarConsolidator {
    pub fn new(width: Duration) -> Self {
        Self {
            width,
            working: None,
        }
    }

    /// Fold in one quote tick, returning the completed bar if this tick
    /// closed the previous bucket
    pub fn update(&mut self, tick: &Tick) -> Option<QuoteBar> {
        let TickData::Quote {
            bid_price,
            bid_size,
            ask_price,
            ask_size,
        } = tick.data
        else {
            return None;
        };
        match self.working.as_mut() {
            None => {
                self.working =
                    Some(self.open_bar(tick.time, bid_price, bid_size, ask_price, ask_size));
                None
            }
            Some(bar) if tick.time < bar.time + self.width => {
                bar.bid_high = bar.bid_high.max(bid_price);
                bar.bid_low = bar.bid_low.min(bid_price);
                bar.bid_close = bid_price;
                bar.last_bid_size = bid_size;
                bar.ask_high = bar.ask_high.max(ask_price);
                bar.ask_low = bar.ask_low.min(ask_price);
                bar.ask_close = ask_price;
                bar.last_ask_size = ask_size;
                None
            }
            Some(_) => {
                let completed = self.working.take();
                self.working =
                    Some(self.open_bar(tick.time, bid_price, bid_size, ask_price, ask_size));
                completed
            }
        }
    }

    /// Close the working bar if its bucket end is at or before `frontier`
    pub fn scan(&mut self, frontier: NaiveDateTime) -> Option<QuoteBar> {
        match &self.working {
            Some(bar) if bar.time + self.width <= frontier => self.working.take(),
            _ => None,
        }
    }

    /// Unconditionally emit the working bar for the final flush
    pub fn take_working(&mut self) -> Option<QuoteBar> {
        self.working.take()
    }

    fn open_bar(
        &self,
        time: NaiveDateTime,
        bid_price: Decimal,
        bid_size: Decimal,
        ask_price: Decimal,
        ask_size: Decimal,
    ) -> QuoteBar {
        QuoteBar {
            time: round_down(time, self.width),
            bid_open: bid_price,
            bid_high: bid_price,
            bid_low: bid_price,
            bid_close: bid_price,
            last_bid_size: bid_size,
            ask_open: ask_price,
            ask_high: ask_price,
            ask_low: ask_price,
            ask_close: ask_price,
            last_ask_size: ask_size,
        }
    }
}
