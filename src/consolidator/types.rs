//! Bar and resolution types plus the output line format
//!
//! The CSV line format here is the single source of truth for serialized
//! bars: both the in-memory packager and the disk-flush writer go through
//! [`Bar::to_csv`], so the two packaging strategies produce byte-identical
//! content.

use crate::source::{Tick, TickData};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed bucket width for consolidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Passthrough: every tick is its own unit of output
    Tick,
    Second,
    Minute,
    Hour,
    Daily,
}

impl Resolution {
    /// Bucket width, `None` for tick passthrough
    pub fn bucket_width(&self) -> Option<Duration> {
        match self {
            Resolution::Tick => None,
            Resolution::Second => Some(Duration::seconds(1)),
            Resolution::Minute => Some(Duration::minutes(1)),
            Resolution::Hour => Some(Duration::hours(1)),
            Resolution::Daily => Some(Duration::days(1)),
        }
    }

    /// Lowercase name used in output paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Tick => "tick",
            Resolution::Second => "second",
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Daily => "daily",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Milliseconds since midnight of the bar's own date
pub fn ms_of_day(time: NaiveDateTime) -> i64 {
    (time - time.date().and_time(NaiveTime::MIN)).num_milliseconds()
}

/// Floor a timestamp to the start of its bucket
pub(crate) fn round_down(time: NaiveDateTime, width: Duration) -> NaiveDateTime {
    let width_ms = width.num_milliseconds();
    let ms = time.and_utc().timestamp_millis();
    time - Duration::milliseconds(ms.rem_euclid(width_ms))
}

/// Aggregated trades for one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    /// Bucket start time
    pub time: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Aggregated best bid/ask for one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBar {
    /// Bucket start time
    pub time: NaiveDateTime,
    pub bid_open: Decimal,
    pub bid_high: Decimal,
    pub bid_low: Decimal,
    pub bid_close: Decimal,
    /// Bid size of the last tick folded into the bucket
    pub last_bid_size: Decimal,
    pub ask_open: Decimal,
    pub ask_high: Decimal,
    pub ask_low: Decimal,
    pub ask_close: Decimal,
    /// Ask size of the last tick folded into the bucket
    pub last_ask_size: Decimal,
}

/// One unit of consolidated output
#[derive(Debug, Clone, PartialEq)]
pub enum Bar {
    Trade(TradeBar),
    Quote(QuoteBar),
    /// Tick-resolution passthrough, one tick verbatim
    Tick(Tick),
}

impl Bar {
    /// Bucket start time (tick time in passthrough mode)
    pub fn time(&self) -> NaiveDateTime {
        match self {
            Bar::Trade(b) => b.time,
            Bar::Quote(b) => b.time,
            Bar::Tick(t) => t.time,
        }
    }

    /// Serialize to the archive line format
    pub fn to_csv(&self) -> String {
        match self {
            Bar::Trade(b) => format!(
                "{},{},{},{},{},{}",
                ms_of_day(b.time),
                b.open,
                b.high,
                b.low,
                b.close,
                b.volume
            ),
            Bar::Quote(b) => format!(
                "{},{},{},{},{},{},{},{},{},{},{}",
                ms_of_day(b.time),
                b.bid_open,
                b.bid_high,
                b.bid_low,
                b.bid_close,
                b.last_bid_size,
                b.ask_open,
                b.ask_high,
                b.ask_low,
                b.ask_close,
                b.last_ask_size
            ),
            Bar::Tick(t) => match t.data {
                TickData::Trade { price, size } => {
                    format!("{},{},{}", ms_of_day(t.time), price, size)
                }
                TickData::Quote {
                    bid_price,
                    bid_size,
                    ask_price,
                    ask_size,
                } => format!(
                    "{},{},{},{},{}",
                    ms_of_day(t.time),
                    bid_price,
                    bid_size,
                    ask_price,
                    ask_size
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_round_down_to_minute() {
        let t = at(9, 30, 42) + Duration::milliseconds(137);
        assert_eq!(round_down(t, Duration::minutes(1)), at(9, 30, 0));
    }

    #[test]
    fn test_round_down_on_boundary_is_identity() {
        assert_eq!(round_down(at(10, 0, 0), Duration::hours(1)), at(10, 0, 0));
    }

    #[test]
    fn test_ms_of_day() {
        assert_eq!(ms_of_day(at(9, 30, 0)), 34_200_000);
        assert_eq!(ms_of_day(at(0, 0, 0)), 0);
    }

    #[test]
    fn test_trade_bar_line() {
        let bar = Bar::Trade(TradeBar {
            time: at(9, 30, 0),
            open: dec!(10.0),
            high: dec!(10.2),
            low: dec!(10.0),
            close: dec!(10.2),
            volume: dec!(30),
        });
        assert_eq!(bar.to_csv(), "34200000,10.0,10.2,10.0,10.2,30");
    }

    #[test]
    fn test_quote_bar_line_field_count() {
        let bar = Bar::Quote(QuoteBar {
            time: at(9, 30, 0),
            bid_open: dec!(1.1),
            bid_high: dec!(1.2),
            bid_low: dec!(1.0),
            bid_close: dec!(1.15),
            last_bid_size: dec!(5),
            ask_open: dec!(1.2),
            ask_high: dec!(1.3),
            ask_low: dec!(1.15),
            ask_close: dec!(1.25),
            last_ask_size: dec!(7),
        });
        assert_eq!(bar.to_csv().split(',').count(), 11);
    }

    #[test]
    fn test_resolution_widths() {
        assert_eq!(Resolution::Tick.bucket_width(), None);
        assert_eq!(
            Resolution::Second.bucket_width(),
            Some(Duration::seconds(1))
        );
        assert_eq!(Resolution::Daily.bucket_width(), Some(Duration::days(1)));
    }
}
