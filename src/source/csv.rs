//! Raw channel file reader
//!
//! Each channel file is CSV with one record per line, ascending by
//! time-of-day:
//!
//! ```text
//! ms_of_day,kind,underlying,expiry,right,strike,<payload>
//! ```
//!
//! `kind` is `T` (payload `price,size`) or `Q` (payload
//! `bid_price,bid_size,ask_price,ask_size`). The contract columns are empty
//! for equities. A record that cannot be decoded aborts the run; skipping it
//! would leave silently wrong bars downstream.

use crate::error::ConvertError;
use crate::instrument::{Instrument, OptionRight};
use crate::source::{Tick, TickData};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Lazy single-pass reader over one raw channel file
pub struct ChannelReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    reference_date: NaiveDate,
    line_no: u64,
}

impl ChannelReader {
    /// Open a channel file; records are dated against `reference_date`
    pub fn open(path: impl AsRef<Path>, reference_date: NaiveDate) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            reference_date,
            line_no: 0,
        })
    }

    fn parse_error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::Parse {
            file: self.path.clone(),
            line: self.line_no,
            reason: reason.into(),
        }
    }

    fn parse_record(&self, line: &str) -> Result<Tick, ConvertError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 6 {
            return Err(self.parse_error(format!("expected at least 6 fields, got {}", fields.len())));
        }

        let ms: i64 = fields[0]
            .parse()
            .map_err(|_| self.parse_error(format!("bad time-of-day offset '{}'", fields[0])))?;
        if ms < 0 {
            return Err(self.parse_error(format!("negative time-of-day offset '{}'", fields[0])));
        }
        let time =
            self.reference_date.and_time(chrono::NaiveTime::MIN) + Duration::milliseconds(ms);

        let instrument = if fields[3].is_empty() {
            Instrument::equity(fields[2])
        } else {
            let expiry = NaiveDate::parse_from_str(fields[3], "%Y%m%d")
                .map_err(|_| self.parse_error(format!("bad expiry '{}'", fields[3])))?;
            let right = match fields[4] {
                "C" => OptionRight::Call,
                "P" => OptionRight::Put,
                other => return Err(self.parse_error(format!("bad option right '{other}'"))),
            };
            let strike = self.parse_decimal(fields[5], "strike")?;
            Instrument::option(fields[2], expiry, strike, right)
        };

        let data = match fields[1] {
            "T" => {
                if fields.len() != 8 {
                    return Err(self.parse_error(format!(
                        "trade record expects 8 fields, got {}",
                        fields.len()
                    )));
                }
                TickData::Trade {
                    price: self.parse_decimal(fields[6], "price")?,
                    size: self.parse_decimal(fields[7], "size")?,
                }
            }
            "Q" => {
                if fields.len() != 10 {
                    return Err(self.parse_error(format!(
                        "quote record expects 10 fields, got {}",
                        fields.len()
                    )));
                }
                TickData::Quote {
                    bid_price: self.parse_decimal(fields[6], "bid price")?,
                    bid_size: self.parse_decimal(fields[7], "bid size")?,
                    ask_price: self.parse_decimal(fields[8], "ask price")?,
                    ask_size: self.parse_decimal(fields[9], "ask size")?,
                }
            }
            other => return Err(self.parse_error(format!("unknown record kind '{other}'"))),
        };

        Ok(Tick {
            instrument,
            time,
            data,
        })
    }

    fn parse_decimal(&self, field: &str, what: &str) -> Result<Decimal, ConvertError> {
        Decimal::from_str(field).map_err(|_| self.parse_error(format!("bad {what} '{field}'")))
    }
}

impl Iterator for ChannelReader {
    type Item = Result<Tick, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.is_empty() {
                continue;
            }
            return Some(self.parse_record(&line));
        }
    }
}
