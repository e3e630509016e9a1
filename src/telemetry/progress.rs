//! Conversion progress reporting
//!
//! A pure side channel: throughput and completion estimates logged every
//! reporting interval of the merge loop. Completion is estimated against a
//! 16:00 close over a 6.5-hour session.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::time::Instant;

const SESSION_HOURS: f64 = 6.5;

/// Periodic throughput/frontier/completion reporter for one run
pub struct ProgressReporter {
    started: Instant,
    estimated_close: NaiveDateTime,
}

impl ProgressReporter {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            started: Instant::now(),
            estimated_close: reference_date.and_time(chrono::NaiveTime::MIN) + Duration::hours(16),
        }
    }

    /// Log one progress line for the current frontier
    pub fn report(&self, processed: u64, frontier: NaiveDateTime, instruments: usize) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate_kps = if elapsed > 0.0 {
            processed as f64 / 1_000.0 / elapsed
        } else {
            0.0
        };
        let completed = self.completion(frontier);
        tracing::info!(
            processed,
            rate_kps = rate_kps.round(),
            frontier = %frontier,
            completed_pct = (completed * 1000.0).round() / 10.0,
            instruments,
            "processed ticks"
        );
    }

    /// Fraction of the trading session behind the frontier, clamped to
    /// [0, 1]
    fn completion(&self, frontier: NaiveDateTime) -> f64 {
        let remaining = (self.estimated_close - frontier).num_milliseconds() as f64;
        let session = Duration::hours(1).num_milliseconds() as f64 * SESSION_HOURS;
        (1.0 - remaining / session).clamp(0.0, 1.0)
    }
}
