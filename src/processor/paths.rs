//! Deterministic output naming
//!
//! Archive and entry names are pure functions of (sanitized instrument,
//! reference date, resolution, record kind) so re-running a day reproduces
//! the same tree. All contracts of one underlying share one archive per
//! (resolution, kind); each contract gets its own entry inside it.

use crate::consolidator::Resolution;
use crate::instrument::Instrument;
use crate::source::TickKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Archive path under the destination tree:
/// `<dest>/<category>/usa/<resolution>/<underlying>/<yyyymmdd>_<kind>[_american].zip`
pub fn zip_path(
    destination: &Path,
    instrument: &Instrument,
    date: NaiveDate,
    resolution: Resolution,
    kind: TickKind,
) -> PathBuf {
    let file = if instrument.is_option() {
        format!("{}_{}_american.zip", date.format("%Y%m%d"), kind.as_str())
    } else {
        format!("{}_{}.zip", date.format("%Y%m%d"), kind.as_str())
    };
    destination
        .join(instrument.category())
        .join("usa")
        .join(resolution.as_str())
        .join(instrument.underlying().to_lowercase())
        .join(file)
}

/// Entry name inside the archive, one per contract:
/// option `<yyyymmdd>_<underlying>_<res>_<kind>_american_<right>_<strike>_<expiry>.csv`,
/// equity `<yyyymmdd>_<ticker>_<res>_<kind>.csv`
pub fn entry_name(
    instrument: &Instrument,
    date: NaiveDate,
    resolution: Resolution,
    kind: TickKind,
) -> String {
    let underlying = instrument.underlying().to_lowercase();
    match instrument.contract() {
        Some(contract) => format!(
            "{}_{}_{}_{}_american_{}_{}_{}.csv",
            date.format("%Y%m%d"),
            underlying,
            resolution.as_str(),
            kind.as_str(),
            contract.right.as_str(),
            scaled_strike(contract.strike),
            contract.expiry.format("%Y%m%d"),
        ),
        None => format!(
            "{}_{}_{}_{}.csv",
            date.format("%Y%m%d"),
            underlying,
            resolution.as_str(),
            kind.as_str(),
        ),
    }
}

/// Flat directory used by disk flushes; zipping it yields the archive
pub fn flat_dir(zip_path: &Path) -> PathBuf {
    zip_path.with_extension("")
}

/// Strike rendered in 1/10000 units, e.g. 450.5 -> 4505000
fn scaled_strike(strike: Decimal) -> Decimal {
    (strike * Decimal::from(10_000)).normalize()
}
