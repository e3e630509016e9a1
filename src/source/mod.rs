//! Tick sources
//!
//! One raw channel file yields a lazy, time-ordered sequence of ticks.
//! Channel readers run on background workers feeding bounded queues, and a
//! synchronizer merges all channels into one globally time-ordered stream.

mod buffered;
mod csv;
mod sync;
mod types;

pub use buffered::{BufferedReader, QUEUE_CAPACITY};
pub use csv::ChannelReader;
pub use sync::Synchronizer;
pub use types::{Tick, TickData, TickKind};

use crate::error::ConvertError;
use async_trait::async_trait;

/// A consumable stream of time-ordered ticks
#[async_trait]
pub trait TickStream: Send {
    /// Next tick in time order, or `None` once the stream is exhausted
    async fn next_tick(&mut self) -> Result<Option<Tick>, ConvertError>;
}
