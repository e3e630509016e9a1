//! K-way time-ordered merge across tick streams
//!
//! The synchronizer holds each input's current head and repeatedly yields
//! the globally-smallest tick by time, advancing only the input it came
//! from. Ties are broken by input registration order, which is stable and
//! does not affect bar correctness since aggregation within a bucket is
//! commutative.

use crate::error::ConvertError;
use crate::source::{Tick, TickStream};

/// Merges multiple tick streams into one globally time-ordered stream
pub struct Synchronizer<S> {
    inputs: Vec<S>,
    heads: Vec<Option<Tick>>,
    primed: bool,
}

impl<S: TickStream> Synchronizer<S> {
    pub fn new(inputs: Vec<S>) -> Self {
        let heads = inputs.iter().map(|_| None).collect();
        Self {
            inputs,
            heads,
            primed: false,
        }
    }

    /// Fill every input's head before the first read
    pub async fn prime(&mut self) -> Result<(), ConvertError> {
        for (input, head) in self.inputs.iter_mut().zip(self.heads.iter_mut()) {
            *head = input.next_tick().await?;
        }
        self.primed = true;
        Ok(())
    }

    /// The globally-smallest-timestamp tick across all non-exhausted inputs
    pub fn current(&self) -> Option<&Tick> {
        self.min_index().and_then(|i| self.heads[i].as_ref())
    }

    /// Consume `current()` and refill the head of the input it came from.
    ///
    /// Returns `None` only once every input is exhausted.
    pub async fn advance(&mut self) -> Result<Option<Tick>, ConvertError> {
        if !self.primed {
            self.prime().await?;
        }
        let Some(i) = self.min_index() else {
            return Ok(None);
        };
        let tick = self.heads[i].take();
        self.heads[i] = self.inputs[i].next_tick().await?;
        Ok(tick)
    }

    /// First input holding the minimum head time (stable tie-break)
    fn min_index(&self) -> Option<usize> {
        let mut min: Option<(usize, &Tick)> = None;
        for (i, head) in self.heads.iter().enumerate() {
            if let Some(tick) = head {
                match min {
                    Some((_, best)) if best.time <= tick.time => {}
                    _ => min = Some((i, tick)),
                }
            }
        }
        min.map(|(i, _)| i)
    }
}
