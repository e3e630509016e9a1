//! Background-buffered channel reading
//!
//! Decouples disk I/O from the merge loop: each channel file is drained by
//! its own blocking worker into a bounded queue. The producer suspends when
//! the queue is full and the consumer suspends when it is empty; no ticks
//! are dropped. When the file is exhausted the queue is drained then closed.

use crate::error::ConvertError;
use crate::source::{ChannelReader, Tick, TickStream};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Ticks buffered ahead of the merge loop per channel
pub const QUEUE_CAPACITY: usize = 10_000;

/// Consumer handle over a channel file being read on a background worker
pub struct BufferedReader {
    rx: mpsc::Receiver<Result<Tick, ConvertError>>,
}

impl BufferedReader {
    /// Start a worker pulling the reader ahead into a bounded queue
    pub fn spawn(reader: ChannelReader) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::task::spawn_blocking(move || {
            for item in reader {
                let fatal = item.is_err();
                if tx.blocking_send(item).is_err() {
                    // Consumer dropped mid-run; nothing left to feed.
                    break;
                }
                if fatal {
                    break;
                }
            }
        });
        Self { rx }
    }
}

#[async_trait]
impl TickStream for BufferedReader {
    async fn next_tick(&mut self) -> Result<Option<Tick>, ConvertError> {
        match self.rx.recv().await {
            Some(Ok(tick)) => Ok(Some(tick)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn channel_file(lines: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_drains_file_in_order_then_closes() {
        let file = channel_file(
            "1000,T,SPY,20240315,C,450,1.0,1\n2000,T,SPY,20240315,C,450,1.1,2\n3000,T,SPY,20240315,C,450,1.2,3\n",
        );
        let reader =
            ChannelReader::open(file.path(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
                .unwrap();
        let mut buffered = BufferedReader::spawn(reader);

        let mut times = vec![];
        while let Some(tick) = buffered.next_tick().await.unwrap() {
            times.push(tick.time);
        }
        assert_eq!(times.len(), 3);
        assert!(times.windows(2).all(|w| w[0] < w[1]));

        // Closed queue keeps reporting exhaustion
        assert!(buffered.next_tick().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parse_failure_surfaces_to_consumer() {
        let file = channel_file("1000,T,SPY,20240315,C,450,1.0,1\nbroken line\n");
        let reader =
            ChannelReader::open(file.path(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
                .unwrap();
        let mut buffered = BufferedReader::spawn(reader);

        assert!(buffered.next_tick().await.unwrap().is_some());
        assert!(buffered.next_tick().await.is_err());
    }
}
