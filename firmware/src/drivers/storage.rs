//! `flight_core::logger::LogSink` stand-in for bring-up and bench testing.
//! The real flight unit is expected to wire this trait to an SD card's FAT
//! layer; that block device and filesystem are out of scope here, so this
//! keeps the logging pipeline exercisable on hardware that has no card
//! fitted by holding the current flight's rows in a ring buffer instead.

use heapless::Deque;

use flight_core::logger::LogSink;

/// Capacity in rows, not bytes: enough for a few minutes at the fastest
/// (20 Hz, `Powered`/`Coasting`) logging cadence.
const CAPACITY_ROWS: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
pub struct Full;

/// Ring-buffered append-only sink keyed by a single open file index. Rows
/// are stored whole (one `Deque` entry per formatted line) rather than as
/// raw bytes, since `heapless::String<N>` rows are already bounded.
pub struct RamLogSink {
    open_index: Option<u32>,
    rows: Deque<heapless::Vec<u8, { flight_core::logger::MAX_ROW_LEN }>, CAPACITY_ROWS>,
}

impl RamLogSink {
    pub const fn new() -> Self {
        Self {
            open_index: None,
            rows: Deque::new(),
        }
    }

    /// Rows written since the sink was opened, oldest first.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(|v| v.as_slice())
    }
}

impl LogSink for RamLogSink {
    type Error = Full;

    fn exists(&mut self, n: u32) -> bool {
        self.open_index == Some(n)
    }

    fn create(&mut self, n: u32) -> Result<(), Full> {
        self.open_index = Some(n);
        self.rows.clear();
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), Full> {
        let mut row = heapless::Vec::new();
        row.extend_from_slice(bytes).map_err(|_| Full)?;
        if self.rows.is_full() {
            self.rows.pop_front();
        }
        self.rows.push_back(row).map_err(|_| Full)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Full> {
        Ok(())
    }
}
