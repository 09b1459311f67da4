//! Parser for `/sys/block/<device>/stat`.
//!
//! Pure functions over the file content, testable with string inputs.
//! Field layout (Documentation/block/stat.rst):
//!
//! ```text
//!  0 read I/Os       requests      number of read I/Os processed
//!  1 read merges     requests      number of read I/Os merged with in-queue I/O
//!  2 read sectors    sectors       number of sectors read
//!  3 read ticks      milliseconds  total wait time for read requests
//!  4 write I/Os      requests      number of write I/Os processed
//!  5 write merges    requests      number of write I/Os merged with in-queue I/O
//!  6 write sectors   sectors       number of sectors written
//!  7 write ticks     milliseconds  total wait time for write requests
//!  8 in_flight       requests      number of I/Os currently in flight
//!  9 io_ticks        milliseconds  total time this block device has been active
//! 10 time_in_queue   milliseconds  total wait time for all requests
//! ```
//!
//! Newer kernels append discard and flush counters; only the first 11 fields
//! are read.

use thiserror::Error;

/// Number of leading fields read from a stat file.
pub const FIELD_COUNT: usize = 11;

/// Field names in file order, used in parse errors and delta logging.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "read_ios",
    "read_merges",
    "read_sectors",
    "read_ticks",
    "write_ios",
    "write_merges",
    "write_sectors",
    "write_ticks",
    "in_flight",
    "io_ticks",
    "time_in_queue",
];

/// Error type for stat parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("field {index} ({name}) is missing")]
    MissingField { index: usize, name: &'static str },

    #[error("field {index} ({name}) is not a non-negative integer: {found:?}")]
    InvalidField {
        index: usize,
        name: &'static str,
        found: String,
    },
}

/// One reading of a block device stat file.
///
/// All fields except `in_flight` are cumulative counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStat {
    /// Read I/Os completed.
    pub read_ios: u64,
    /// Read I/Os merged with in-queue I/O.
    pub read_merges: u64,
    /// 512-byte sectors read.
    pub read_sectors: u64,
    /// Total wait time for reads (ms).
    pub read_ticks: u64,
    /// Write I/Os completed.
    pub write_ios: u64,
    /// Write I/Os merged with in-queue I/O.
    pub write_merges: u64,
    /// 512-byte sectors written.
    pub write_sectors: u64,
    /// Total wait time for writes (ms).
    pub write_ticks: u64,
    /// I/Os currently in flight (gauge).
    pub in_flight: u64,
    /// Time the device has been active (ms).
    pub io_ticks: u64,
    /// Weighted wait time for all requests (ms).
    pub time_in_queue: u64,
}

impl BlockStat {
    /// Builds a reading from fields in file order.
    pub fn from_fields(f: [u64; FIELD_COUNT]) -> Self {
        Self {
            read_ios: f[0],
            read_merges: f[1],
            read_sectors: f[2],
            read_ticks: f[3],
            write_ios: f[4],
            write_merges: f[5],
            write_sectors: f[6],
            write_ticks: f[7],
            in_flight: f[8],
            io_ticks: f[9],
            time_in_queue: f[10],
        }
    }

    /// Returns the fields in file order.
    pub fn fields(&self) -> [u64; FIELD_COUNT] {
        [
            self.read_ios,
            self.read_merges,
            self.read_sectors,
            self.read_ticks,
            self.write_ios,
            self.write_merges,
            self.write_sectors,
            self.write_ticks,
            self.in_flight,
            self.io_ticks,
            self.time_in_queue,
        ]
    }
}

/// Parses `/sys/block/<device>/stat` content.
///
/// Reads exactly [`FIELD_COUNT`] whitespace-separated integers; trailing
/// fields are ignored.
pub fn parse_block_stat(content: &str) -> Result<BlockStat, ParseError> {
    let mut fields = [0u64; FIELD_COUNT];
    let mut tokens = content.split_whitespace();

    for (index, slot) in fields.iter_mut().enumerate() {
        let name = FIELD_NAMES[index];
        let token = tokens
            .next()
            .ok_or(ParseError::MissingField { index, name })?;
        *slot = token.parse().map_err(|_| ParseError::InvalidField {
            index,
            name,
            found: token.to_string(),
        })?;
    }

    Ok(BlockStat::from_fields(fields))
}
