//! Snowflake ID Generator
//!
//! Twitter-style distributed unique ID generation. Every stored entity gets
//! its id from here when it is inserted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch (2024-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1704067200000;

/// Bits of the per-millisecond sequence counter.
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Snowflake ID generator
///
/// The last issued `(timestamp, sequence)` pair lives in a single atomic so
/// concurrent callers can never both claim the same slot.
pub struct SnowflakeGenerator {
    epoch: u64,
    machine_id: u64,
    /// `timestamp << SEQUENCE_BITS | sequence` of the last issued id
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            epoch,
            machine_id: machine_id & 0x3FF, // 10 bits
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut current = self.state.load(Ordering::Acquire);
        let (timestamp, sequence) = loop {
            let last_timestamp = current >> SEQUENCE_BITS;
            let last_sequence = current & SEQUENCE_MASK;
            let now = self.current_timestamp();

            // Clock went backwards or stayed put: stay on the last tick.
            let next = if now > last_timestamp {
                (now, 0)
            } else if last_sequence < SEQUENCE_MASK {
                (last_timestamp, last_sequence + 1)
            } else {
                // Sequence exhausted for this millisecond; borrow the next one.
                (last_timestamp + 1, 0)
            };

            match self.state.compare_exchange_weak(
                current,
                (next.0 << SEQUENCE_BITS) | next.1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break next,
                Err(actual) => current = actual,
            }
        };

        let id = ((timestamp.saturating_sub(self.epoch)) << 22)
            | (self.machine_id << SEQUENCE_BITS)
            | sequence;

        id as i64
    }

    /// Get current timestamp in milliseconds
    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
    }

    /// Extract the millisecond timestamp embedded in an id.
    pub fn extract_timestamp(&self, snowflake: i64) -> u64 {
        ((snowflake as u64) >> 22) + self.epoch
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH)
    }
}

/// Parse snowflake from string
pub fn from_string(s: &str) -> Result<i64, std::num::ParseIntError> {
    s.parse()
}
