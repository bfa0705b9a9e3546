//! Simulated block clock

use chrono::Duration;

use crate::constants::BLOCK_TIME;

/// Block timestamp and height. Moves only through `sleep` and `mine`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clock {
    /// Current block timestamp in seconds
    pub timestamp: u64,
    /// Current block number
    pub block_number: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            timestamp: 1_700_000_000,
            block_number: 18_000_000,
        }
    }
}

impl Clock {
    /// Moves the timestamp forward without producing a block.
    pub fn sleep(&mut self, seconds: u64) -> &mut Self {
        self.timestamp = self.timestamp.saturating_add(seconds);
        self
    }

    /// Same as `sleep`, taking a `chrono::Duration`. Negative durations are ignored.
    pub fn sleep_for(&mut self, duration: Duration) -> &mut Self {
        let seconds = duration.num_seconds().max(0) as u64;
        self.sleep(seconds)
    }

    /// Mines `blocks` blocks, each advancing the timestamp by `BLOCK_TIME`.
    pub fn mine(&mut self, blocks: u64) -> &mut Self {
        self.block_number = self.block_number.saturating_add(blocks);
        self.timestamp = self.timestamp.saturating_add(blocks.saturating_mul(BLOCK_TIME));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_and_mine_advance_time() {
        let mut clock = Clock::default();
        let start = clock.timestamp;
        clock.sleep(3_600).mine(2);
        assert_eq!(clock.timestamp, start + 3_602);
        assert_eq!(clock.block_number, 18_000_002);
    }

    #[test]
    fn sleep_for_accepts_chrono_durations() {
        let mut clock = Clock::default();
        let start = clock.timestamp;
        clock.sleep_for(Duration::hours(6));
        assert_eq!(clock.timestamp, start + 21_600);
        clock.sleep_for(Duration::seconds(-5));
        assert_eq!(clock.timestamp, start + 21_600);
    }
}
