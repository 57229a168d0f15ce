//! Hybrid logical clock for ordering commits.
//!
//! Commits are folded in `date_created` order, and that order is the only
//! ordering guarantee the engine gives. Callers stamp commits with a
//! [`Timestamp`] taken from a clock they advance with [`Timestamp::tick`],
//! which stays monotonic even when the wall clock stalls or steps back.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall time (milliseconds since the Unix epoch) plus a logical counter.
///
/// Ordered by wall time first, then by the logical counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    wall_time: u64,
    logical: u32,
}

fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

impl Timestamp {
    /// Creates a timestamp at the current wall time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_millis(wall_clock_millis())
    }

    /// Creates a timestamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    /// Creates a timestamp with a zero logical counter.
    #[must_use]
    pub const fn from_millis(wall_time: u64) -> Self {
        Self::new(wall_time, 0)
    }

    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    #[must_use]
    pub const fn logical(&self) -> u32 {
        self.logical
    }

    /// Returns the next timestamp for a locally created commit.
    ///
    /// Strictly greater than `self`.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = wall_clock_millis();
        if now > self.wall_time {
            Self::from_millis(now)
        } else {
            Self {
                wall_time: self.wall_time,
                logical: self.logical.saturating_add(1),
            }
        }
    }

    /// Advances this clock past a timestamp observed elsewhere (for example
    /// a commit restored from another tab).
    ///
    /// The result is strictly greater than both `self` and `other`.
    #[must_use]
    pub fn observe(&self, other: &Self) -> Self {
        let now = wall_clock_millis();
        let max_wall = now.max(self.wall_time).max(other.wall_time);

        let logical = if max_wall == self.wall_time && max_wall == other.wall_time {
            self.logical.max(other.logical).saturating_add(1)
        } else if max_wall == self.wall_time {
            self.logical.saturating_add(1)
        } else if max_wall == other.wall_time {
            other.logical.saturating_add(1)
        } else {
            0
        };

        Self {
            wall_time: max_wall,
            logical,
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_time
            .cmp(&other.wall_time)
            .then(self.logical.cmp(&other.logical))
    }
}
