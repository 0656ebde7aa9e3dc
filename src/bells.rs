//! Ship's bells: mapping seconds-in-day to the number of bells struck.
//!
//! Each 4-hour watch strikes one bell per half hour, 1 through 8. The two
//! dog watches (16:00-18:00 and 18:00-20:00) share one watch's worth of
//! bells: the first ends on 8 bells at 18:00, the second picks up at 5.

use std::fmt;

use crate::errors::WatchError;

pub const SECONDS_PER_DAY: u32 = 86_400;
pub const HALF_HOUR_SECS: u32 = 1_800;

/// Seconds elapsed in the local day, guaranteed to be in `[0, 86400)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DaySeconds(u32);

impl DaySeconds {
    pub fn new(secs: i64) -> Result<Self, WatchError> {
        if (0..i64::from(SECONDS_PER_DAY)).contains(&secs) {
            Ok(Self(secs as u32))
        } else {
            Err(WatchError::DayOutOfRange(secs))
        }
    }

    /// Build from a wall-clock offset that may have rounded up to midnight.
    pub fn wrapping(secs: i64) -> Self {
        Self(secs.rem_euclid(i64::from(SECONDS_PER_DAY)) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 3_600
    }

    pub fn is_multiple_of(self, secs: u32) -> bool {
        secs != 0 && self.0 % secs == 0
    }

    pub fn is_half_hour(self) -> bool {
        self.is_multiple_of(HALF_HOUR_SECS)
    }
}

impl fmt::Display for DaySeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        write!(f, "{:02}:{:02}:{:02}", s / 3_600, (s / 60) % 60, s % 60)
    }
}

/// A bell count in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bell(u8);

impl Bell {
    pub const EIGHT: Bell = Bell(8);

    pub fn count(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Bell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => write!(f, "1 bell"),
            n => write!(f, "{n} bells"),
        }
    }
}

/// Bells struck at a half-hour boundary.
///
/// Only meaningful when `day.is_half_hour()`; off-boundary inputs are mapped
/// to the half hour they fall in. The dog-watch exception is keyed on the
/// absolute hour, so there is no watch state to drift.
pub fn bells_at(day: DaySeconds) -> Bell {
    let index = (day.get() / HALF_HOUR_SECS) % 8;
    if index == 0 || (day.hour() == 18 && index == 4) {
        Bell::EIGHT
    } else {
        Bell(index as u8)
    }
}
