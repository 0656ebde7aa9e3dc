//! Alert policy: what, if anything, should sound at a given second.
//!
//! Half-hour chimes take precedence over the repeating alert so the two
//! never sound on the same tick.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::bells::{bells_at, Bell, DaySeconds};

/// Repeating alert interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMode {
    #[default]
    Off,
    #[serde(rename = "every_5")]
    Every5,
    #[serde(rename = "every_10")]
    Every10,
    #[serde(rename = "every_15")]
    Every15,
}

impl AlertMode {
    pub const ALL: [AlertMode; 4] = [
        AlertMode::Off,
        AlertMode::Every5,
        AlertMode::Every10,
        AlertMode::Every15,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::Every5 => 5,
            Self::Every10 => 10,
            Self::Every15 => 15,
        }
    }

    /// The next mode in the cycle, wrapping from `Every15` back to `Off`.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Every5,
            Self::Every5 => Self::Every10,
            Self::Every10 => Self::Every15,
            Self::Every15 => Self::Off,
        }
    }
}

impl fmt::Display for AlertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            mode => write!(f, "every_{}", mode.minutes()),
        }
    }
}

impl FromStr for AlertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "every_5" | "5" => Ok(Self::Every5),
            "every_10" | "10" => Ok(Self::Every10),
            "every_15" | "15" => Ok(Self::Every15),
            other => Err(format!(
                "unknown alert mode '{other}' (expected off, every_5, every_10 or every_15)"
            )),
        }
    }
}

/// What the policy chose for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Chime(Bell),
    Repeat,
    None,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chime(bell) => write!(f, "chime {bell}"),
            Self::Repeat => write!(f, "repeat alert"),
            Self::None => write!(f, "nothing"),
        }
    }
}

/// Pure decision rule, evaluated in order: chime, repeat, nothing.
pub fn decide(day: DaySeconds, chime_enabled: bool, mode: AlertMode) -> Selection {
    if chime_enabled && day.is_half_hour() {
        Selection::Chime(bells_at(day))
    } else if mode != AlertMode::Off && day.is_multiple_of(mode.minutes() * 60) {
        Selection::Repeat
    } else {
        Selection::None
    }
}

/// Every minute of the day on which something would sound.
pub fn day_schedule(chime_enabled: bool, mode: AlertMode) -> Vec<(DaySeconds, Selection)> {
    (0..24 * 60)
        .map(|minute| DaySeconds::wrapping(i64::from(minute) * 60))
        .map(|day| (day, decide(day, chime_enabled, mode)))
        .filter(|(_, selection)| *selection != Selection::None)
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct PolicyState {
    chime_enabled: bool,
    mode: AlertMode,
}

/// Shared chime/alert settings. Read once per tick, written on user action.
#[derive(Debug)]
pub struct AlertPolicy {
    state: Mutex<PolicyState>,
}

impl AlertPolicy {
    pub fn new(chime_enabled: bool, mode: AlertMode) -> Self {
        Self {
            state: Mutex::new(PolicyState {
                chime_enabled,
                mode,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PolicyState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn chime_enabled(&self) -> bool {
        self.with_state(|s| s.chime_enabled)
    }

    pub fn set_chime_enabled(&self, enabled: bool) {
        self.with_state(|s| s.chime_enabled = enabled);
    }

    pub fn mode(&self) -> AlertMode {
        self.with_state(|s| s.mode)
    }

    pub fn set_mode(&self, mode: AlertMode) {
        self.with_state(|s| s.mode = mode);
    }

    /// Advance to the next alert mode and return it.
    pub fn cycle_mode(&self) -> AlertMode {
        self.with_state(|s| {
            s.mode = s.mode.next();
            s.mode
        })
    }

    /// Flip the chime setting and return the new value.
    pub fn toggle_chimes(&self) -> bool {
        self.with_state(|s| {
            s.chime_enabled = !s.chime_enabled;
            s.chime_enabled
        })
    }

    /// Decide against a consistent snapshot of both settings.
    pub fn decide(&self, day: DaySeconds) -> Selection {
        let PolicyState {
            chime_enabled,
            mode,
        } = self.with_state(|s| *s);
        decide(day, chime_enabled, mode)
    }
}
