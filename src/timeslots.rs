//! Bookable time slots derived from a [`GenerationConfig`].
//!
//! Slots are ordered day-major (in the configured working-day order) and
//! start-time ascending within a day. The solver searches in exactly this
//! order, so the ordering is part of the determinism contract.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::data::{Day, GenerationConfig, TimeSlot};
use crate::error::ConfigError;

/// Minutes since midnight, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const fn from_minutes(minutes: u16) -> Self {
        Self(minutes)
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    fn offset(self, minutes: u32) -> Self {
        Self((self.minutes() + minutes) as u16)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse::<u16>().map_err(|_| invalid())?;
        let minute = minute.parse::<u16>().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// The `(day, startTime)` pair every occupancy check keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct SlotKey {
    pub day: Day,
    pub start: TimeOfDay,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.start)
    }
}

impl GenerationConfig {
    /// Checks the time window without generating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_time >= self.end_time {
            return Err(ConfigError::EmptyWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.slot_duration_minutes == 0 {
            return Err(ConfigError::NonPositiveSlotDuration);
        }
        if self.working_days.is_empty() {
            return Err(ConfigError::NoWorkingDays);
        }
        if self.start_time.minutes().saturating_add(self.slot_duration_minutes) > self.end_time.minutes() {
            return Err(ConfigError::NoSlots {
                start: self.start_time,
                end: self.end_time,
                slot_minutes: self.slot_duration_minutes,
            });
        }
        Ok(())
    }
}

/// Generates the ordered slot list for a configuration.
///
/// Slots on a day start at `startTime` and are spaced by
/// `slotDuration + breakDuration`; a slot that would end after `endTime`
/// is dropped. Repeated working days are only expanded once.
pub fn generate_time_slots(config: &GenerationConfig) -> Result<Vec<TimeSlot>, ConfigError> {
    config.validate()?;

    let start = config.start_time.minutes();
    let end = config.end_time.minutes();
    let slot = config.slot_duration_minutes;
    let step = slot.saturating_add(config.break_duration_minutes);

    let mut seen = HashSet::new();
    let mut slots = Vec::new();
    for day in config.working_days.iter().copied().filter(|d| seen.insert(*d)) {
        let mut current = start;
        while current + slot <= end {
            let start_time = TimeOfDay::from_minutes(current as u16);
            slots.push(TimeSlot {
                day,
                start_time,
                end_time: start_time.offset(slot),
                duration_minutes: slot,
            });
            current = current.saturating_add(step);
        }
    }
    debug!(
        "Generated {} time slots over {} working days",
        slots.len(),
        seen.len()
    );
    Ok(slots)
}

/// Number of slots on each working day; equal for every day of a config.
pub fn slots_per_day(slots: &[TimeSlot]) -> usize {
    match slots.first() {
        Some(first) => slots.iter().filter(|s| s.day == first.day).count(),
        None => 0,
    }
}

/// Memoizes generated slot lists for the most recently used configurations.
#[derive(Debug)]
pub struct SlotCache {
    capacity: usize,
    slots: Mutex<IndexMap<GenerationConfig, Arc<[TimeSlot]>>>,
}

impl Default for SlotCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl SlotCache {
    pub const DEFAULT_CAPACITY: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` configurations (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: Mutex::new(IndexMap::new()),
        }
    }

    /// Returns the cached slots for `config`, generating them on a miss and
    /// evicting the least recently used configuration when full.
    pub fn get_or_generate(&self, config: &GenerationConfig) -> Result<Arc<[TimeSlot]>, ConfigError> {
        let mut cache = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slots) = cache.shift_remove(config) {
            cache.insert(config.clone(), Arc::clone(&slots));
            return Ok(slots);
        }
        let slots: Arc<[TimeSlot]> = generate_time_slots(config)?.into();
        if cache.len() >= self.capacity {
            cache.shift_remove_index(0);
        }
        cache.insert(config.clone(), Arc::clone(&slots));
        Ok(slots)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
