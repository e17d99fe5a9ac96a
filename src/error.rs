//! Error types for the timetable engine.
//!
//! Only malformed input is an error. A session the solver cannot place is
//! reported as data on the generation outcome, and constraint violations
//! found by the validator or the conflict analyzer are returned as reports.

use thiserror::Error;

use crate::placement::Rule;
use crate::timeslots::TimeOfDay;

/// Top-level error for the engine boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Ingest(#[from] IngestError),

    #[error("Placement rejected: {0}")]
    Placement(#[from] PlacementError),
}

/// Malformed day/time configuration. Raised before any slot is generated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("start time {start} must be before end time {end}")]
    EmptyWindow { start: TimeOfDay, end: TimeOfDay },

    #[error("slot duration must be positive")]
    NonPositiveSlotDuration,

    #[error("no working days configured")]
    NoWorkingDays,

    #[error("a {slot_minutes} minute slot does not fit between {start} and {end}")]
    NoSlots {
        start: TimeOfDay,
        end: TimeOfDay,
        slot_minutes: u32,
    },
}

/// Entity lists rejected at the ingestion boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("duplicate {entity} id '{id}'")]
    DuplicateId { entity: &'static str, id: String },

    #[error("{entity} with an empty id")]
    EmptyId { entity: &'static str },

    #[error("unknown batch '{0}' requested for generation")]
    UnknownBatch(String),
}

/// A manual placement or reschedule that cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no schedule entry with id '{0}'")]
    UnknownEntry(String),

    #[error("unknown {entity} '{id}'")]
    UnknownEntity { entity: &'static str, id: String },

    #[error("{day} {start} is not a configured time slot")]
    UnknownSlot { day: crate::data::Day, start: TimeOfDay },

    #[error("entry '{0}' is fixed and cannot be moved")]
    FixedEntry(String),

    #[error("schedule changed since version {expected} (now {actual})")]
    StaleVersion { expected: u64, actual: u64 },

    #[error(transparent)]
    Rejected(#[from] Rule),
}
