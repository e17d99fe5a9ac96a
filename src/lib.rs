//! Timetable generation and analysis.
//!
//! [`solver`] assigns every required teaching session of a set of batches
//! to a `(slot, faculty, classroom)` triple with a greedy first-fit search.
//! The remaining modules audit and analyze whatever schedule they are given,
//! whether it came from the solver or from manual edits.

pub mod advisor;
pub mod catalog;
pub mod config;
pub mod conflicts;
pub mod data;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod placement;
pub mod server;
pub mod solver;
pub mod store;
pub mod timeslots;
pub mod validator;

pub use catalog::Catalog;
pub use error::{ConfigError, EngineError, IngestError, PlacementError};
pub use solver::{ConstraintSolver, GenerationOutcome, GenerationTask, generate};
pub use store::{ScheduleStore, SharedSchedule};
pub use timeslots::generate_time_slots;
