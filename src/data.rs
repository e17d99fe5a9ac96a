use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::timeslots::{SlotKey, TimeOfDay};

// Type aliases for clarity
pub type BatchId = String;
pub type SubjectId = String;
pub type FacultyId = String;
pub type ClassroomId = String;
pub type EntryId = String;

/// A teaching day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A bookable interval on one working day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day: Day,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            start: self.start_time,
        }
    }

    pub fn hours(&self) -> f64 {
        f64::from(self.duration_minutes) / 60.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start_time, self.end_time)
    }
}

/// A cohort of students that attends every session together.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    #[serde(default)]
    pub name: String,
    pub department: String,
    pub semester: u32,
    pub student_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Core,
    Elective,
    Lab,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub department: String,
    pub semester: u32,
    pub lecture_hours: u32,
    pub lab_hours: u32,
    #[serde(rename = "type")]
    pub kind: SubjectType,
}

impl Subject {
    /// Number of slots needed to cover the weekly hours, rounded up.
    pub fn sessions_needed(&self, slot_duration_minutes: u32) -> u32 {
        if slot_duration_minutes == 0 {
            return 0;
        }
        let minutes = self
            .lecture_hours
            .saturating_add(self.lab_hours)
            .saturating_mul(60);
        minutes.div_ceil(slot_duration_minutes)
    }

    pub fn session_type(&self) -> SessionType {
        match self.kind {
            SubjectType::Lab => SessionType::Lab,
            SubjectType::Core | SubjectType::Elective => SessionType::Lecture,
        }
    }

    pub fn is_offered_to(&self, batch: &Batch) -> bool {
        self.department == batch.department && self.semester == batch.semester
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FacultyStatus {
    Active,
    OnLeave,
    Inactive,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyMember {
    pub id: FacultyId,
    #[serde(default)]
    pub name: String,
    /// Subject names this member can teach.
    pub subjects_taught: HashSet<String>,
    pub available_days: HashSet<Day>,
    pub max_daily_hours: u32,
    pub status: FacultyStatus,
}

impl FacultyMember {
    pub fn is_active(&self) -> bool {
        self.status == FacultyStatus::Active
    }

    pub fn teaches(&self, subject: &Subject) -> bool {
        self.subjects_taught.contains(&subject.name)
    }

    pub fn max_daily_minutes(&self) -> u32 {
        self.max_daily_hours.saturating_mul(60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomType {
    LectureHall,
    Lab,
    Classroom,
    Seminar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: ClassroomId,
    #[serde(default)]
    pub name: String,
    pub capacity: u32,
    #[serde(rename = "type")]
    pub kind: RoomType,
    #[serde(default)]
    pub status: RoomStatus,
}

impl Classroom {
    pub fn is_lab_capable(&self) -> bool {
        self.kind == RoomType::Lab
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Lecture,
    Lab,
    Tutorial,
}

/// Represents a single, scheduled teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub batch_id: BatchId,
    pub subject_id: SubjectId,
    pub faculty_id: FacultyId,
    pub classroom_id: ClassroomId,
    pub time_slot: TimeSlot,
    pub session_type: SessionType,
    #[serde(default, alias = "isFixed")]
    pub fixed: bool,
}

impl ScheduleEntry {
    pub fn entry_id(batch_id: &str, subject_id: &str, slot: &TimeSlot) -> EntryId {
        format!("{}-{}-{}-{}", batch_id, subject_id, slot.day, slot.start_time)
    }

    pub fn key(&self) -> SlotKey {
        self.time_slot.key()
    }
}

/// Day and time window the timetable is generated over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub break_duration_minutes: u32,
    pub working_days: Vec<Day>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            start_time: TimeOfDay::from_minutes(9 * 60),
            end_time: TimeOfDay::from_minutes(17 * 60),
            slot_duration_minutes: 60,
            break_duration_minutes: 0,
            working_days: vec![
                Day::Monday,
                Day::Tuesday,
                Day::Wednesday,
                Day::Thursday,
                Day::Friday,
            ],
        }
    }
}

/// The complete input for one generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInput {
    pub batches: Vec<Batch>,
    pub subjects: Vec<Subject>,
    pub faculty: Vec<FacultyMember>,
    pub classrooms: Vec<Classroom>,
    pub config: GenerationConfig,
    /// Restricts the run to these batches; all batches when absent.
    #[serde(default)]
    pub batch_ids: Option<Vec<BatchId>>,
}
