//! Hard constraints a single placement must satisfy against the store.

use serde::Serialize;
use thiserror::Error;

use crate::data::{Batch, Classroom, FacultyMember, ScheduleEntry, Subject, SubjectType, TimeSlot};
use crate::store::ScheduleStore;

/// The hard constraint a rejected placement broke.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    #[error("faculty member is not active")]
    FacultyInactive,
    #[error("faculty member does not teach this subject")]
    FacultyNotQualified,
    #[error("faculty member is not available on this day")]
    FacultyUnavailable,
    #[error("faculty member already teaches at this time")]
    FacultyBusy,
    #[error("classroom is already booked at this time")]
    ClassroomBusy,
    #[error("batch already has a class at this time")]
    BatchBusy,
    #[error("classroom capacity is below the batch size")]
    InsufficientCapacity,
    #[error("lab sessions need a lab classroom")]
    RoomNotLabCapable,
    #[error("faculty member would exceed the daily teaching limit")]
    DailyHoursExceeded,
}

/// One (slot, faculty, classroom) choice for a batch's subject session.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub batch: &'a Batch,
    pub subject: &'a Subject,
    pub faculty: &'a FacultyMember,
    pub classroom: &'a Classroom,
    pub slot: &'a TimeSlot,
}

impl Candidate<'_> {
    /// Checks the candidate against the store as currently populated.
    pub fn check(&self, store: &ScheduleStore) -> Result<(), Rule> {
        let key = self.slot.key();
        let faculty_id = self.faculty.id.as_str();

        if !self.faculty.is_active() {
            return Err(Rule::FacultyInactive);
        }
        if !self.faculty.teaches(self.subject) {
            return Err(Rule::FacultyNotQualified);
        }
        if !self.faculty.available_days.contains(&self.slot.day) {
            return Err(Rule::FacultyUnavailable);
        }
        if store.is_faculty_booked(faculty_id, key) {
            return Err(Rule::FacultyBusy);
        }
        if store.is_classroom_booked(&self.classroom.id, key) {
            return Err(Rule::ClassroomBusy);
        }
        if store.is_batch_booked(&self.batch.id, key) {
            return Err(Rule::BatchBusy);
        }
        if self.classroom.capacity < self.batch.student_count {
            return Err(Rule::InsufficientCapacity);
        }
        if self.subject.kind == SubjectType::Lab && !self.classroom.is_lab_capable() {
            return Err(Rule::RoomNotLabCapable);
        }
        let booked = store.faculty_minutes(faculty_id, self.slot.day);
        if booked.saturating_add(self.slot.duration_minutes) > self.faculty.max_daily_minutes() {
            return Err(Rule::DailyHoursExceeded);
        }
        Ok(())
    }

    pub fn to_entry(&self) -> ScheduleEntry {
        ScheduleEntry {
            id: ScheduleEntry::entry_id(&self.batch.id, &self.subject.id, self.slot),
            batch_id: self.batch.id.clone(),
            subject_id: self.subject.id.clone(),
            faculty_id: self.faculty.id.clone(),
            classroom_id: self.classroom.id.clone(),
            time_slot: self.slot.clone(),
            session_type: self.subject.session_type(),
            fixed: false,
        }
    }
}
