//! Audit of a schedule for hard-constraint violations.
//!
//! Nothing here assumes the schedule came from the solver; hand-edited or
//! externally supplied entries are checked the same way.

use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::data::{ScheduleEntry, SubjectType};
use crate::store::{Resource, ScheduleStore};
use crate::timeslots::SlotKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    FacultyDoubleBooked,
    ClassroomDoubleBooked,
    BatchDoubleBooked,
    InsufficientCapacity,
    RoomNotLabCapable,
    DailyHoursExceeded,
    FacultyUnavailable,
    UnknownReference,
}

impl From<Resource> for ViolationKind {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Faculty => ViolationKind::FacultyDoubleBooked,
            Resource::Classroom => ViolationKind::ClassroomDoubleBooked,
            Resource::Batch => ViolationKind::BatchDoubleBooked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub resource_id: String,
    pub key: Option<SlotKey>,
    pub entry_ids: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
        }
    }
}

fn double_bookings(store: &ScheduleStore) -> Vec<Violation> {
    let mut violations = Vec::new();
    for resource in Resource::ALL {
        let label = match resource {
            Resource::Faculty => "Faculty",
            Resource::Classroom => "Classroom",
            Resource::Batch => "Batch",
        };
        for overlap in store.overlaps(resource) {
            violations.push(Violation {
                kind: resource.into(),
                resource_id: overlap.resource_id.to_string(),
                key: Some(overlap.key),
                entry_ids: overlap.entries.iter().map(|e| e.id.clone()).collect(),
                message: format!(
                    "{} conflict: {} at {} ({} entries)",
                    label,
                    overlap.resource_id,
                    overlap.key,
                    overlap.entries.len()
                ),
            });
        }
    }
    violations
}

/// Flags every faculty, classroom and batch double booking.
pub fn validate(store: &ScheduleStore) -> ValidationReport {
    ValidationReport::from_violations(double_bookings(store))
}

fn single(kind: ViolationKind, resource_id: &str, entry: &ScheduleEntry, message: String) -> Violation {
    Violation {
        kind,
        resource_id: resource_id.to_string(),
        key: Some(entry.key()),
        entry_ids: vec![entry.id.clone()],
        message,
    }
}

/// [`validate`] plus the catalog-dependent constraints: capacity, lab
/// rooms, available days, daily hour limits and dangling references.
pub fn audit(store: &ScheduleStore, catalog: &Catalog) -> ValidationReport {
    let mut violations = double_bookings(store);

    for entry in store.entries() {
        let batch = catalog.batch(&entry.batch_id);
        let subject = catalog.subject(&entry.subject_id);
        let faculty = catalog.faculty_member(&entry.faculty_id);
        let classroom = catalog.classroom(&entry.classroom_id);

        let missing: Vec<&str> = [
            (batch.is_none(), entry.batch_id.as_str()),
            (subject.is_none(), entry.subject_id.as_str()),
            (faculty.is_none(), entry.faculty_id.as_str()),
            (classroom.is_none(), entry.classroom_id.as_str()),
        ]
        .into_iter()
        .filter_map(|(absent, id)| absent.then_some(id))
        .collect();
        for id in missing {
            violations.push(single(
                ViolationKind::UnknownReference,
                id,
                entry,
                format!("Entry {} references unknown id {}", entry.id, id),
            ));
        }

        if let (Some(batch), Some(classroom)) = (batch, classroom) {
            if classroom.capacity < batch.student_count {
                violations.push(single(
                    ViolationKind::InsufficientCapacity,
                    &classroom.id,
                    entry,
                    format!(
                        "{} seats {} but batch {} has {} students",
                        catalog.classroom_label(&classroom.id),
                        classroom.capacity,
                        catalog.batch_label(&batch.id),
                        batch.student_count
                    ),
                ));
            }
        }
        if let (Some(subject), Some(classroom)) = (subject, classroom) {
            if subject.kind == SubjectType::Lab && !classroom.is_lab_capable() {
                violations.push(single(
                    ViolationKind::RoomNotLabCapable,
                    &classroom.id,
                    entry,
                    format!(
                        "Lab subject {} is held in non-lab room {}",
                        subject.name,
                        catalog.classroom_label(&classroom.id)
                    ),
                ));
            }
        }
        if let Some(faculty) = faculty {
            if !faculty.available_days.contains(&entry.time_slot.day) {
                violations.push(single(
                    ViolationKind::FacultyUnavailable,
                    &faculty.id,
                    entry,
                    format!(
                        "{} is not available on {}",
                        catalog.faculty_label(&faculty.id),
                        entry.time_slot.day
                    ),
                ));
            }
        }
    }

    // daily limits are per (faculty, day), reported once each
    let mut seen = HashSet::new();
    for entry in store.entries() {
        let day = entry.time_slot.day;
        if !seen.insert((entry.faculty_id.as_str(), day)) {
            continue;
        }
        let Some(faculty) = catalog.faculty_member(&entry.faculty_id) else {
            continue;
        };
        let minutes = store.faculty_minutes(&faculty.id, day);
        if minutes > faculty.max_daily_minutes() {
            violations.push(Violation {
                kind: ViolationKind::DailyHoursExceeded,
                resource_id: faculty.id.clone(),
                key: None,
                entry_ids: store
                    .entries()
                    .iter()
                    .filter(|e| e.faculty_id == faculty.id && e.time_slot.day == day)
                    .map(|e| e.id.clone())
                    .collect(),
                message: format!(
                    "{} teaches {:.1} hours on {}, limit is {}",
                    catalog.faculty_label(&faculty.id),
                    f64::from(minutes) / 60.0,
                    day,
                    faculty.max_daily_hours
                ),
            });
        }
    }

    ValidationReport::from_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        Batch, Classroom, Day, FacultyMember, FacultyStatus, RoomStatus, RoomType, SessionType,
        Subject, TimeSlot,
    };
    use crate::timeslots::TimeOfDay;

    fn entry(id: &str, batch: &str, faculty: &str, room: &str, day: Day, hour: u16) -> ScheduleEntry {
        ScheduleEntry {
            id: id.to_string(),
            batch_id: batch.to_string(),
            subject_id: "s1".to_string(),
            faculty_id: faculty.to_string(),
            classroom_id: room.to_string(),
            time_slot: TimeSlot {
                day,
                start_time: TimeOfDay::from_minutes(hour * 60),
                end_time: TimeOfDay::from_minutes((hour + 1) * 60),
                duration_minutes: 60,
            },
            session_type: SessionType::Lecture,
            fixed: false,
        }
    }

    #[test]
    fn test_clean_schedule_is_valid() {
        let store = ScheduleStore::from_entries(vec![
            entry("e1", "b1", "f1", "r1", Day::Monday, 9),
            entry("e2", "b1", "f1", "r1", Day::Monday, 10),
            entry("e3", "b2", "f2", "r2", Day::Monday, 9),
        ]);
        let report = validate(&store);
        assert!(report.is_valid);
        assert!(report.violations.is_empty());
        assert!(validate(&ScheduleStore::new()).is_valid);
    }

    #[test]
    fn test_each_dimension_is_flagged_once_per_group() {
        let store = ScheduleStore::from_entries(vec![
            entry("e1", "b1", "f1", "r1", Day::Monday, 9),
            entry("e2", "b2", "f1", "r2", Day::Monday, 9),
            entry("e3", "b3", "f1", "r3", Day::Monday, 9),
            entry("e4", "b4", "f4", "r1", Day::Tuesday, 9),
            entry("e5", "b4", "f5", "r1", Day::Tuesday, 9),
        ]);
        let report = validate(&store);
        assert!(!report.is_valid);

        let kinds: Vec<ViolationKind> = report.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::FacultyDoubleBooked,
                ViolationKind::ClassroomDoubleBooked,
                ViolationKind::BatchDoubleBooked,
            ]
        );
        assert_eq!(report.violations[0].entry_ids, vec!["e1", "e2", "e3"]);
        assert_eq!(report.violations[1].entry_ids, vec!["e4", "e5"]);
        assert_eq!(
            report.violations[0].message,
            "Faculty conflict: f1 at Monday-09:00 (3 entries)"
        );
    }

    #[test]
    fn test_audit_checks_catalog_constraints() {
        let catalog = Catalog::new(
            vec![Batch {
                id: "b1".to_string(),
                name: "CS-1".to_string(),
                department: "CS".to_string(),
                semester: 1,
                student_count: 50,
            }],
            vec![Subject {
                id: "s1".to_string(),
                name: "Physics Lab".to_string(),
                department: "CS".to_string(),
                semester: 1,
                lecture_hours: 0,
                lab_hours: 2,
                kind: SubjectType::Lab,
            }],
            vec![FacultyMember {
                id: "f1".to_string(),
                name: "Dr. Iyer".to_string(),
                subjects_taught: ["Physics Lab".to_string()].into_iter().collect(),
                available_days: [Day::Monday].into_iter().collect(),
                max_daily_hours: 1,
                status: FacultyStatus::Active,
            }],
            vec![Classroom {
                id: "r1".to_string(),
                name: "Hall A".to_string(),
                capacity: 40,
                kind: RoomType::LectureHall,
                status: RoomStatus::Available,
            }],
        )
        .unwrap();
        let store = ScheduleStore::from_entries(vec![
            entry("e1", "b1", "f1", "r1", Day::Monday, 9),
            entry("e2", "b1", "f1", "r1", Day::Monday, 10),
            entry("e3", "b1", "f1", "r9", Day::Friday, 9),
        ]);

        let report = audit(&store, &catalog);
        assert!(!report.is_valid);
        // plain double-booking validation finds nothing here
        assert!(validate(&store).is_valid);

        let count = |kind: ViolationKind| report.violations.iter().filter(|v| v.kind == kind).count();
        assert_eq!(count(ViolationKind::InsufficientCapacity), 2);
        assert_eq!(count(ViolationKind::RoomNotLabCapable), 2);
        assert_eq!(count(ViolationKind::FacultyUnavailable), 1);
        assert_eq!(count(ViolationKind::UnknownReference), 1);
        assert_eq!(count(ViolationKind::DailyHoursExceeded), 1);

        let daily = report
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::DailyHoursExceeded)
            .unwrap();
        assert_eq!(daily.entry_ids, vec!["e1", "e2"]);
        assert_eq!(daily.message, "Dr. Iyer teaches 2.0 hours on Monday, limit is 1");
    }
}
