use timetable_engine::advisor::{OptimizationAdvisor, SuggestionCategory};
use timetable_engine::catalog::Catalog;
use timetable_engine::config::AnalysisSettings;
use timetable_engine::conflicts::{ConflictAnalyzer, ConflictType, Severity};
use timetable_engine::data::{
    Batch, Classroom, Day, FacultyMember, FacultyStatus, GenerationConfig, RoomStatus, RoomType,
    ScheduleEntry, Subject, SubjectType,
};
use timetable_engine::timeslots::TimeOfDay;
use timetable_engine::validator::{audit, validate};
use timetable_engine::{GenerationOutcome, ScheduleStore, generate, generate_time_slots};

const WEEK: [Day; 5] = [Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday];

fn batch(id: &str, semester: u32, students: u32) -> Batch {
    Batch {
        id: id.to_string(),
        name: format!("CS {}", id),
        department: "CS".to_string(),
        semester,
        student_count: students,
    }
}

fn subject(id: &str, name: &str, semester: u32, lecture: u32, lab: u32, kind: SubjectType) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        department: "CS".to_string(),
        semester,
        lecture_hours: lecture,
        lab_hours: lab,
        kind,
    }
}

fn member(id: &str, teaches: &[&str], days: &[Day], max_daily_hours: u32) -> FacultyMember {
    FacultyMember {
        id: id.to_string(),
        name: format!("Prof. {}", id),
        subjects_taught: teaches.iter().map(|s| s.to_string()).collect(),
        available_days: days.iter().copied().collect(),
        max_daily_hours,
        status: FacultyStatus::Active,
    }
}

fn room(id: &str, capacity: u32, kind: RoomType) -> Classroom {
    Classroom {
        id: id.to_string(),
        name: format!("Room {}", id),
        capacity,
        kind,
        status: RoomStatus::Available,
    }
}

fn config(start: &str, end: &str, days: &[Day]) -> GenerationConfig {
    GenerationConfig {
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
        slot_duration_minutes: 60,
        break_duration_minutes: 0,
        working_days: days.to_vec(),
    }
}

/// A department-sized run with contention on faculty, rooms and lab space.
fn department(progress: &mut Vec<u8>) -> GenerationOutcome {
    generate(
        vec![batch("1A", 1, 45), batch("1B", 1, 30), batch("3A", 3, 60)],
        vec![
            subject("prog", "Programming", 1, 4, 0, SubjectType::Core),
            subject("prog-lab", "Programming Lab", 1, 0, 2, SubjectType::Lab),
            subject("math", "Discrete Math", 1, 3, 0, SubjectType::Core),
            subject("os", "Operating Systems", 3, 4, 0, SubjectType::Core),
            subject("ml", "Machine Learning", 3, 2, 0, SubjectType::Elective),
        ],
        vec![
            member("f1", &["Programming", "Programming Lab"], &WEEK, 4),
            member("f2", &["Discrete Math", "Machine Learning"], &WEEK[..3], 3),
            member("f3", &["Operating Systems", "Programming"], &WEEK, 2),
        ],
        vec![
            room("r40", 40, RoomType::Classroom),
            room("r60", 60, RoomType::LectureHall),
            room("lab", 45, RoomType::Lab),
        ],
        &config("09:00", "13:00", &WEEK),
        &mut |p: u8| progress.push(p),
    )
    .unwrap()
}

#[test]
fn test_generated_schedule_has_no_conflicts() {
    let outcome = department(&mut Vec::new());
    assert!(!outcome.store.is_empty());
    assert!(validate(&outcome.store).is_valid);
}

#[test]
fn test_generated_schedule_passes_catalog_audit() {
    let outcome = department(&mut Vec::new());
    let catalog = Catalog::new(
        vec![batch("1A", 1, 45), batch("1B", 1, 30), batch("3A", 3, 60)],
        vec![
            subject("prog", "Programming", 1, 4, 0, SubjectType::Core),
            subject("prog-lab", "Programming Lab", 1, 0, 2, SubjectType::Lab),
            subject("math", "Discrete Math", 1, 3, 0, SubjectType::Core),
            subject("os", "Operating Systems", 3, 4, 0, SubjectType::Core),
            subject("ml", "Machine Learning", 3, 2, 0, SubjectType::Elective),
        ],
        vec![
            member("f1", &["Programming", "Programming Lab"], &WEEK, 4),
            member("f2", &["Discrete Math", "Machine Learning"], &WEEK[..3], 3),
            member("f3", &["Operating Systems", "Programming"], &WEEK, 2),
        ],
        vec![
            room("r40", 40, RoomType::Classroom),
            room("r60", 60, RoomType::LectureHall),
            room("lab", 45, RoomType::Lab),
        ],
    )
    .unwrap();

    let report = audit(&outcome.store, &catalog);
    assert!(report.is_valid, "{:?}", report.violations);
    for entry in outcome.store.entries() {
        let classroom = catalog.classroom(&entry.classroom_id).unwrap();
        let batch = catalog.batch(&entry.batch_id).unwrap();
        assert!(classroom.capacity >= batch.student_count);
    }
}

#[test]
fn test_identical_inputs_give_identical_schedules() {
    let first = department(&mut Vec::new());
    let second = department(&mut Vec::new());
    assert_eq!(first.store.entries(), second.store.entries());
    assert_eq!(first.unsatisfied, second.unsatisfied);
    assert_eq!(first.unsatisfied_count(), second.unsatisfied_count());
}

#[test]
fn test_progress_is_non_decreasing_and_finishes() {
    let mut progress = Vec::new();
    department(&mut progress);
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));
}

#[test]
fn test_injected_double_booking_is_one_faculty_conflict() {
    let mut store = department(&mut Vec::new()).store;
    let mut clash: ScheduleEntry = store.entries()[0].clone();
    clash.id = "injected".to_string();
    clash.batch_id = "ghost-batch".to_string();
    clash.classroom_id = "ghost-room".to_string();
    let original = store.entries()[0].id.clone();
    store.insert_unchecked(clash);

    let conflicts = ConflictAnalyzer::new(&Catalog::default()).analyze(&store);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictType::Faculty);
    assert_eq!(conflicts[0].severity, Severity::High);
    assert_eq!(conflicts[0].affected_entry_ids, vec![original, "injected".to_string()]);
}

#[test]
fn test_two_hour_window_yields_two_slots() {
    let slots = generate_time_slots(&config("09:00", "11:00", &[Day::Monday])).unwrap();
    let rendered: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    assert_eq!(rendered.len(), 2);
    assert_eq!(slots[0].start_time, TimeOfDay::from_minutes(9 * 60));
    assert_eq!(slots[0].end_time, TimeOfDay::from_minutes(10 * 60));
    assert_eq!(slots[1].start_time, TimeOfDay::from_minutes(10 * 60));
    assert_eq!(slots[1].end_time, TimeOfDay::from_minutes(11 * 60));
    assert!(slots.iter().all(|s| s.day == Day::Monday && s.duration_minutes == 60));
}

fn single_session(available_days: &[Day]) -> GenerationOutcome {
    generate(
        vec![batch("b1", 1, 30)],
        vec![subject("s1", "Programming", 1, 1, 0, SubjectType::Core)],
        vec![member("f1", &["Programming"], available_days, 4)],
        vec![room("r1", 30, RoomType::Classroom)],
        &config("09:00", "17:00", &WEEK),
        &mut |_: u8| {},
    )
    .unwrap()
}

#[test]
fn test_single_requirement_is_scheduled_once() {
    let outcome = single_session(&[Day::Monday]);
    assert_eq!(outcome.store.len(), 1);
    assert_eq!(outcome.unsatisfied_count(), 0);
    assert_eq!(outcome.store.entries()[0].id, "b1-s1-Monday-09:00");
}

#[test]
fn test_faculty_unavailable_on_every_working_day() {
    let outcome = single_session(&[Day::Saturday, Day::Sunday]);
    assert!(outcome.store.is_empty());
    assert_eq!(outcome.unsatisfied_count(), 1);
}

#[test]
fn test_workload_spread_triggers_balancing_suggestion() {
    let faculty = vec![
        member("f1", &[], &WEEK, 8),
        member("f2", &[], &WEEK, 8),
        member("f3", &[], &WEEK, 8),
    ];
    let catalog = Catalog::new(vec![], vec![], faculty, vec![]).unwrap();
    let slots = generate_time_slots(&config("08:00", "11:00", &WEEK)).unwrap();

    let mut entries = Vec::new();
    for (faculty_id, hours) in [("f1", 4), ("f2", 5), ("f3", 15)] {
        for slot in slots.iter().take(hours) {
            entries.push(ScheduleEntry {
                id: ScheduleEntry::entry_id(faculty_id, "s1", slot),
                batch_id: faculty_id.to_string(),
                subject_id: "s1".to_string(),
                faculty_id: faculty_id.to_string(),
                classroom_id: format!("room-{}", faculty_id),
                time_slot: slot.clone(),
                session_type: timetable_engine::data::SessionType::Lecture,
                fixed: false,
            });
        }
    }
    let store = ScheduleStore::from_entries(entries);

    let settings = AnalysisSettings::for_slots(&slots);
    let suggestions = OptimizationAdvisor::new(&catalog, &settings).suggest(&store);
    assert!(suggestions.iter().any(|s| s.category == SuggestionCategory::Workload));
}
