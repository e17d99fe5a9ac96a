//! Heuristic optimization suggestions and the aggregate optimization score.
//!
//! Every analysis here is a read over a finished schedule. Suggestions carry
//! fixed impact estimates per category and name the manual steps that would
//! carry them out; nothing is applied.

use itertools::{Itertools, MinMaxResult};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::config::AnalysisSettings;
use crate::metrics::{faculty_hours, mean, population_variance};
use crate::store::{Resource, ScheduleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Utilization,
    Workload,
    Efficiency,
    Preference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Complex,
}

/// Estimated improvement, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub utilization_improvement: u32,
    pub conflict_reduction: u32,
    pub workload_balance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub required_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSuggestion {
    pub category: SuggestionCategory,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub implementation: Implementation,
}

impl OptimizationSuggestion {
    fn new(category: SuggestionCategory, title: String, description: String) -> Self {
        let (impact, difficulty, time, actions) = match category {
            SuggestionCategory::Utilization => (
                (25, 5, 0),
                Difficulty::Easy,
                "15 minutes",
                ["Identify suitable classes", "Move classes to this room", "Update timetable"],
            ),
            SuggestionCategory::Workload => (
                (10, 15, 40),
                Difficulty::Medium,
                "30 minutes",
                ["Identify overloaded faculty", "Find suitable redistributions", "Update assignments"],
            ),
            SuggestionCategory::Efficiency | SuggestionCategory::Preference => (
                (15, 20, 5),
                Difficulty::Easy,
                "10 minutes",
                ["Identify moveable classes", "Reschedule to this slot", "Verify no conflicts"],
            ),
        };
        Self {
            category,
            title,
            description,
            impact: Impact {
                utilization_improvement: impact.0,
                conflict_reduction: impact.1,
                workload_balance: impact.2,
            },
            implementation: Implementation {
                difficulty,
                estimated_time: time.to_string(),
                required_actions: actions.iter().map(|a| a.to_string()).collect(),
            },
        }
    }
}

/// Component scores in `0..=100` and their rounded mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationScore {
    pub utilization: f64,
    pub workload: f64,
    pub conflict: f64,
    pub overall: u32,
}

pub struct OptimizationAdvisor<'a> {
    catalog: &'a Catalog,
    settings: &'a AnalysisSettings,
}

impl<'a> OptimizationAdvisor<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a AnalysisSettings) -> Self {
        Self { catalog, settings }
    }

    /// Utilization, then workload, then time-slot suggestions.
    pub fn suggest(&self, store: &ScheduleStore) -> Vec<OptimizationSuggestion> {
        let mut suggestions = self.utilization(store);
        suggestions.extend(self.workload(store));
        suggestions.extend(self.efficiency(store));
        debug!("Generated {} optimization suggestions", suggestions.len());
        suggestions
    }

    /// One suggestion per classroom booked for less than the configured
    /// share of its weekly capacity.
    pub fn utilization(&self, store: &ScheduleStore) -> Vec<OptimizationSuggestion> {
        let capacity = self.settings.weekly_capacity_slots;
        if capacity == 0 {
            return Vec::new();
        }
        let mut booked: HashMap<&str, u32> = HashMap::new();
        for entry in store.entries() {
            *booked.entry(entry.classroom_id.as_str()).or_default() += 1;
        }

        self.catalog
            .classrooms()
            .filter_map(|classroom| {
                let used = booked.get(classroom.id.as_str()).copied().unwrap_or(0);
                let utilization = f64::from(used) / f64::from(capacity) * 100.0;
                if utilization >= self.settings.underutilization_pct {
                    return None;
                }
                let name = self.catalog.classroom_label(&classroom.id);
                Some(OptimizationSuggestion::new(
                    SuggestionCategory::Utilization,
                    format!("Improve {} Utilization", name),
                    format!(
                        "{} is only {:.1}% utilized. Consider moving smaller classes here.",
                        name, utilization
                    ),
                ))
            })
            .collect()
    }

    /// A single suggestion when the spread of faculty hours exceeds the
    /// configured fraction of the mean.
    pub fn workload(&self, store: &ScheduleStore) -> Option<OptimizationSuggestion> {
        let hours: Vec<f64> = faculty_hours(store, self.catalog).into_values().collect();
        let avg = mean(&hours)?;
        let (min, max) = match hours.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(h) => (h, h),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        if max - min <= avg * self.settings.workload_spread_ratio {
            return None;
        }
        Some(OptimizationSuggestion::new(
            SuggestionCategory::Workload,
            "Balance Faculty Workload".to_string(),
            format!(
                "Workload varies from {:.1} to {:.1} hours. Consider redistributing subjects.",
                min, max
            ),
        ))
    }

    /// One suggestion per used `(day, start)` key holding far fewer entries
    /// than the average used key.
    pub fn efficiency(&self, store: &ScheduleStore) -> Vec<OptimizationSuggestion> {
        let usage = store.usage_by_key();
        let counts: Vec<f64> = usage.values().map(|&n| n as f64).collect();
        let Some(avg) = mean(&counts) else {
            return Vec::new();
        };
        let cutoff = avg * self.settings.slot_usage_ratio;

        usage
            .iter()
            .filter(|&(_, &count)| (count as f64) < cutoff)
            .map(|(key, count)| {
                OptimizationSuggestion::new(
                    SuggestionCategory::Efficiency,
                    format!("Optimize {} Time Slot", key),
                    format!(
                        "{} is underutilized with only {} classes. Consider moving classes here to reduce conflicts.",
                        key, count
                    ),
                )
            })
            .collect()
    }

    pub fn score(&self, store: &ScheduleStore) -> OptimizationScore {
        let utilization = utilization_score(store, self.catalog);
        let workload = workload_score(store, self.catalog);
        let conflict = conflict_score(store);
        OptimizationScore {
            utilization,
            workload,
            conflict,
            overall: ((utilization + workload + conflict) / 3.0).round() as u32,
        }
    }
}

/// Seats booked across all entries against the seats of every room once.
fn utilization_score(store: &ScheduleStore, catalog: &Catalog) -> f64 {
    let total: u64 = catalog.classrooms().map(|c| u64::from(c.capacity)).sum();
    if total == 0 {
        return 0.0;
    }
    let used: u64 = store
        .entries()
        .iter()
        .filter_map(|e| catalog.classroom(&e.classroom_id))
        .map(|c| u64::from(c.capacity))
        .sum();
    (used as f64 / total as f64 * 100.0).min(100.0)
}

fn workload_score(store: &ScheduleStore, catalog: &Catalog) -> f64 {
    let hours: Vec<f64> = faculty_hours(store, catalog).into_values().collect();
    match population_variance(&hours) {
        Some(variance) => (100.0 - variance * 10.0).max(0.0),
        None => 100.0,
    }
}

fn conflict_score(store: &ScheduleStore) -> f64 {
    let clashes = store.overlaps(Resource::Faculty).len();
    (100.0 - clashes as f64 * 10.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        Classroom, Day, FacultyMember, FacultyStatus, RoomStatus, RoomType, ScheduleEntry,
        SessionType, TimeSlot,
    };
    use crate::timeslots::TimeOfDay;

    const DAYS: [Day; 5] = [Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday];

    fn entry(id: String, faculty: &str, room: &str, day: Day, hour: u16) -> ScheduleEntry {
        ScheduleEntry {
            id,
            batch_id: format!("b-{}", faculty),
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

    /// `hours` one-hour sessions for the faculty member, spread over the week.
    fn sessions(faculty: &str, room: &str, hours: usize) -> Vec<ScheduleEntry> {
        (0..hours)
            .map(|i| {
                let day = DAYS[i % DAYS.len()];
                let hour = 9 + (i / DAYS.len()) as u16;
                entry(format!("{}-{}", faculty, i), faculty, room, day, hour)
            })
            .collect()
    }

    fn member(id: &str) -> FacultyMember {
        FacultyMember {
            id: id.to_string(),
            name: id.to_uppercase(),
            subjects_taught: Default::default(),
            available_days: DAYS.into_iter().collect(),
            max_daily_hours: 8,
            status: FacultyStatus::Active,
        }
    }

    fn room(id: &str, capacity: u32) -> Classroom {
        Classroom {
            id: id.to_string(),
            name: format!("Room {}", id),
            capacity,
            kind: RoomType::Classroom,
            status: RoomStatus::Available,
        }
    }

    fn catalog(faculty: &[&str], rooms: &[(&str, u32)]) -> Catalog {
        Catalog::new(
            vec![],
            vec![],
            faculty.iter().map(|f| member(f)).collect(),
            rooms.iter().map(|(id, cap)| room(id, *cap)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_uneven_workload_gets_balancing_suggestion() {
        let catalog = catalog(&["f1", "f2", "f3"], &[("r1", 30), ("r2", 30), ("r3", 30)]);
        let mut entries = sessions("f1", "r1", 4);
        entries.extend(sessions("f2", "r2", 5));
        entries.extend(sessions("f3", "r3", 15));
        let store = ScheduleStore::from_entries(entries);

        let settings = AnalysisSettings::default();
        let suggestion = OptimizationAdvisor::new(&catalog, &settings)
            .workload(&store)
            .unwrap();
        assert_eq!(suggestion.category, SuggestionCategory::Workload);
        assert_eq!(
            suggestion.description,
            "Workload varies from 4.0 to 15.0 hours. Consider redistributing subjects."
        );
        assert_eq!(suggestion.impact.workload_balance, 40);
        assert_eq!(suggestion.implementation.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_balanced_or_missing_faculty_gets_no_workload_suggestion() {
        let settings = AnalysisSettings::default();
        let balanced = catalog(&["f1", "f2"], &[("r1", 30)]);
        let mut entries = sessions("f1", "r1", 4);
        entries.extend(sessions("f2", "r1", 4).into_iter().map(|mut e| {
            e.time_slot.start_time = TimeOfDay::from_minutes(14 * 60);
            e
        }));
        let store = ScheduleStore::from_entries(entries);
        assert!(OptimizationAdvisor::new(&balanced, &settings).workload(&store).is_none());

        let empty = Catalog::default();
        assert!(OptimizationAdvisor::new(&empty, &settings)
            .workload(&ScheduleStore::new())
            .is_none());
    }

    #[test]
    fn test_underused_rooms_are_flagged_against_weekly_capacity() {
        let catalog = catalog(&["f1"], &[("r1", 30), ("r2", 30)]);
        let store = ScheduleStore::from_entries(sessions("f1", "r1", 3));
        let settings = AnalysisSettings {
            weekly_capacity_slots: 4,
            ..AnalysisSettings::default()
        };

        let suggestions = OptimizationAdvisor::new(&catalog, &settings).utilization(&store);
        // r1 is at 75%, r2 at 0%
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Improve Room r2 Utilization");
        assert_eq!(
            suggestions[0].description,
            "Room r2 is only 0.0% utilized. Consider moving smaller classes here."
        );
        assert_eq!(suggestions[0].implementation.estimated_time, "15 minutes");

        let zero = AnalysisSettings {
            weekly_capacity_slots: 0,
            ..AnalysisSettings::default()
        };
        assert!(OptimizationAdvisor::new(&catalog, &zero).utilization(&store).is_empty());
    }

    #[test]
    fn test_sparse_time_keys_get_efficiency_suggestions() {
        let catalog = catalog(&["f1", "f2", "f3", "f4"], &[("r1", 30)]);
        let store = ScheduleStore::from_entries(vec![
            entry("a".to_string(), "f1", "r1", Day::Monday, 9),
            entry("b".to_string(), "f2", "r2", Day::Monday, 9),
            entry("c".to_string(), "f3", "r3", Day::Monday, 9),
            entry("d".to_string(), "f4", "r4", Day::Monday, 9),
            entry("e".to_string(), "f1", "r1", Day::Monday, 10),
        ]);
        let settings = AnalysisSettings::default();

        // mean usage is 2.5, so 10:00 with a single class falls under 1.25
        let suggestions = OptimizationAdvisor::new(&catalog, &settings).efficiency(&store);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Optimize Monday-10:00 Time Slot");
        assert_eq!(suggestions[0].impact.conflict_reduction, 20);
        assert!(OptimizationAdvisor::new(&catalog, &settings)
            .efficiency(&ScheduleStore::new())
            .is_empty());
    }

    #[test]
    fn test_optimization_score_components() {
        let catalog = catalog(&["f1", "f2"], &[("r1", 30), ("r2", 10)]);
        let store = ScheduleStore::from_entries(vec![
            entry("a".to_string(), "f1", "r1", Day::Monday, 9),
            entry("b".to_string(), "f1", "r2", Day::Monday, 9),
        ]);
        let settings = AnalysisSettings::default();
        let score = OptimizationAdvisor::new(&catalog, &settings).score(&store);

        assert_eq!(score.utilization, 100.0);
        // hours {2, 0}: variance 1
        assert_eq!(score.workload, 90.0);
        assert_eq!(score.conflict, 90.0);
        assert_eq!(score.overall, 93);
    }

    #[test]
    fn test_empty_inputs_score_without_nan() {
        let settings = AnalysisSettings::default();
        let empty = Catalog::default();
        let score = OptimizationAdvisor::new(&empty, &settings).score(&ScheduleStore::new());
        assert_eq!(score.utilization, 0.0);
        assert_eq!(score.workload, 100.0);
        assert_eq!(score.conflict, 100.0);
        assert_eq!(score.overall, 67);
    }
}
