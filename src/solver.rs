use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::catalog::Catalog;
use crate::conflicts::Severity;
use crate::data::{Batch, BatchId, Classroom, FacultyMember, GenerationConfig, Subject, TimeSlot};
use crate::error::EngineError;
use crate::placement::Candidate;
use crate::store::ScheduleStore;
use crate::timeslots::generate_time_slots;

/// Receives a percentage after every session attempt.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsatisfiedReason {
    /// No active faculty member teaches the subject.
    NoEligibleFaculty,
    /// Every (slot, faculty, classroom) combination broke a hard constraint.
    NoFeasiblePlacement,
}

/// A subject session the solver left unscheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsatisfiedSession {
    pub batch_id: BatchId,
    pub subject_id: String,
    /// 1-based index of the session within the subject's weekly sessions.
    pub session: u32,
    pub reason: UnsatisfiedReason,
}

/// Raised before the search when the sessions to place cannot all fit in
/// the free (slot, classroom) pairs, whatever the other constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShortage {
    pub required_sessions: u32,
    pub available_slots: usize,
    pub severity: Severity,
    pub message: String,
}

impl ResourceShortage {
    fn check(required_sessions: u32, available_slots: usize) -> Option<Self> {
        if required_sessions as usize <= available_slots {
            return None;
        }
        Some(Self {
            required_sessions,
            available_slots,
            severity: Severity::High,
            message: format!(
                "Required {} slots but only {} available",
                required_sessions, available_slots
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub store: ScheduleStore,
    pub unsatisfied: Vec<UnsatisfiedSession>,
    pub shortage: Option<ResourceShortage>,
    /// Set when the run stopped early; the store holds every commit made
    /// up to that point.
    pub cancelled: bool,
}

impl GenerationOutcome {
    pub fn unsatisfied_count(&self) -> usize {
        self.unsatisfied.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.unsatisfied.is_empty()
    }
}

struct Requirement<'a> {
    batch: &'a Batch,
    subject: &'a Subject,
    sessions: u32,
    faculty: Vec<&'a FacultyMember>,
}

/// Share of attempted sessions, rounded down so only a finished run reaches 100.
fn percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    (u64::from(done) * 100 / u64::from(total)) as u8
}

/// Greedy first-fit timetable construction.
///
/// Batches are processed one after another against a single growing store,
/// so later batches see every resource earlier ones booked. For each session
/// the search walks slots in generated order, then eligible faculty in input
/// order, then classrooms in input order, and commits the first combination
/// that passes every hard constraint. There is no backtracking: a session
/// with no valid combination is recorded as unsatisfied and the run goes on.
pub struct ConstraintSolver<'a> {
    catalog: &'a Catalog,
    slots: &'a [TimeSlot],
    slot_minutes: u32,
}

impl<'a> ConstraintSolver<'a> {
    pub fn new(catalog: &'a Catalog, slots: &'a [TimeSlot], slot_minutes: u32) -> Self {
        Self {
            catalog,
            slots,
            slot_minutes,
        }
    }

    fn plan(&self, batches: &[&'a Batch]) -> Vec<Requirement<'a>> {
        let mut plan = Vec::new();
        for &batch in batches {
            for subject in self.catalog.subjects_for(batch) {
                let sessions = subject.sessions_needed(self.slot_minutes);
                if sessions == 0 {
                    continue;
                }
                plan.push(Requirement {
                    batch,
                    subject,
                    sessions,
                    faculty: self.catalog.eligible_faculty(subject),
                });
            }
        }
        plan
    }

    /// Schedules every batch of the catalog into an empty store.
    pub fn solve(&self, progress: &mut dyn ProgressSink) -> GenerationOutcome {
        let batches: Vec<&Batch> = self.catalog.batches().collect();
        self.solve_batches(ScheduleStore::new(), &batches, progress, &AtomicBool::new(false))
    }

    /// Schedules the given batches on top of `seed`, checking `cancel`
    /// before every session attempt.
    pub fn solve_batches(
        &self,
        seed: ScheduleStore,
        batches: &[&'a Batch],
        progress: &mut dyn ProgressSink,
        cancel: &AtomicBool,
    ) -> GenerationOutcome {
        let start_time = Instant::now();
        let plan = self.plan(batches);
        let total: u32 = plan.iter().map(|r| r.sessions).sum();
        info!(
            "Scheduling {} sessions for {} batches over {} slots, {} faculty and {} classrooms...",
            total,
            batches.len(),
            self.slots.len(),
            self.catalog.faculty_count(),
            self.catalog.classroom_count()
        );

        let bookable = (self.slots.len() * self.catalog.classroom_count()).saturating_sub(seed.len());
        let shortage = ResourceShortage::check(total, bookable);
        if let Some(shortage) = &shortage {
            warn!("{}", shortage.message);
        }

        let mut store = seed;
        let mut unsatisfied = Vec::new();
        let mut cancelled = false;
        let mut done = 0;

        'requirements: for requirement in &plan {
            for session in 1..=requirement.sessions {
                if cancel.load(Ordering::Relaxed) {
                    warn!(
                        "Generation cancelled after {} of {} sessions",
                        done, total
                    );
                    cancelled = true;
                    break 'requirements;
                }
                if let Err(reason) = self.first_fit(&mut store, requirement) {
                    debug!(
                        "Could not place session {} of {} for batch {}: {:?}",
                        session, requirement.subject.id, requirement.batch.id, reason
                    );
                    unsatisfied.push(UnsatisfiedSession {
                        batch_id: requirement.batch.id.clone(),
                        subject_id: requirement.subject.id.clone(),
                        session,
                        reason,
                    });
                }
                done += 1;
                progress.report(percent(done, total));
            }
        }
        if total == 0 && !cancelled {
            progress.report(100);
        }

        info!(
            "Generation finished in {:.2?}: {} entries, {} unsatisfied sessions",
            start_time.elapsed(),
            store.len(),
            unsatisfied.len()
        );
        GenerationOutcome {
            store,
            unsatisfied,
            shortage,
            cancelled,
        }
    }

    fn first_fit(
        &self,
        store: &mut ScheduleStore,
        requirement: &Requirement<'a>,
    ) -> Result<(), UnsatisfiedReason> {
        if requirement.faculty.is_empty() {
            return Err(UnsatisfiedReason::NoEligibleFaculty);
        }
        let classrooms: Vec<&Classroom> = self.catalog.classrooms().collect();
        for slot in self.slots {
            for &faculty in &requirement.faculty {
                for &classroom in &classrooms {
                    let candidate = Candidate {
                        batch: requirement.batch,
                        subject: requirement.subject,
                        faculty,
                        classroom,
                        slot,
                    };
                    if let Ok(entry) = store.place(&candidate) {
                        trace!("Placed {} with {} in {}", entry.id, faculty.id, classroom.id);
                        return Ok(());
                    }
                }
            }
        }
        Err(UnsatisfiedReason::NoFeasiblePlacement)
    }
}

/// One-shot generation over loose entity lists.
pub fn generate(
    batches: Vec<Batch>,
    subjects: Vec<Subject>,
    faculty: Vec<FacultyMember>,
    classrooms: Vec<Classroom>,
    config: &GenerationConfig,
    progress: &mut dyn ProgressSink,
) -> Result<GenerationOutcome, EngineError> {
    let slots = generate_time_slots(config)?;
    let catalog = Catalog::new(batches, subjects, faculty, classrooms)?;
    Ok(ConstraintSolver::new(&catalog, &slots, config.slot_duration_minutes).solve(progress))
}

/// A generation run on the blocking pool that streams progress and can be
/// cancelled between sessions.
///
/// Progress events are buffered one deep, so a run whose events are
/// not being read waits for its reader; [`GenerationTask::join`] stops
/// listening and lets it finish.
pub struct GenerationTask {
    progress: mpsc::Receiver<u8>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<GenerationOutcome>,
}

impl GenerationTask {
    const PROGRESS_BUFFER: usize = 1;

    /// Starts scheduling `batch_ids` (resolved against the catalog, unknown
    /// ids skipped) on top of `seed`. Must be called inside a tokio runtime.
    pub fn spawn(
        catalog: Arc<Catalog>,
        slots: Arc<[TimeSlot]>,
        slot_minutes: u32,
        batch_ids: Vec<BatchId>,
        seed: ScheduleStore,
    ) -> Self {
        let (tx, rx) = mpsc::channel(Self::PROGRESS_BUFFER);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let handle = tokio::task::spawn_blocking(move || {
            let batches: Vec<&Batch> = batch_ids.iter().filter_map(|id| catalog.batch(id)).collect();
            let mut sink = |percent: u8| {
                // the receiver may have been dropped; the run still completes
                let _ = tx.blocking_send(percent);
            };
            ConstraintSolver::new(&catalog, &slots, slot_minutes)
                .solve_batches(seed, &batches, &mut sink, &flag)
        });

        Self {
            progress: rx,
            cancel,
            handle,
        }
    }

    /// Asks the run to stop before its next session attempt.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Next progress event; `None` once the run has finished.
    pub async fn next_progress(&mut self) -> Option<u8> {
        self.progress.recv().await
    }

    pub async fn join(self) -> Result<GenerationOutcome, JoinError> {
        let Self {
            progress, handle, ..
        } = self;
        drop(progress);
        handle.await
    }
}
