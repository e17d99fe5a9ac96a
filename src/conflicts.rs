//! Typed, severity-ranked conflict reports over an arbitrary schedule.

use log::debug;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::store::{Overlap, Resource, ScheduleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    Faculty,
    Classroom,
    Batch,
    Time,
}

impl From<Resource> for ConflictType {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Faculty => ConflictType::Faculty,
            Resource::Classroom => ConflictType::Classroom,
            Resource::Batch => ConflictType::Batch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    #[serde(rename = "type")]
    pub kind: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub affected_entry_ids: Vec<String>,
    pub suggested_resolution: String,
    /// Advisory only; the analyzer never repairs anything.
    pub auto_resolvable: bool,
}

/// Classifies double bookings into conflict records, naming resources
/// through the catalog where it knows them.
pub struct ConflictAnalyzer<'a> {
    catalog: &'a Catalog,
}

impl<'a> ConflictAnalyzer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// One high-severity record per `(resource, day, start)` group holding
    /// more than one entry: faculty first, then classrooms, then batches.
    pub fn analyze(&self, store: &ScheduleStore) -> Vec<ConflictRecord> {
        let conflicts: Vec<ConflictRecord> = Resource::ALL
            .into_iter()
            .flat_map(|resource| store.overlaps(resource))
            .map(|overlap| self.record(&overlap))
            .collect();
        debug!("Found {} conflicts in {} entries", conflicts.len(), store.len());
        conflicts
    }

    fn record(&self, overlap: &Overlap<'_>) -> ConflictRecord {
        let id = overlap.resource_id;
        let (description, resolution) = match overlap.resource {
            Resource::Faculty => (
                format!(
                    "{} has {} overlapping classes at {}",
                    self.catalog.faculty_label(id),
                    overlap.entries.len(),
                    overlap.key
                ),
                "Reschedule one of the conflicting classes to a different time slot",
            ),
            Resource::Classroom => (
                format!(
                    "{} is double-booked at {}",
                    self.catalog.classroom_label(id),
                    overlap.key
                ),
                "Move one class to an available classroom",
            ),
            Resource::Batch => (
                format!(
                    "{} has overlapping classes at {}",
                    self.catalog.batch_label(id),
                    overlap.key
                ),
                "Reschedule one class to avoid student conflicts",
            ),
        };
        ConflictRecord {
            kind: overlap.resource.into(),
            severity: Severity::High,
            description,
            affected_entry_ids: overlap.entries.iter().map(|e| e.id.clone()).collect(),
            suggested_resolution: resolution.to_string(),
            auto_resolvable: true,
        }
    }
}

/// A repair strategy for one kind of conflict.
///
/// No strategy ships with the engine; callers plug their own in.
pub trait ConflictResolver {
    fn name(&self) -> &str;

    /// Attempts to repair the conflict in place. Returns `true` only if the
    /// store was changed so that the conflict no longer exists.
    fn resolve(&self, conflict: &ConflictRecord, store: &mut ScheduleStore) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub resolved: Vec<ConflictRecord>,
    pub unresolved: Vec<ConflictRecord>,
}

/// Offers each auto-resolvable conflict to the resolvers in order. Conflicts
/// nobody repairs, and those not flagged auto-resolvable, stay unresolved.
pub fn resolve_conflicts(
    conflicts: Vec<ConflictRecord>,
    store: &mut ScheduleStore,
    resolvers: &[&dyn ConflictResolver],
) -> Resolution {
    let mut resolution = Resolution::default();
    for conflict in conflicts {
        let repaired_by = if conflict.auto_resolvable {
            resolvers.iter().find(|r| r.resolve(&conflict, store))
        } else {
            None
        };
        match repaired_by {
            Some(resolver) => {
                debug!("{} resolved: {}", resolver.name(), conflict.description);
                resolution.resolved.push(conflict);
            }
            None => resolution.unresolved.push(conflict),
        }
    }
    resolution
}
