//! The set of confirmed schedule entries plus occupancy indices.
//!
//! A [`ScheduleStore`] accepts any list of entries, conflicting or not, so
//! the validator and the conflict analyzer can audit hand-edited schedules.
//! Checked insertion goes through [`Candidate`] and
//! [`ScheduleStore::reschedule`]. [`SharedSchedule`] publishes immutable,
//! versioned snapshots for readers while a new run builds its own store.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::Catalog;
use crate::data::{Day, EntryId, ScheduleEntry, TimeSlot};
use crate::error::PlacementError;
use crate::placement::{Candidate, Rule};
use crate::timeslots::{SlotKey, TimeOfDay};

/// Booking counts per resource id and slot key.
#[derive(Debug, Clone, Default)]
struct Occupancy(HashMap<String, HashMap<SlotKey, usize>>);

impl Occupancy {
    fn book(&mut self, id: &str, key: SlotKey) {
        *self
            .0
            .entry(id.to_string())
            .or_default()
            .entry(key)
            .or_insert(0) += 1;
    }

    fn release(&mut self, id: &str, key: SlotKey) {
        if let Some(slots) = self.0.get_mut(id) {
            if let Some(count) = slots.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    slots.remove(&key);
                }
            }
            if slots.is_empty() {
                self.0.remove(id);
            }
        }
    }

    fn is_booked(&self, id: &str, key: SlotKey) -> bool {
        self.0.get(id).is_some_and(|slots| slots.contains_key(&key))
    }
}

/// The resource dimension a double booking is detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Faculty,
    Classroom,
    Batch,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Faculty, Resource::Classroom, Resource::Batch];

    pub fn id_of(self, entry: &ScheduleEntry) -> &str {
        match self {
            Resource::Faculty => &entry.faculty_id,
            Resource::Classroom => &entry.classroom_id,
            Resource::Batch => &entry.batch_id,
        }
    }
}

/// Two or more entries booking one resource at one slot key.
#[derive(Debug, Clone)]
pub struct Overlap<'a> {
    pub resource: Resource,
    pub resource_id: &'a str,
    pub key: SlotKey,
    pub entries: Vec<&'a ScheduleEntry>,
}

/// Move request for an existing entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    pub entry_id: EntryId,
    pub day: Day,
    pub start_time: TimeOfDay,
    /// Keeps the current faculty member when absent.
    #[serde(default)]
    pub faculty_id: Option<String>,
    /// Keeps the current classroom when absent.
    #[serde(default)]
    pub classroom_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ScheduleEntry>", into = "Vec<ScheduleEntry>")]
pub struct ScheduleStore {
    entries: Vec<ScheduleEntry>,
    faculty: Occupancy,
    classrooms: Occupancy,
    batches: Occupancy,
    faculty_minutes: HashMap<String, HashMap<Day, u32>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from arbitrary entries without checking them.
    pub fn from_entries(entries: Vec<ScheduleEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.insert_unchecked(entry);
        }
        store
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn is_faculty_booked(&self, faculty_id: &str, key: SlotKey) -> bool {
        self.faculty.is_booked(faculty_id, key)
    }

    pub fn is_classroom_booked(&self, classroom_id: &str, key: SlotKey) -> bool {
        self.classrooms.is_booked(classroom_id, key)
    }

    pub fn is_batch_booked(&self, batch_id: &str, key: SlotKey) -> bool {
        self.batches.is_booked(batch_id, key)
    }

    /// Minutes already assigned to a faculty member on a day.
    pub fn faculty_minutes(&self, faculty_id: &str, day: Day) -> u32 {
        self.faculty_minutes
            .get(faculty_id)
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(0)
    }

    fn index(&mut self, entry: &ScheduleEntry) {
        let key = entry.key();
        self.faculty.book(&entry.faculty_id, key);
        self.classrooms.book(&entry.classroom_id, key);
        self.batches.book(&entry.batch_id, key);
        *self
            .faculty_minutes
            .entry(entry.faculty_id.clone())
            .or_default()
            .entry(entry.time_slot.day)
            .or_insert(0) += entry.time_slot.duration_minutes;
    }

    fn unindex(&mut self, entry: &ScheduleEntry) {
        let key = entry.key();
        self.faculty.release(&entry.faculty_id, key);
        self.classrooms.release(&entry.classroom_id, key);
        self.batches.release(&entry.batch_id, key);
        if let Some(days) = self.faculty_minutes.get_mut(&entry.faculty_id) {
            if let Some(minutes) = days.get_mut(&entry.time_slot.day) {
                *minutes = minutes.saturating_sub(entry.time_slot.duration_minutes);
            }
        }
    }

    /// Appends an entry without any constraint check.
    pub fn insert_unchecked(&mut self, entry: ScheduleEntry) {
        self.index(&entry);
        self.entries.push(entry);
    }

    /// Commits a candidate if it passes every hard constraint.
    pub fn place(&mut self, candidate: &Candidate<'_>) -> Result<&ScheduleEntry, Rule> {
        candidate.check(self)?;
        self.insert_unchecked(candidate.to_entry());
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Option<ScheduleEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);
        self.unindex(&entry);
        Some(entry)
    }

    /// Drops every entry belonging to one of the given batches.
    pub fn remove_batches(&mut self, batch_ids: &HashSet<&str>) -> usize {
        let (dropped, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| batch_ids.contains(e.batch_id.as_str()));
        *self = Self::from_entries(kept);
        dropped.len()
    }

    /// Moves an entry to another slot, optionally changing faculty or room.
    ///
    /// The entry is taken out, the new placement is checked against the
    /// remaining entries, and on any failure the original is restored
    /// untouched.
    pub fn reschedule(
        &mut self,
        catalog: &Catalog,
        slots: &[TimeSlot],
        request: &Reschedule,
    ) -> Result<ScheduleEntry, PlacementError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == request.entry_id)
            .ok_or_else(|| PlacementError::UnknownEntry(request.entry_id.clone()))?;
        let original = self.entries[pos].clone();
        if original.fixed {
            return Err(PlacementError::FixedEntry(original.id));
        }

        let slot = slots
            .iter()
            .find(|s| s.day == request.day && s.start_time == request.start_time)
            .ok_or(PlacementError::UnknownSlot {
                day: request.day,
                start: request.start_time,
            })?;
        let unknown = |entity: &'static str, id: &str| PlacementError::UnknownEntity {
            entity,
            id: id.to_string(),
        };
        let faculty_id = request.faculty_id.as_deref().unwrap_or(&original.faculty_id);
        let classroom_id = request.classroom_id.as_deref().unwrap_or(&original.classroom_id);
        let candidate = Candidate {
            batch: catalog
                .batch(&original.batch_id)
                .ok_or_else(|| unknown("batch", &original.batch_id))?,
            subject: catalog
                .subject(&original.subject_id)
                .ok_or_else(|| unknown("subject", &original.subject_id))?,
            faculty: catalog
                .faculty_member(faculty_id)
                .ok_or_else(|| unknown("faculty", faculty_id))?,
            classroom: catalog
                .classroom(classroom_id)
                .ok_or_else(|| unknown("classroom", classroom_id))?,
            slot,
        };

        self.unindex(&original);
        if let Err(rule) = candidate.check(self) {
            self.index(&original);
            return Err(rule.into());
        }

        let mut moved = candidate.to_entry();
        moved.session_type = original.session_type;
        debug!("Rescheduled {} to {} as {}", original.id, slot, moved.id);
        self.index(&moved);
        self.entries[pos] = moved.clone();
        Ok(moved)
    }

    /// Groups entries by `(resource id, day, start)` and returns the groups
    /// holding more than one entry, in first-seen order.
    pub fn overlaps(&self, resource: Resource) -> Vec<Overlap<'_>> {
        let mut groups: IndexMap<(&str, SlotKey), Vec<&ScheduleEntry>> = IndexMap::new();
        for entry in &self.entries {
            groups
                .entry((resource.id_of(entry), entry.key()))
                .or_default()
                .push(entry);
        }
        groups
            .into_iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|((resource_id, key), entries)| Overlap {
                resource,
                resource_id,
                key,
                entries,
            })
            .collect()
    }

    /// Number of entries per `(day, start)` key, in first-seen order.
    pub fn usage_by_key(&self) -> IndexMap<SlotKey, usize> {
        let mut usage = IndexMap::new();
        for entry in &self.entries {
            *usage.entry(entry.key()).or_insert(0) += 1;
        }
        usage
    }
}

impl From<Vec<ScheduleEntry>> for ScheduleStore {
    fn from(entries: Vec<ScheduleEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<ScheduleStore> for Vec<ScheduleEntry> {
    fn from(store: ScheduleStore) -> Self {
        store.entries
    }
}

/// An immutable published schedule and the context it was generated in.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    pub catalog: Arc<Catalog>,
    pub slots: Arc<[TimeSlot]>,
    pub store: ScheduleStore,
}

/// Holder of the current snapshot. Readers clone the `Arc` under a single
/// read lock; writers replace it wholesale.
#[derive(Debug, Default)]
pub struct SharedSchedule {
    current: RwLock<Arc<Snapshot>>,
}

impl SharedSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the published schedule and returns the new version.
    pub fn publish(&self, catalog: Arc<Catalog>, slots: Arc<[TimeSlot]>, store: ScheduleStore) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let version = current.version + 1;
        *current = Arc::new(Snapshot {
            version,
            catalog,
            slots,
            store,
        });
        version
    }

    /// Publishes an edited store only if nothing was published since
    /// `based_on`.
    pub fn publish_edit(&self, based_on: u64, store: ScheduleStore) -> Result<u64, PlacementError> {
        self.publish_if_current(based_on, None, store)
    }

    /// Publishes a store built on the `based_on` snapshot together with the
    /// catalog and slots it was generated against. Fails without touching
    /// the current snapshot if anything was published in between.
    pub fn publish_based_on(
        &self,
        based_on: u64,
        catalog: Arc<Catalog>,
        slots: Arc<[TimeSlot]>,
        store: ScheduleStore,
    ) -> Result<u64, PlacementError> {
        self.publish_if_current(based_on, Some((catalog, slots)), store)
    }

    fn publish_if_current(
        &self,
        based_on: u64,
        context: Option<(Arc<Catalog>, Arc<[TimeSlot]>)>,
        store: ScheduleStore,
    ) -> Result<u64, PlacementError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.version != based_on {
            return Err(PlacementError::StaleVersion {
                expected: based_on,
                actual: current.version,
            });
        }
        let (catalog, slots) = context
            .unwrap_or_else(|| (Arc::clone(&current.catalog), Arc::clone(&current.slots)));
        let version = based_on + 1;
        *current = Arc::new(Snapshot {
            version,
            catalog,
            slots,
            store,
        });
        Ok(version)
    }
}
