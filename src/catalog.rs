//! Validated, id-indexed snapshot of the entities a run schedules over.
//!
//! The surrounding system owns batches, subjects, faculty and classrooms.
//! The engine ingests them once per run, rejects structurally broken lists
//! here, and from then on only reads them.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::data::{Batch, Classroom, FacultyMember, Subject};
use crate::error::IngestError;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    batches: IndexMap<String, Batch>,
    subjects: IndexMap<String, Subject>,
    faculty: IndexMap<String, FacultyMember>,
    classrooms: IndexMap<String, Classroom>,
}

fn index_by_id<T>(
    entity: &'static str,
    items: Vec<T>,
    id: impl Fn(&T) -> &str,
) -> Result<IndexMap<String, T>, IngestError> {
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        let key = id(&item).to_string();
        if key.trim().is_empty() {
            return Err(IngestError::EmptyId { entity });
        }
        match map.entry(key) {
            Entry::Occupied(e) => {
                return Err(IngestError::DuplicateId {
                    entity,
                    id: e.key().clone(),
                });
            }
            Entry::Vacant(e) => {
                e.insert(item);
            }
        }
    }
    Ok(map)
}

impl Catalog {
    /// Indexes the entity lists, preserving their input order.
    pub fn new(
        batches: Vec<Batch>,
        subjects: Vec<Subject>,
        faculty: Vec<FacultyMember>,
        classrooms: Vec<Classroom>,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            batches: index_by_id("batch", batches, |b| b.id.as_str())?,
            subjects: index_by_id("subject", subjects, |s| s.id.as_str())?,
            faculty: index_by_id("faculty", faculty, |f| f.id.as_str())?,
            classrooms: index_by_id("classroom", classrooms, |c| c.id.as_str())?,
        })
    }

    pub fn batch(&self, id: &str) -> Option<&Batch> {
        self.batches.get(id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn faculty_member(&self, id: &str) -> Option<&FacultyMember> {
        self.faculty.get(id)
    }

    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.get(id)
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn faculty(&self) -> impl Iterator<Item = &FacultyMember> {
        self.faculty.values()
    }

    pub fn classrooms(&self) -> impl Iterator<Item = &Classroom> {
        self.classrooms.values()
    }

    pub fn faculty_count(&self) -> usize {
        self.faculty.len()
    }

    pub fn classroom_count(&self) -> usize {
        self.classrooms.len()
    }

    /// Resolves a requested batch subset; `None` selects every batch.
    pub fn select_batches(&self, ids: Option<&[String]>) -> Result<Vec<&Batch>, IngestError> {
        match ids {
            None => Ok(self.batches.values().collect()),
            Some(ids) => ids
                .iter()
                .map(|id| {
                    self.batches
                        .get(id)
                        .ok_or_else(|| IngestError::UnknownBatch(id.clone()))
                })
                .collect(),
        }
    }

    /// Subjects whose department and semester match the batch, in input order.
    pub fn subjects_for<'a>(&'a self, batch: &'a Batch) -> impl Iterator<Item = &'a Subject> + 'a {
        self.subjects.values().filter(move |s| s.is_offered_to(batch))
    }

    /// Active faculty teaching the subject, in input order.
    pub fn eligible_faculty(&self, subject: &Subject) -> Vec<&FacultyMember> {
        self.faculty
            .values()
            .filter(|f| f.is_active() && f.teaches(subject))
            .collect()
    }

    /// Display name for a batch, falling back to its id.
    pub fn batch_label<'a>(&'a self, id: &'a str) -> &'a str {
        label(self.batches.get(id).map(|b| b.name.as_str()), id)
    }

    pub fn faculty_label<'a>(&'a self, id: &'a str) -> &'a str {
        label(self.faculty.get(id).map(|f| f.name.as_str()), id)
    }

    pub fn classroom_label<'a>(&'a self, id: &'a str) -> &'a str {
        label(self.classrooms.get(id).map(|c| c.name.as_str()), id)
    }
}

fn label<'a>(name: Option<&'a str>, id: &'a str) -> &'a str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => id,
    }
}
