//! Workload statistics and post-generation metrics.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::store::ScheduleStore;

/// Assigned teaching hours per catalog faculty member, in catalog order.
/// Members without entries are listed with zero hours.
pub fn faculty_hours(store: &ScheduleStore, catalog: &Catalog) -> IndexMap<String, f64> {
    let mut hours: IndexMap<String, f64> = catalog.faculty().map(|f| (f.id.clone(), 0.0)).collect();
    for entry in store.entries() {
        if let Some(total) = hours.get_mut(&entry.faculty_id) {
            *total += entry.time_slot.hours();
        }
    }
    hours
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    Some(values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Summary figures reported after a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetrics {
    /// Booked share of all (slot, classroom) pairs, rounded to a percent.
    pub utilization_pct: u32,
    pub total_classes_scheduled: usize,
    pub average_faculty_workload: f64,
    pub faculty_workload: IndexMap<String, f64>,
}

impl GenerationMetrics {
    pub fn calculate(store: &ScheduleStore, catalog: &Catalog, slot_count: usize) -> Self {
        let bookable = slot_count * catalog.classroom_count();
        let utilization_pct = if bookable == 0 {
            0
        } else {
            (store.len() as f64 / bookable as f64 * 100.0).round() as u32
        };
        let faculty_workload = faculty_hours(store, catalog);
        let workloads: Vec<f64> = faculty_workload.values().copied().collect();
        Self {
            utilization_pct,
            total_classes_scheduled: store.len(),
            average_faculty_workload: mean(&workloads).unwrap_or(0.0),
            faculty_workload,
        }
    }
}
