//! Advisory insights: peak start times, workload outliers and conflict risk.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::AnalysisSettings;
use crate::metrics::{faculty_hours, mean, population_std_dev};
use crate::store::ScheduleStore;
use crate::timeslots::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Pattern,
    Anomaly,
    Recommendation,
    Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum InsightData {
    PeakTime { time_slot: TimeOfDay, count: usize },
    Workload { faculty_id: String, workload: f64, average: f64 },
    ConflictRisk { probability: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub data: InsightData,
    pub actionable: bool,
}

pub struct InsightEngine<'a> {
    catalog: &'a Catalog,
    settings: &'a AnalysisSettings,
}

impl<'a> InsightEngine<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a AnalysisSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn insights(&self, store: &ScheduleStore) -> Vec<Insight> {
        let mut insights: Vec<Insight> = self.peak_time(store).into_iter().collect();
        insights.extend(self.workload_anomalies(store));
        insights.extend(self.conflict_risk(store));
        insights
    }

    /// The start time used by most entries; ties go to the one seen first.
    pub fn peak_time(&self, store: &ScheduleStore) -> Option<Insight> {
        let mut counts: IndexMap<TimeOfDay, usize> = IndexMap::new();
        for entry in store.entries() {
            *counts.entry(entry.time_slot.start_time).or_default() += 1;
        }
        let (&time, &count) = counts
            .iter()
            .reduce(|best, next| if next.1 > best.1 { next } else { best })?;

        Some(Insight {
            kind: InsightType::Pattern,
            title: "Peak Scheduling Time".to_string(),
            description: format!(
                "{} is the most scheduled time slot with {} classes",
                time, count
            ),
            confidence: 0.95,
            data: InsightData::PeakTime {
                time_slot: time,
                count,
            },
            actionable: true,
        })
    }

    /// Faculty whose hours sit more than the configured number of standard
    /// deviations from the mean. A flat distribution has no outliers.
    pub fn workload_anomalies(&self, store: &ScheduleStore) -> Vec<Insight> {
        let hours = faculty_hours(store, self.catalog);
        let values: Vec<f64> = hours.values().copied().collect();
        let (Some(avg), Some(sigma)) = (mean(&values), population_std_dev(&values)) else {
            return Vec::new();
        };
        if sigma == 0.0 {
            return Vec::new();
        }
        let limit = self.settings.anomaly_z_score * sigma;

        hours
            .iter()
            .filter(|&(_, &workload)| (workload - avg).abs() > limit)
            .map(|(faculty_id, &workload)| Insight {
                kind: InsightType::Anomaly,
                title: "Unusual Faculty Workload".to_string(),
                description: format!(
                    "{} has {:.1} hours, significantly {} average ({:.1} hours)",
                    self.catalog.faculty_label(faculty_id),
                    workload,
                    if workload > avg { "above" } else { "below" },
                    avg
                ),
                confidence: 0.85,
                data: InsightData::Workload {
                    faculty_id: faculty_id.clone(),
                    workload,
                    average: avg,
                },
                actionable: true,
            })
            .collect()
    }

    /// Mean entries per used `(day, start)` key, scaled into a probability.
    pub fn conflict_probability(&self, store: &ScheduleStore) -> Option<f64> {
        let counts: Vec<f64> = store.usage_by_key().values().map(|&n| n as f64).collect();
        let avg = mean(&counts)?;
        if self.settings.conflict_risk_divisor <= 0.0 {
            return None;
        }
        Some((avg / self.settings.conflict_risk_divisor).min(1.0))
    }

    pub fn conflict_risk(&self, store: &ScheduleStore) -> Option<Insight> {
        let probability = self.conflict_probability(store)?;
        if probability <= self.settings.conflict_risk_threshold {
            return None;
        }
        Some(Insight {
            kind: InsightType::Prediction,
            title: "High Conflict Risk".to_string(),
            description: format!(
                "Based on current scheduling patterns, there's a {:.1}% chance of conflicts in the next scheduling cycle",
                probability * 100.0
            ),
            confidence: 0.75,
            data: InsightData::ConflictRisk { probability },
            actionable: true,
        })
    }
}
