use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use crate::advisor::{OptimizationAdvisor, OptimizationScore, OptimizationSuggestion};
use crate::catalog::Catalog;
use crate::config::{AnalysisSettings, ServerConfig};
use crate::conflicts::{ConflictAnalyzer, ConflictRecord};
use crate::data::{GenerationInput, ScheduleEntry, TimeSlot};
use crate::error::{EngineError, PlacementError};
use crate::insights::{Insight, InsightEngine};
use crate::metrics::GenerationMetrics;
use crate::solver::{GenerationTask, ResourceShortage, UnsatisfiedSession};
use crate::store::{Reschedule, ScheduleStore, SharedSchedule};
use crate::timeslots::SlotCache;
use crate::validator::{self, ValidationReport};

type Rejection = (StatusCode, String);

fn reject(error: EngineError) -> Rejection {
    let status = match &error {
        EngineError::Config(_) | EngineError::Ingest(_) => StatusCode::BAD_REQUEST,
        EngineError::Placement(
            PlacementError::UnknownEntry(_)
            | PlacementError::UnknownEntity { .. }
            | PlacementError::UnknownSlot { .. },
        ) => StatusCode::NOT_FOUND,
        EngineError::Placement(_) => StatusCode::CONFLICT,
    };
    debug!("Rejecting request with {}: {}", status, error);
    (status, error.to_string())
}

#[derive(Clone, Default)]
pub struct AppState {
    pub schedule: Arc<SharedSchedule>,
    pub slot_cache: Arc<SlotCache>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub version: u64,
    pub entries: Vec<ScheduleEntry>,
    pub unsatisfied_count: usize,
    pub unsatisfied: Vec<UnsatisfiedSession>,
    pub shortage: Option<ResourceShortage>,
    pub metrics: GenerationMetrics,
    pub validation: ValidationReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableResponse {
    pub version: u64,
    pub entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub version: u64,
    pub validation: ValidationReport,
    pub conflicts: Vec<ConflictRecord>,
    pub suggestions: Vec<OptimizationSuggestion>,
    pub insights: Vec<Insight>,
    pub score: OptimizationScore,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    /// Version the edit was prepared against; the current one when absent.
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(flatten)]
    pub change: Reschedule,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleResponse {
    pub version: u64,
    pub entry: ScheduleEntry,
}

/// A generation run resolved against the state at request time.
struct GenerationPlan {
    catalog: Arc<Catalog>,
    slots: Arc<[TimeSlot]>,
    slot_minutes: u32,
    batch_ids: Vec<String>,
    seed: ScheduleStore,
    /// Version the seed was taken from; only partial runs have one.
    based_on: Option<u64>,
}

impl GenerationPlan {
    fn prepare(state: &AppState, input: GenerationInput) -> Result<Self, Rejection> {
        let slots = state
            .slot_cache
            .get_or_generate(&input.config)
            .map_err(|e| reject(e.into()))?;
        let catalog = Catalog::new(input.batches, input.subjects, input.faculty, input.classrooms)
            .map_err(|e| reject(e.into()))?;
        let batch_ids: Vec<String> = catalog
            .select_batches(input.batch_ids.as_deref())
            .map_err(|e| reject(e.into()))?
            .into_iter()
            .map(|b| b.id.clone())
            .collect();

        // a partial run replaces only its own batches and books around the rest
        let (seed, based_on) = match &input.batch_ids {
            Some(_) => {
                let snapshot = state.schedule.snapshot();
                let mut store = snapshot.store.clone();
                let selected: HashSet<&str> = batch_ids.iter().map(String::as_str).collect();
                let dropped = store.remove_batches(&selected);
                debug!(
                    "Dropped {} previous entries for {} batches from version {}",
                    dropped,
                    selected.len(),
                    snapshot.version
                );
                (store, Some(snapshot.version))
            }
            None => (ScheduleStore::new(), None),
        };

        Ok(Self {
            catalog: Arc::new(catalog),
            slots,
            slot_minutes: input.config.slot_duration_minutes,
            batch_ids,
            seed,
            based_on,
        })
    }

    async fn run(self, state: &AppState) -> Result<GenerateResponse, Rejection> {
        let Self {
            catalog,
            slots,
            slot_minutes,
            batch_ids,
            seed,
            based_on,
        } = self;

        let mut task = GenerationTask::spawn(
            Arc::clone(&catalog),
            Arc::clone(&slots),
            slot_minutes,
            batch_ids,
            seed,
        );
        while let Some(percent) = task.next_progress().await {
            debug!("Generation progress: {}%", percent);
        }
        let outcome = task
            .join()
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        let metrics = GenerationMetrics::calculate(&outcome.store, &catalog, slots.len());
        let validation = validator::validate(&outcome.store);
        let entries = outcome.store.entries().to_vec();
        let unsatisfied_count = outcome.unsatisfied_count();
        let version = match based_on {
            Some(based_on) => state
                .schedule
                .publish_based_on(based_on, catalog, slots, outcome.store)
                .map_err(|e| reject(e.into()))?,
            None => state.schedule.publish(catalog, slots, outcome.store),
        };
        info!(
            "Published timetable version {} with {} entries ({} unsatisfied)",
            version,
            entries.len(),
            unsatisfied_count
        );

        Ok(GenerateResponse {
            version,
            entries,
            unsatisfied_count,
            unsatisfied: outcome.unsatisfied,
            shortage: outcome.shortage,
            metrics,
            validation,
        })
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(input): Json<GenerationInput>,
) -> Result<Json<GenerateResponse>, Rejection> {
    let plan = GenerationPlan::prepare(&state, input)?;
    plan.run(&state).await.map(Json)
}

async fn timetable_handler(State(state): State<AppState>) -> Json<TimetableResponse> {
    let snapshot = state.schedule.snapshot();
    Json(TimetableResponse {
        version: snapshot.version,
        entries: snapshot.store.entries().to_vec(),
    })
}

async fn batch_timetable_handler(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Json<TimetableResponse>, Rejection> {
    let snapshot = state.schedule.snapshot();
    let entries: Vec<ScheduleEntry> = snapshot
        .store
        .entries()
        .iter()
        .filter(|e| e.batch_id == batch_id)
        .cloned()
        .collect();
    if entries.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("no timetable entries for batch '{}'", batch_id),
        ));
    }
    Ok(Json(TimetableResponse {
        version: snapshot.version,
        entries,
    }))
}

async fn analysis_handler(State(state): State<AppState>) -> Json<AnalysisResponse> {
    let snapshot = state.schedule.snapshot();
    let catalog = &snapshot.catalog;
    let store = &snapshot.store;
    let settings = AnalysisSettings::for_slots(&snapshot.slots);
    let advisor = OptimizationAdvisor::new(catalog, &settings);

    Json(AnalysisResponse {
        version: snapshot.version,
        validation: validator::audit(store, catalog),
        conflicts: ConflictAnalyzer::new(catalog).analyze(store),
        suggestions: advisor.suggest(store),
        insights: InsightEngine::new(catalog, &settings).insights(store),
        score: advisor.score(store),
    })
}

async fn reschedule_handler(
    State(state): State<AppState>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>, Rejection> {
    let snapshot = state.schedule.snapshot();
    let mut store = snapshot.store.clone();
    let entry = store
        .reschedule(&snapshot.catalog, &snapshot.slots, &request.change)
        .map_err(|e| reject(e.into()))?;
    let version = state
        .schedule
        .publish_edit(request.version.unwrap_or(snapshot.version), store)
        .map_err(|e| reject(e.into()))?;
    info!("Moved {} to {}, now at version {}", request.change.entry_id, entry.id, version);
    Ok(Json(RescheduleResponse { version, entry }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/timetable", get(timetable_handler))
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/batches/:batch_id", get(batch_timetable_handler))
        .route("/v1/timetable/analysis", get(analysis_handler))
        .route("/v1/timetable/reschedule", post(reschedule_handler))
        .with_state(state)
}

pub async fn run_server(config: &ServerConfig) -> io::Result<()> {
    let app = router(AppState::default());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
