//! Shared REST state, error mapping and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use utoipa::ToSchema;
use wave_cache::{PlanCache, PlanKey};
use wave_core::config::{AppConfig, DataConfig};
use wave_core::{ScenarioOverrides, ScenarioParams, TargetingError};
use wave_data::LoadedDataset;
use wave_engine::TargetingPlan;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<RwLock<Arc<LoadedDataset>>>,
    pub cache: Arc<PlanCache>,
    pub defaults: ScenarioParams,
    pub data: DataConfig,
    pub eligible_population: u64,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig, dataset: LoadedDataset) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(Arc::new(dataset))),
            cache: Arc::new(PlanCache::from_config(&config.cache)),
            defaults: config.scenario.to_params(),
            data: config.data.clone(),
            eligible_population: config.projection.eligible_population,
            node_id: config.node_id.clone(),
            start_time: Instant::now(),
        }
    }

    /// Snapshot of the current table; a concurrent reload does not affect it.
    pub fn current_dataset(&self) -> Arc<LoadedDataset> {
        self.dataset.read().clone()
    }

    /// Resolve the request's scenario and return the plan for the current
    /// table, computing it on the blocking pool when not cached.
    pub async fn plan_for(
        &self,
        overrides: &ScenarioOverrides,
    ) -> Result<(Arc<LoadedDataset>, Arc<TargetingPlan>), TargetingError> {
        let params = overrides.apply(&self.defaults);
        params.validate()?;

        let dataset = self.current_dataset();
        let key = PlanKey::new(dataset.fingerprint.clone(), &params);
        if let Some(plan) = self.cache.get(&key) {
            debug!(rule = %params.cutoff_rule, "Serving cached plan");
            return Ok((dataset, plan));
        }

        let start = Instant::now();
        let table_ref = dataset.clone();
        let plan = tokio::task::spawn_blocking(move || {
            TargetingPlan::build(&table_ref.table, &params)
        })
        .await
        .map_err(|e| TargetingError::Internal(e.into()))??;

        metrics::histogram!("targeting.plan.duration_us")
            .record(start.elapsed().as_micros() as f64);
        metrics::counter!("targeting.plans_built").increment(1);

        let plan = Arc::new(plan);
        self.cache.put(key, plan.clone());
        Ok((dataset, plan))
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a targeting error onto an HTTP status and JSON body.
pub fn error_response(err: TargetingError) -> ApiError {
    let status = if err.is_user_facing() {
        warn!(error = %err, "Targeting request rejected");
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %err, "Targeting request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    metrics::counter!("api.errors", "code" => err.code()).increment(1);

    let message = if status == StatusCode::BAD_REQUEST {
        err.to_string()
    } else {
        "Internal processing error".to_string()
    };
    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message,
        }),
    )
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let dataset = state.current_dataset();
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        records: dataset.len(),
        cached_plans: state.cache.len(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
/// Returns 503 while the loaded table has no customers to target.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Ready to serve plans"),
        (status = 503, description = "Loaded table has no records"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.current_dataset().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe for Kubernetes.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub records: usize,
    pub cached_plans: usize,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use wave_data::ColumnResolver;

    pub const SAMPLE_CSV: &str = "\
customer_id,zip_bin,predicted_probability
rec1,3,0.10
rec2,7,0.02
rec3,1,0.50
";

    pub fn state_from(csv: &str) -> AppState {
        let dataset = LoadedDataset::from_bytes(
            "memory://sample.csv",
            csv.as_bytes(),
            &ColumnResolver::new(),
            b',',
        )
        .expect("sample dataset");
        AppState::new(&AppConfig::default(), dataset)
    }

    pub fn state() -> AppState {
        state_from(SAMPLE_CSV)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{state, state_from};
    use super::*;

    #[tokio::test]
    async fn test_health_reports_dataset() {
        let Json(health) = health_check(State(state())).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.records, 3);
        assert_eq!(health.node_id, "wave-01");
    }

    #[tokio::test]
    async fn test_ready_with_dataset() {
        assert_eq!(readiness(State(state())).await, StatusCode::OK);
        assert_eq!(liveness().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_with_header_only_table() {
        let state = state_from("customer_id,predicted_probability\n");
        assert_eq!(readiness(State(state)).await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_plan_for_caches() {
        let state = state();
        let overrides = ScenarioOverrides::default();
        let (_, first) = state.plan_for(&overrides).await.expect("plan");
        let (_, second) = state.plan_for(&overrides).await.expect("plan");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_plan_for_rejects_bad_scenario() {
        let state = state();
        let overrides = ScenarioOverrides {
            response_multiplier: Some(0.0),
            ..Default::default()
        };
        let err = state.plan_for(&overrides).await.expect_err("invalid");
        assert!(matches!(err, TargetingError::InvalidScenario(_)));
        assert!(state.cache.is_empty());
    }

    #[test]
    fn test_error_response_status() {
        let (status, Json(body)) = error_response(TargetingError::InvalidTopN(Some(0)));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_top_n");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let (status, Json(body)) = error_response(TargetingError::Io(io));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal processing error");
    }
}
