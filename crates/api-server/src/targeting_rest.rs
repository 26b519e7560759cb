//! Targeting REST API endpoints: plans, mailing lists, profit curves and
//! full-population projections.

use crate::rest::{error_response, ApiError, AppState, ErrorResponse};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use wave_core::{MailDecision, ScenarioOverrides, ScenarioParams};
use wave_engine::{CampaignSummary, ProfitCurvePoint, ProjectedTotals};

const DEFAULT_CURVE_POINTS: usize = 500;
const MAX_CURVE_POINTS: usize = 10_000;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub scenario: ScenarioOverrides,
    /// Include the full id / mail table in the response.
    #[serde(default)]
    pub include_decisions: bool,
}

#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub plan_id: Uuid,
    pub dataset_fingerprint: String,
    pub scenario: ScenarioParams,
    pub summary: CampaignSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<MailDecision>>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CurveRequest {
    #[serde(flatten)]
    pub scenario: ScenarioOverrides,
    #[serde(default)]
    pub max_points: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct CurveResponse {
    pub cutoff_rank: usize,
    pub peak_rank: usize,
    pub points: Vec<ProfitCurvePoint>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectionRequest {
    #[serde(flatten)]
    pub scenario: ScenarioOverrides,
    /// Overrides the configured eligible population.
    #[serde(default)]
    pub eligible_population: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectionResponse {
    pub summary: CampaignSummary,
    pub projection: ProjectedTotals,
}

/// POST /v1/targeting/plan — Rank the loaded table and pick a cutoff.
#[utoipa::path(
    post,
    path = "/v1/targeting/plan",
    tag = "Targeting",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Plan computed", body = PlanResponse),
        (status = 400, description = "Invalid scenario", body = ErrorResponse),
    )
)]
pub async fn handle_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let (dataset, plan) = state
        .plan_for(&request.scenario)
        .await
        .map_err(error_response)?;

    metrics::counter!(
        "targeting.api.plans",
        "rule" => plan.scenario.cutoff_rule.as_str()
    )
    .increment(1);

    Ok(Json(PlanResponse {
        plan_id: Uuid::new_v4(),
        dataset_fingerprint: dataset.fingerprint.clone(),
        scenario: plan.scenario.clone(),
        summary: plan.summary.clone(),
        decisions: request.include_decisions.then(|| plan.decisions()),
        generated_at: Utc::now(),
    }))
}

/// POST /v1/targeting/mailing-list — Download the id / mail artifact as CSV.
#[utoipa::path(
    post,
    path = "/v1/targeting/mailing-list",
    tag = "Targeting",
    request_body = ScenarioOverrides,
    responses(
        (status = 200, description = "Two-column CSV covering every record", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid scenario", body = ErrorResponse),
    )
)]
pub async fn handle_mailing_list(
    State(state): State<AppState>,
    Json(scenario): Json<ScenarioOverrides>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, plan) = state.plan_for(&scenario).await.map_err(error_response)?;
    let body = wave_data::mailing_list_csv(&plan.decisions()).map_err(error_response)?;

    metrics::counter!("targeting.api.mailing_lists").increment(1);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"mailing_list.csv\"",
            ),
        ],
        body,
    ))
}

/// POST /v1/targeting/curve — Expected and cumulative profit by rank.
#[utoipa::path(
    post,
    path = "/v1/targeting/curve",
    tag = "Targeting",
    request_body = CurveRequest,
    responses(
        (status = 200, description = "Downsampled ranked-profit curve", body = CurveResponse),
        (status = 400, description = "Invalid scenario", body = ErrorResponse),
    )
)]
pub async fn handle_curve(
    State(state): State<AppState>,
    Json(request): Json<CurveRequest>,
) -> Result<Json<CurveResponse>, ApiError> {
    let (_, plan) = state
        .plan_for(&request.scenario)
        .await
        .map_err(error_response)?;
    let max_points = request
        .max_points
        .unwrap_or(DEFAULT_CURVE_POINTS)
        .clamp(2, MAX_CURVE_POINTS);

    Ok(Json(CurveResponse {
        cutoff_rank: plan.cutoff_rank,
        peak_rank: plan.summary.peak_rank,
        points: plan.ranked.curve(max_points),
    }))
}

/// POST /v1/targeting/projection — Scale the plan to the eligible population.
#[utoipa::path(
    post,
    path = "/v1/targeting/projection",
    tag = "Targeting",
    request_body = ProjectionRequest,
    responses(
        (status = 200, description = "Linear full-population projection", body = ProjectionResponse),
        (status = 400, description = "Invalid scenario", body = ErrorResponse),
    )
)]
pub async fn handle_projection(
    State(state): State<AppState>,
    Json(request): Json<ProjectionRequest>,
) -> Result<Json<ProjectionResponse>, ApiError> {
    let (_, plan) = state
        .plan_for(&request.scenario)
        .await
        .map_err(error_response)?;
    let eligible = request
        .eligible_population
        .unwrap_or(state.eligible_population);

    Ok(Json(ProjectionResponse {
        summary: plan.summary.clone(),
        projection: plan.project(eligible),
    }))
}
