//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wave Targeting API",
        version = "0.1.0",
        description = "Profit-based direct-mail targeting.\n\nRanks scored customers by expected profit, selects a mailing cutoff and projects the plan onto the full eligible population.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Targeting", description = "Plans, mailing lists, profit curves and projections"),
        (name = "Dataset", description = "Loaded scored table metadata and reload"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Targeting
        crate::targeting_rest::handle_plan,
        crate::targeting_rest::handle_mailing_list,
        crate::targeting_rest::handle_curve,
        crate::targeting_rest::handle_projection,
        // Dataset
        crate::dataset_rest::handle_dataset_info,
        crate::dataset_rest::handle_dataset_reload,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Scenario types
        wave_core::CutoffRule,
        wave_core::ScenarioParams,
        wave_core::ScenarioOverrides,
        wave_core::MailDecision,
        // Plan outputs
        wave_engine::CampaignSummary,
        wave_engine::ProfitCurvePoint,
        wave_engine::ProjectedTotals,
        wave_engine::ProjectionMethod,
        // Request/response envelopes
        crate::targeting_rest::PlanRequest,
        crate::targeting_rest::PlanResponse,
        crate::targeting_rest::CurveRequest,
        crate::targeting_rest::CurveResponse,
        crate::targeting_rest::ProjectionRequest,
        crate::targeting_rest::ProjectionResponse,
        crate::dataset_rest::DatasetInfo,
        // REST error/health types
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
