//! Dataset REST API endpoints.

use crate::rest::{error_response, ApiError, AppState, ErrorResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use wave_core::TargetingError;
use wave_data::{ColumnResolver, LoadedDataset, ScoreKind};

#[derive(Serialize, ToSchema)]
pub struct DatasetInfo {
    pub source: String,
    pub fingerprint: String,
    pub records: usize,
    pub score_column: String,
    /// `probability` or `precomputed_profit`.
    #[schema(value_type = String)]
    pub score_kind: ScoreKind,
    pub extra_columns: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

impl From<&LoadedDataset> for DatasetInfo {
    fn from(dataset: &LoadedDataset) -> Self {
        Self {
            source: dataset.source.clone(),
            fingerprint: dataset.fingerprint.clone(),
            records: dataset.len(),
            score_column: dataset.score_column.clone(),
            score_kind: dataset.score_kind,
            extra_columns: dataset.table.extra_columns.clone(),
            loaded_at: dataset.loaded_at,
        }
    }
}

/// GET /v1/dataset — Describe the scored table currently being served.
#[utoipa::path(
    get,
    path = "/v1/dataset",
    tag = "Dataset",
    responses((status = 200, description = "Loaded table metadata", body = DatasetInfo))
)]
pub async fn handle_dataset_info(State(state): State<AppState>) -> Json<DatasetInfo> {
    Json(DatasetInfo::from(state.current_dataset().as_ref()))
}

/// POST /v1/dataset/reload — Re-read the configured input file.
#[utoipa::path(
    post,
    path = "/v1/dataset/reload",
    tag = "Dataset",
    responses(
        (status = 200, description = "Table reloaded", body = DatasetInfo),
        (status = 400, description = "No input path configured or the file is invalid", body = ErrorResponse),
    )
)]
pub async fn handle_dataset_reload(
    State(state): State<AppState>,
) -> Result<Json<DatasetInfo>, ApiError> {
    let path = state
        .data
        .input_path
        .clone()
        .ok_or_else(|| config_rejection("data.input_path is not set".to_string()))?;
    let delimiter = state.data.delimiter_byte().map_err(config_rejection)?;
    let resolver = ColumnResolver::from_config(&state.data);

    let loaded = tokio::task::spawn_blocking(move || {
        wave_data::load_dataset_file(&path, &resolver, delimiter)
    })
    .await
    .map_err(|e| error_response(TargetingError::Internal(e.into())))?
    .map_err(error_response)?;

    let loaded = Arc::new(loaded);
    let previous = {
        let mut guard = state.dataset.write();
        std::mem::replace(&mut *guard, loaded.clone())
    };
    if previous.fingerprint != loaded.fingerprint {
        let dropped = state.cache.invalidate_dataset(&previous.fingerprint);
        info!(
            previous = %previous.fingerprint,
            current = %loaded.fingerprint,
            dropped_plans = dropped,
            "Scored table replaced"
        );
    }
    metrics::counter!("targeting.dataset.reloads").increment(1);

    Ok(Json(DatasetInfo::from(loaded.as_ref())))
}

/// Reload needs a usable data section; without one the caller gets a 400.
fn config_rejection(message: String) -> ApiError {
    warn!(%message, "Dataset reload rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "config_error".to_string(),
            message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_support::{state, SAMPLE_CSV};
    use wave_core::ScenarioOverrides;

    #[tokio::test]
    async fn test_dataset_info() {
        let Json(info) = handle_dataset_info(State(state())).await;
        assert_eq!(info.records, 3);
        assert_eq!(info.score_column, "predicted_probability");
        assert_eq!(info.score_kind, ScoreKind::Probability);
        assert_eq!(info.extra_columns, vec!["zip_bin".to_string()]);
    }

    #[tokio::test]
    async fn test_reload_without_path() {
        let Err((status, Json(body))) = handle_dataset_reload(State(state())).await else {
            panic!("expected an error");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "config_error");
    }

    #[tokio::test]
    async fn test_reload_swaps_table_and_drops_stale_plans() {
        let dir = std::env::temp_dir().join(format!("wave-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("tmp dir");
        let path = dir.join("scored.csv");
        std::fs::write(&path, format!("{SAMPLE_CSV}rec4,2,0.30\n")).expect("write");

        let mut state = state();
        state.data.input_path = Some(path.display().to_string());
        state
            .plan_for(&ScenarioOverrides::default())
            .await
            .expect("plan");
        assert_eq!(state.cache.len(), 1);

        let Json(info) = handle_dataset_reload(State(state.clone()))
            .await
            .expect("reload");
        assert_eq!(info.records, 4);
        assert_eq!(state.current_dataset().len(), 4);
        assert!(state.cache.is_empty());

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}
