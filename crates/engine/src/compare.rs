//! Side-by-side comparison of scoring models under one scenario.

use crate::planner::TargetingPlan;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wave_core::{ScenarioParams, ScoredTable, TargetingResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelComparison {
    pub model: String,
    pub record_count: usize,
    pub cutoff_rank: usize,
    pub profit_at_cutoff: f64,
    pub peak_cumulative_profit: f64,
    pub top_decile_lift: Option<f64>,
}

/// Plan every candidate and order them by profit at cutoff, best first.
/// Candidates with equal profit keep their given order.
pub fn compare_models(
    candidates: &[(String, &ScoredTable)],
    params: &ScenarioParams,
) -> TargetingResult<Vec<ModelComparison>> {
    let mut results = candidates
        .iter()
        .map(|(model, table)| {
            let plan = TargetingPlan::build(table, params)?;
            Ok(ModelComparison {
                model: model.clone(),
                record_count: plan.summary.record_count,
                cutoff_rank: plan.cutoff_rank,
                profit_at_cutoff: plan.summary.profit_at_cutoff,
                peak_cumulative_profit: plan.summary.peak_cumulative_profit,
                top_decile_lift: plan.summary.top_decile_lift,
            })
        })
        .collect::<TargetingResult<Vec<_>>>()?;

    results.sort_by(|a, b| b.profit_at_cutoff.total_cmp(&a.profit_at_cutoff));
    Ok(results)
}
