//! Headline figures for a targeting plan.

use crate::cutoff::peak_rank;
use crate::ranking::RankedTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wave_core::ScenarioParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CampaignSummary {
    pub record_count: usize,
    pub cutoff_rank: usize,
    /// Share of the table that is mailed.
    pub mailing_depth: f64,
    pub profit_at_cutoff: f64,
    pub mail_spend_at_cutoff: f64,
    pub peak_rank: usize,
    pub peak_cumulative_profit: f64,
    /// Profit if every customer were mailed.
    pub total_expected_profit: f64,
    /// Sum of decayed response probabilities over mailed customers.
    pub expected_responders: Option<f64>,
    pub breakeven_probability: f64,
    /// Mean decayed response in the top 10% of ranks over the table mean.
    pub top_decile_lift: Option<f64>,
}

impl CampaignSummary {
    pub fn from_ranked(ranked: &RankedTable, cutoff_rank: usize, params: &ScenarioParams) -> Self {
        let record_count = ranked.len();
        let cutoff_rank = cutoff_rank.min(record_count);
        let peak = peak_rank(ranked);

        let mailing_depth = if record_count == 0 {
            0.0
        } else {
            cutoff_rank as f64 / record_count as f64
        };

        let mailed = &ranked.records()[..cutoff_rank];
        let expected_responders = if ranked.records().iter().any(|r| r.adjusted_probability.is_some())
        {
            Some(mailed.iter().filter_map(|r| r.adjusted_probability).sum())
        } else {
            None
        };

        Self {
            record_count,
            cutoff_rank,
            mailing_depth,
            profit_at_cutoff: ranked.cumulative_at(cutoff_rank),
            mail_spend_at_cutoff: cutoff_rank as f64 * params.mail_cost,
            peak_rank: peak,
            peak_cumulative_profit: ranked.cumulative_at(peak),
            total_expected_profit: ranked.total_expected_profit(),
            expected_responders,
            breakeven_probability: params.breakeven_probability(),
            top_decile_lift: top_decile_lift(ranked),
        }
    }
}

/// Concentration of projected responders at the head of the ranking.
/// `None` when the table has no probabilities or a zero mean response.
pub fn top_decile_lift(ranked: &RankedTable) -> Option<f64> {
    let probabilities: Vec<f64> = ranked
        .records()
        .iter()
        .filter_map(|r| r.adjusted_probability)
        .collect();
    if probabilities.is_empty() {
        return None;
    }

    let overall = mean(&probabilities);
    if overall <= 0.0 {
        return None;
    }
    let decile = probabilities.len().div_ceil(10);
    Some(mean(&probabilities[..decile]) / overall)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
