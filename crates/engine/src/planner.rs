//! End-to-end targeting plan: score, rank, cut off, summarise.

use crate::cutoff::{apply_cutoff, select_cutoff};
use crate::profit::compute_expected_profit;
use crate::projection::{scale_projection, ObservedCampaign, ProjectedTotals};
use crate::ranking::{rank, RankedTable};
use crate::summary::CampaignSummary;
use std::time::Instant;
use tracing::{debug, info};
use wave_core::{MailDecision, ScenarioParams, ScoredTable, TargetingResult};

/// The outcome of one targeting computation. Built fresh for every scenario;
/// nothing inside depends on a previous plan.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetingPlan {
    pub scenario: ScenarioParams,
    pub ranked: RankedTable,
    pub cutoff_rank: usize,
    pub summary: CampaignSummary,
}

impl TargetingPlan {
    /// Validate the scenario, then score, rank and cut off `table`.
    ///
    /// An empty table is a valid plan with cutoff 0, not an error.
    pub fn build(table: &ScoredTable, params: &ScenarioParams) -> TargetingResult<Self> {
        let start = Instant::now();
        params.validate()?;

        let scored = compute_expected_profit(&table.records, params)?;
        let ranked = rank(scored);
        let cutoff_rank = select_cutoff(&ranked, params.cutoff_rule, params.top_n)?;
        let summary = CampaignSummary::from_ranked(&ranked, cutoff_rank, params);

        if ranked.is_empty() {
            debug!("Empty input, nothing to mail");
        }
        info!(
            records = summary.record_count,
            rule = %params.cutoff_rule,
            cutoff_rank,
            profit_at_cutoff = summary.profit_at_cutoff,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Targeting plan built"
        );

        Ok(Self {
            scenario: params.clone(),
            ranked,
            cutoff_rank,
            summary,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// The id / mail table covering every input record exactly once.
    pub fn decisions(&self) -> Vec<MailDecision> {
        apply_cutoff(&self.ranked, self.cutoff_rank)
    }

    pub fn project(&self, eligible_population: u64) -> ProjectedTotals {
        scale_projection(
            &ObservedCampaign::from(&self.summary),
            eligible_population,
            self.scenario.mail_cost,
        )
    }
}
