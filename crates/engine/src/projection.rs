//! Full-population projection of a scored-sample campaign.
//!
//! The projection is a linear extrapolation, not a re-scoring. It assumes the
//! mailing depth and the per-customer profit observed on the scored sample
//! carry over unchanged to the larger eligible population. Segment mix,
//! saturation and a different response decay in the full pool are not
//! modelled, so the figures are an order-of-magnitude guide for budgeting.

use crate::summary::CampaignSummary;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What was observed on the scored sample at the chosen cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedCampaign {
    pub population: usize,
    pub mailed: usize,
    pub profit_at_cutoff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    LinearExtrapolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectedTotals {
    pub method: ProjectionMethod,
    pub eligible_population: u64,
    /// Fraction of the observed sample that was mailed.
    pub mailing_depth: f64,
    /// Profit at cutoff divided by the observed population size.
    pub profit_per_customer: f64,
    pub projected_mail_count: u64,
    pub projected_profit: f64,
    pub not_mailed: u64,
    /// Mailing spend saved by not mailing the rest of the eligible population.
    pub avoided_mail_cost: f64,
}

impl From<&CampaignSummary> for ObservedCampaign {
    fn from(summary: &CampaignSummary) -> Self {
        Self {
            population: summary.record_count,
            mailed: summary.cutoff_rank,
            profit_at_cutoff: summary.profit_at_cutoff,
        }
    }
}

/// Scale an observed campaign up to `eligible_population` customers.
///
/// An empty observation has nothing to scale and projects zero mailings.
pub fn scale_projection(
    observed: &ObservedCampaign,
    eligible_population: u64,
    mail_cost: f64,
) -> ProjectedTotals {
    let (mailing_depth, profit_per_customer) = if observed.population == 0 {
        (0.0, 0.0)
    } else {
        let n = observed.population as f64;
        (observed.mailed as f64 / n, observed.profit_at_cutoff / n)
    };

    let projected_mail_count = (eligible_population as f64 * mailing_depth).round() as u64;
    let not_mailed = eligible_population.saturating_sub(projected_mail_count);

    ProjectedTotals {
        method: ProjectionMethod::LinearExtrapolation,
        eligible_population,
        mailing_depth,
        profit_per_customer,
        projected_mail_count,
        projected_profit: profit_per_customer * eligible_population as f64,
        not_mailed,
        avoided_mail_cost: not_mailed as f64 * mail_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_depth_and_profit() {
        // Wave-1 test set: 22,500 scored, 3,489 mailed, $14,718.14 profit.
        let observed = ObservedCampaign {
            population: 22_500,
            mailed: 3_489,
            profit_at_cutoff: 14_718.14,
        };
        let projected = scale_projection(&observed, 763_334, 1.41);

        assert!((projected.mailing_depth - 3_489.0 / 22_500.0).abs() < 1e-12);
        assert_eq!(
            projected.projected_mail_count,
            (763_334.0_f64 * 3_489.0 / 22_500.0).round() as u64
        );
        assert!((projected.projected_profit - 14_718.14 / 22_500.0 * 763_334.0).abs() < 1e-6);
        assert_eq!(
            projected.not_mailed,
            763_334 - projected.projected_mail_count
        );
        assert!((projected.avoided_mail_cost - projected.not_mailed as f64 * 1.41).abs() < 1e-6);
        assert_eq!(projected.method, ProjectionMethod::LinearExtrapolation);
    }

    #[test]
    fn test_empty_observation_projects_nothing() {
        let observed = ObservedCampaign {
            population: 0,
            mailed: 0,
            profit_at_cutoff: 0.0,
        };
        let projected = scale_projection(&observed, 1_000, 1.41);
        assert_eq!(projected.projected_mail_count, 0);
        assert_eq!(projected.projected_profit, 0.0);
        assert_eq!(projected.not_mailed, 1_000);
    }

    #[test]
    fn test_full_depth_mails_everyone() {
        let observed = ObservedCampaign {
            population: 10,
            mailed: 10,
            profit_at_cutoff: 25.0,
        };
        let projected = scale_projection(&observed, 40, 2.0);
        assert_eq!(projected.projected_mail_count, 40);
        assert_eq!(projected.not_mailed, 0);
        assert!((projected.projected_profit - 100.0).abs() < 1e-9);
        assert_eq!(projected.avoided_mail_cost, 0.0);
    }
}
