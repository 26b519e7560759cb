//! Ranking by expected profit and the cumulative profit curve.

use crate::profit::ScoredCustomer;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    /// 1-based position in descending expected-profit order.
    pub rank: usize,
    pub input_index: usize,
    pub id: String,
    pub adjusted_probability: Option<f64>,
    pub expected_profit: f64,
    /// Running total of expected profit up to and including this rank.
    pub cumulative_profit: f64,
}

/// Customers in descending expected-profit order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    records: Vec<RankedRecord>,
}

/// One point on the ranked-profit charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfitCurvePoint {
    pub rank: usize,
    pub expected_profit: f64,
    pub cumulative_profit: f64,
}

/// Sort descending by expected profit and accumulate the running total.
///
/// The sort is stable: equal profits keep their input order, so the same
/// table always yields the same mailing list.
pub fn rank(mut scored: Vec<ScoredCustomer>) -> RankedTable {
    scored.sort_by(|a, b| b.expected_profit.total_cmp(&a.expected_profit));

    let mut cumulative = 0.0;
    let records = scored
        .into_iter()
        .enumerate()
        .map(|(pos, customer)| {
            cumulative += customer.expected_profit;
            RankedRecord {
                rank: pos + 1,
                input_index: customer.input_index,
                id: customer.id,
                adjusted_probability: customer.adjusted_probability,
                expected_profit: customer.expected_profit,
                cumulative_profit: cumulative,
            }
        })
        .collect();

    RankedTable { records }
}

impl RankedTable {
    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at a 1-based rank.
    pub fn get(&self, rank: usize) -> Option<&RankedRecord> {
        rank.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// Cumulative profit after mailing the top `rank` customers. Rank 0 is
    /// the empty mailing and is worth nothing.
    pub fn cumulative_at(&self, rank: usize) -> f64 {
        self.get(rank.min(self.len()))
            .map(|r| r.cumulative_profit)
            .unwrap_or(0.0)
    }

    /// Sum of expected profit over every customer.
    pub fn total_expected_profit(&self) -> f64 {
        self.records.last().map(|r| r.cumulative_profit).unwrap_or(0.0)
    }

    /// Downsample to at most `max_points` evenly spaced ranks, always keeping
    /// the final rank so the curve ends at the table total.
    pub fn curve(&self, max_points: usize) -> Vec<ProfitCurvePoint> {
        let n = self.records.len();
        if n == 0 || max_points == 0 {
            return Vec::new();
        }
        let step = n.div_ceil(max_points.max(1)).max(1);

        let mut points: Vec<ProfitCurvePoint> = self
            .records
            .iter()
            .step_by(step)
            .map(ProfitCurvePoint::from)
            .collect();

        if points.last().map(|p| p.rank) != Some(n) {
            if points.len() >= max_points {
                points.pop();
            }
            points.push(ProfitCurvePoint::from(&self.records[n - 1]));
        }
        points
    }
}

impl From<&RankedRecord> for ProfitCurvePoint {
    fn from(r: &RankedRecord) -> Self {
        Self {
            rank: r.rank,
            expected_profit: r.expected_profit,
            cumulative_profit: r.cumulative_profit,
        }
    }
}
