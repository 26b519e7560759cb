//! Mailing cutoff selection and the mail / do-not-mail decision table.

use crate::ranking::RankedTable;
use tracing::debug;
use wave_core::{CutoffRule, MailDecision, TargetingError, TargetingResult};

/// Pick the last rank to mail under `rule`. Zero means mail nobody.
pub fn select_cutoff(
    ranked: &RankedTable,
    rule: CutoffRule,
    top_n: Option<i64>,
) -> TargetingResult<usize> {
    let cutoff = match rule {
        CutoffRule::ExpectedProfitPositive => positive_profit_cutoff(ranked),
        CutoffRule::PeakCumulativeProfit => peak_rank(ranked),
        CutoffRule::TopN => match top_n {
            Some(n) if n > 0 => (n as usize).min(ranked.len()),
            other => return Err(TargetingError::InvalidTopN(other)),
        },
    };
    debug!(rule = %rule, cutoff, records = ranked.len(), "Cutoff selected");
    Ok(cutoff)
}

/// Rank of the last strictly positive expected profit. The first rank whose
/// profit is `<= 0` is excluded.
pub fn positive_profit_cutoff(ranked: &RankedTable) -> usize {
    ranked
        .records()
        .iter()
        .position(|r| r.expected_profit <= 0.0)
        .unwrap_or(ranked.len())
}

/// Smallest rank at which cumulative profit reaches its maximum. The empty
/// mailing (rank 0, profit 0) competes too, so a table where every prefix
/// loses money yields 0.
pub fn peak_rank(ranked: &RankedTable) -> usize {
    let mut best_rank = 0;
    let mut best_profit = 0.0;
    for record in ranked.records() {
        if record.cumulative_profit > best_profit {
            best_profit = record.cumulative_profit;
            best_rank = record.rank;
        }
    }
    best_rank
}

/// Mail flag for every ranked record, in rank order. Only `id` and `mail`
/// survive into the exported artifact.
pub fn apply_cutoff(ranked: &RankedTable, cutoff_rank: usize) -> Vec<MailDecision> {
    ranked
        .records()
        .iter()
        .map(|r| MailDecision {
            id: r.id.clone(),
            mail: r.rank <= cutoff_rank,
        })
        .collect()
}
