//! Targeting engine: expected profit per customer, descending-profit ranking,
//! cumulative profit curve and mailing cutoff selection for direct-mail waves.
//!
//! Every function here is a pure transform of its inputs: the same table and
//! scenario always produce the same ranking and cutoff.

pub mod compare;
pub mod cutoff;
pub mod planner;
pub mod profit;
pub mod projection;
pub mod ranking;
pub mod summary;

pub use compare::{compare_models, ModelComparison};
pub use cutoff::{apply_cutoff, select_cutoff};
pub use planner::TargetingPlan;
pub use profit::{compute_expected_profit, ScoredCustomer};
pub use projection::{scale_projection, ObservedCampaign, ProjectedTotals, ProjectionMethod};
pub use ranking::{rank, ProfitCurvePoint, RankedRecord, RankedTable};
pub use summary::CampaignSummary;
