use crate::error::{TargetingError, TargetingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// One scored customer as it arrives from the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    /// Model response probability, before the wave decay is applied.
    pub response_probability: Option<f64>,
    /// Precomputed expected profit, used only when no probability is present.
    pub expected_profit: Option<f64>,
    /// Pass-through cells, aligned with [`ScoredTable::extra_columns`].
    #[serde(default)]
    pub extra: Vec<String>,
}

impl CustomerRecord {
    pub fn with_probability(id: impl Into<String>, probability: f64) -> Self {
        Self {
            id: id.into(),
            response_probability: Some(probability),
            expected_profit: None,
            extra: Vec::new(),
        }
    }

    pub fn with_expected_profit(id: impl Into<String>, expected_profit: f64) -> Self {
        Self {
            id: id.into(),
            response_probability: None,
            expected_profit: Some(expected_profit),
            extra: Vec::new(),
        }
    }
}

/// The raw scored table. Treated as immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredTable {
    pub extra_columns: Vec<String>,
    pub records: Vec<CustomerRecord>,
}

impl ScoredTable {
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self {
            extra_columns: Vec::new(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CutoffRule {
    /// Mail while expected profit stays strictly positive.
    #[default]
    ExpectedProfitPositive,
    /// Stop at the rank where cumulative expected profit peaks.
    PeakCumulativeProfit,
    /// Mail a fixed number of top-ranked customers.
    TopN,
}

impl CutoffRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpectedProfitPositive => "expected_profit_positive",
            Self::PeakCumulativeProfit => "peak_cumulative_profit",
            Self::TopN => "top_n",
        }
    }
}

impl fmt::Display for CutoffRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CutoffRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "expected_profit_positive" | "profit_positive" | "positive" => {
                Ok(Self::ExpectedProfitPositive)
            }
            "peak_cumulative_profit" | "peak_profit" | "peak" => Ok(Self::PeakCumulativeProfit),
            "top_n" | "topn" | "top" => Ok(Self::TopN),
            other => Err(format!(
                "unknown cutoff rule '{other}' (expected one of: expected_profit_positive, peak_cumulative_profit, top_n)"
            )),
        }
    }
}

/// Economic assumptions for one targeting computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScenarioParams {
    pub mail_cost: f64,
    pub margin_per_responder: f64,
    /// Decay applied to the observed probability to project the next wave.
    pub response_multiplier: f64,
    pub cutoff_rule: CutoffRule,
    #[serde(default)]
    pub top_n: Option<i64>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            mail_cost: 1.41,
            margin_per_responder: 60.0,
            response_multiplier: 0.50,
            cutoff_rule: CutoffRule::ExpectedProfitPositive,
            top_n: None,
        }
    }
}

impl ScenarioParams {
    pub fn validate(&self) -> TargetingResult<()> {
        if !self.mail_cost.is_finite() || self.mail_cost <= 0.0 {
            return Err(TargetingError::InvalidScenario(format!(
                "mail_cost must be positive, got {}",
                self.mail_cost
            )));
        }
        if !self.margin_per_responder.is_finite() || self.margin_per_responder <= 0.0 {
            return Err(TargetingError::InvalidScenario(format!(
                "margin_per_responder must be positive, got {}",
                self.margin_per_responder
            )));
        }
        if !self.response_multiplier.is_finite()
            || self.response_multiplier <= 0.0
            || self.response_multiplier > 1.0
        {
            return Err(TargetingError::InvalidScenario(format!(
                "response_multiplier must be in (0, 1], got {}",
                self.response_multiplier
            )));
        }
        if self.cutoff_rule == CutoffRule::TopN {
            self.required_top_n()?;
        }
        Ok(())
    }

    /// The `top_n` value for the Top-N rule, rejecting missing or non-positive values.
    pub fn required_top_n(&self) -> TargetingResult<usize> {
        match self.top_n {
            Some(n) if n > 0 => Ok(n as usize),
            other => Err(TargetingError::InvalidTopN(other)),
        }
    }

    /// margin × (probability × multiplier) − mail cost.
    pub fn expected_profit(&self, probability: f64) -> f64 {
        self.margin_per_responder * (probability * self.response_multiplier) - self.mail_cost
    }

    /// Model probability at which expected profit is exactly zero.
    pub fn breakeven_probability(&self) -> f64 {
        self.mail_cost / (self.response_multiplier * self.margin_per_responder)
    }

    pub fn key(&self) -> ScenarioKey {
        ScenarioKey {
            mail_cost: self.mail_cost.to_bits(),
            margin_per_responder: self.margin_per_responder.to_bits(),
            response_multiplier: self.response_multiplier.to_bits(),
            cutoff_rule: self.cutoff_rule,
            top_n: self.top_n,
        }
    }
}

/// Hashable identity of a scenario. Covers every input of the expected
/// profit and the cutoff rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenarioKey {
    mail_cost: u64,
    margin_per_responder: u64,
    response_multiplier: u64,
    cutoff_rule: CutoffRule,
    top_n: Option<i64>,
}

/// Request-scoped overrides merged over configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScenarioOverrides {
    #[serde(default)]
    pub mail_cost: Option<f64>,
    #[serde(default)]
    pub margin_per_responder: Option<f64>,
    #[serde(default)]
    pub response_multiplier: Option<f64>,
    #[serde(default)]
    pub cutoff_rule: Option<CutoffRule>,
    #[serde(default)]
    pub top_n: Option<i64>,
}

impl ScenarioOverrides {
    pub fn apply(&self, defaults: &ScenarioParams) -> ScenarioParams {
        ScenarioParams {
            mail_cost: self.mail_cost.unwrap_or(defaults.mail_cost),
            margin_per_responder: self
                .margin_per_responder
                .unwrap_or(defaults.margin_per_responder),
            response_multiplier: self
                .response_multiplier
                .unwrap_or(defaults.response_multiplier),
            cutoff_rule: self.cutoff_rule.unwrap_or(defaults.cutoff_rule),
            top_n: self.top_n.or(defaults.top_n),
        }
    }
}

/// One row of the exported mailing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MailDecision {
    pub id: String,
    pub mail: bool,
}
