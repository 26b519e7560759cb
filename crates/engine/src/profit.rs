//! Expected profit per customer under a scenario.

use serde::{Deserialize, Serialize};
use wave_core::{CustomerRecord, ScenarioParams, TargetingError, TargetingResult};

/// A customer with its expected profit attached. `input_index` is the row's
/// position in the source table and is what keeps ranking ties stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    pub input_index: usize,
    pub id: String,
    /// Probability after the response multiplier; `None` for precomputed profits.
    pub adjusted_probability: Option<f64>,
    pub expected_profit: f64,
}

/// Compute expected profit for every record.
///
/// A record's probability always wins over a precomputed profit. The whole
/// call fails with [`TargetingError::MissingInputKind`] if any record carries
/// neither, and nothing is returned for the records that did. A probability
/// outside [0, 1] or a non-finite profit fails it with
/// [`TargetingError::InvalidValue`], where `line` is the 1-based record number.
pub fn compute_expected_profit(
    records: &[CustomerRecord],
    params: &ScenarioParams,
) -> TargetingResult<Vec<ScoredCustomer>> {
    if let Some(bad) = records
        .iter()
        .find(|r| r.response_probability.is_none() && r.expected_profit.is_none())
    {
        return Err(TargetingError::MissingInputKind(format!(
            "record '{}' has neither",
            bad.id
        )));
    }
    for (input_index, record) in records.iter().enumerate() {
        check_input(input_index, record)?;
    }

    let scored = records
        .iter()
        .enumerate()
        .map(|(input_index, record)| match record.response_probability {
            Some(p) => ScoredCustomer {
                input_index,
                id: record.id.clone(),
                adjusted_probability: Some(p * params.response_multiplier),
                expected_profit: params.expected_profit(p),
            },
            None => ScoredCustomer {
                input_index,
                id: record.id.clone(),
                adjusted_probability: None,
                expected_profit: record.expected_profit.unwrap_or_default(),
            },
        })
        .collect();

    Ok(scored)
}

fn check_input(input_index: usize, record: &CustomerRecord) -> TargetingResult<()> {
    let (column, value, valid) = match (record.response_probability, record.expected_profit) {
        (Some(p), _) => ("response_probability", p, (0.0..=1.0).contains(&p)),
        (None, Some(profit)) => ("expected_profit", profit, profit.is_finite()),
        (None, None) => return Ok(()),
    };
    if valid {
        return Ok(());
    }
    Err(TargetingError::InvalidValue {
        line: input_index as u64 + 1,
        column: column.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_from_probabilities() {
        let records = vec![
            CustomerRecord::with_probability("rec1", 0.10),
            CustomerRecord::with_probability("rec2", 0.02),
            CustomerRecord::with_probability("rec3", 0.50),
        ];
        let scored = compute_expected_profit(&records, &ScenarioParams::default()).unwrap();
        let profits: Vec<f64> = scored.iter().map(|s| s.expected_profit).collect();
        for (got, want) in profits.iter().zip([1.59, -0.81, 13.59]) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
        assert!((scored[2].adjusted_probability.unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(scored[1].input_index, 1);
    }

    #[test]
    fn test_precomputed_profit_passes_through() {
        let records = vec![CustomerRecord::with_expected_profit("a", 4.2)];
        let scored = compute_expected_profit(&records, &ScenarioParams::default()).unwrap();
        assert!((scored[0].expected_profit - 4.2).abs() < f64::EPSILON);
        assert!(scored[0].adjusted_probability.is_none());
    }

    #[test]
    fn test_probability_wins_over_precomputed_profit() {
        let mut record = CustomerRecord::with_probability("a", 0.5);
        record.expected_profit = Some(-100.0);
        let scored = compute_expected_profit(&[record], &ScenarioParams::default()).unwrap();
        assert!((scored[0].expected_profit - 13.59).abs() < 1e-9);
    }

    #[test]
    fn test_profit_follows_scenario_changes() {
        let records = vec![CustomerRecord::with_probability("a", 0.10)];
        let params = ScenarioParams {
            response_multiplier: 1.0,
            ..Default::default()
        };
        let scored = compute_expected_profit(&records, &params).unwrap();
        assert!((scored[0].expected_profit - 4.59).abs() < 1e-9);
    }

    #[test]
    fn test_missing_input_kind() {
        let records = vec![
            CustomerRecord::with_probability("ok", 0.3),
            CustomerRecord {
                id: "blank".to_string(),
                response_probability: None,
                expected_profit: None,
                extra: vec![],
            },
        ];
        let err = compute_expected_profit(&records, &ScenarioParams::default()).unwrap_err();
        assert!(matches!(err, TargetingError::MissingInputKind(_)));
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        for bad in [f64::NAN, -3.0, 7.0] {
            let records = vec![
                CustomerRecord::with_probability("ok", 0.3),
                CustomerRecord::with_probability("bad", bad),
            ];
            let err = compute_expected_profit(&records, &ScenarioParams::default()).unwrap_err();
            match err {
                TargetingError::InvalidValue { line, column, .. } => {
                    assert_eq!(line, 2);
                    assert_eq!(column, "response_probability");
                }
                other => panic!("unexpected error for {bad}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_finite_profit_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let records = vec![CustomerRecord::with_expected_profit("a", bad)];
            let err = compute_expected_profit(&records, &ScenarioParams::default()).unwrap_err();
            assert!(matches!(err, TargetingError::InvalidValue { line: 1, .. }));
        }
    }

    #[test]
    fn test_probability_bounds_are_inclusive() {
        let records = vec![
            CustomerRecord::with_probability("zero", 0.0),
            CustomerRecord::with_probability("one", 1.0),
        ];
        let scored = compute_expected_profit(&records, &ScenarioParams::default()).unwrap();
        assert_eq!(scored.len(), 2);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let scored = compute_expected_profit(&[], &ScenarioParams::default()).unwrap();
        assert!(scored.is_empty());
    }
}
