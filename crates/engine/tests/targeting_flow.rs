//! End-to-end checks of the targeting flow: the literal campaign scenarios
//! and the ranking/cutoff properties over seeded synthetic tables.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wave_core::{CustomerRecord, CutoffRule, ScenarioParams, ScoredTable, TargetingError};
use wave_engine::{apply_cutoff, compute_expected_profit, rank, select_cutoff, TargetingPlan};

fn example_table() -> ScoredTable {
    ScoredTable::new(vec![
        CustomerRecord::with_probability("rec1", 0.10),
        CustomerRecord::with_probability("rec2", 0.02),
        CustomerRecord::with_probability("rec3", 0.50),
    ])
}

/// Response probabilities skewed toward zero, like a real response model.
fn synthetic_table(seed: u64, n: usize) -> ScoredTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..n)
        .map(|i| {
            let u: f64 = rng.gen();
            CustomerRecord::with_probability(format!("cust-{i:06}"), u * u * 0.3)
        })
        .collect();
    ScoredTable::new(records)
}

fn params(rule: CutoffRule, top_n: Option<i64>) -> ScenarioParams {
    ScenarioParams {
        cutoff_rule: rule,
        top_n,
        ..Default::default()
    }
}

#[test]
fn test_example_positive_profit_rule() {
    let plan = TargetingPlan::build(&example_table(), &ScenarioParams::default()).unwrap();

    let ids: Vec<&str> = plan.ranked.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec3", "rec1", "rec2"]);

    let cumulative: Vec<f64> = plan
        .ranked
        .records()
        .iter()
        .map(|r| r.cumulative_profit)
        .collect();
    for (got, want) in cumulative.iter().zip([13.59, 15.18, 14.37]) {
        assert!((got - want).abs() < 1e-9);
    }
    assert_eq!(plan.cutoff_rank, 2);
    assert_eq!(plan.summary.peak_rank, 2);
}

#[test]
fn test_example_top_one() {
    let plan =
        TargetingPlan::build(&example_table(), &params(CutoffRule::TopN, Some(1))).unwrap();
    assert_eq!(plan.cutoff_rank, 1);
    let mailed: Vec<String> = plan
        .decisions()
        .into_iter()
        .filter(|d| d.mail)
        .map(|d| d.id)
        .collect();
    assert_eq!(mailed, vec!["rec3".to_string()]);
}

#[test]
fn test_example_empty_input() {
    for rule in [
        CutoffRule::ExpectedProfitPositive,
        CutoffRule::PeakCumulativeProfit,
    ] {
        let plan = TargetingPlan::build(&ScoredTable::default(), &params(rule, None)).unwrap();
        assert_eq!(plan.cutoff_rank, 0);
        assert!(plan.decisions().is_empty());
    }
}

#[test]
fn test_example_zero_top_n() {
    let err = TargetingPlan::build(&example_table(), &params(CutoffRule::TopN, Some(0)))
        .unwrap_err();
    assert!(matches!(err, TargetingError::InvalidTopN(Some(0))));
}

#[test]
fn test_example_missing_input_kind() {
    let table = ScoredTable::new(vec![CustomerRecord {
        id: "x".to_string(),
        response_probability: None,
        expected_profit: None,
        extra: vec!["CA".to_string()],
    }]);
    let err = TargetingPlan::build(&table, &ScenarioParams::default()).unwrap_err();
    assert!(matches!(err, TargetingError::MissingInputKind(_)));
}

#[test]
fn test_idempotent_decisions() {
    let table = synthetic_table(7, 5_000);
    let p = params(CutoffRule::PeakCumulativeProfit, None);

    let first = TargetingPlan::build(&table, &p).unwrap();
    let second = TargetingPlan::build(&table, &p).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first.decisions()).unwrap(),
        serde_json::to_vec(&second.decisions()).unwrap()
    );
}

#[test]
fn test_conservation_of_profit() {
    let table = synthetic_table(11, 10_000);
    let p = ScenarioParams::default();
    let scored = compute_expected_profit(&table.records, &p).unwrap();
    let total: f64 = scored.iter().map(|s| s.expected_profit).sum();
    let ranked = rank(scored);
    let last = ranked.records().last().unwrap().cumulative_profit;
    assert!((total - last).abs() < 1e-6 * total.abs().max(1.0));
}

#[test]
fn test_positive_rule_bound() {
    for seed in 0..5 {
        let table = synthetic_table(seed, 2_000);
        let plan = TargetingPlan::build(&table, &ScenarioParams::default()).unwrap();
        for record in plan.ranked.records() {
            if record.rank <= plan.cutoff_rank {
                assert!(record.expected_profit > 0.0);
            } else {
                assert!(record.expected_profit <= 0.0);
            }
        }
    }
}

#[test]
fn test_peak_rule_is_maximal() {
    for seed in 0..5 {
        let table = synthetic_table(100 + seed, 2_000);
        let plan =
            TargetingPlan::build(&table, &params(CutoffRule::PeakCumulativeProfit, None)).unwrap();
        let best = plan.ranked.cumulative_at(plan.cutoff_rank);
        assert!(plan
            .ranked
            .records()
            .iter()
            .all(|r| best >= r.cumulative_profit));
    }
}

#[test]
fn test_peak_coincides_with_positive_cutoff_on_sorted_table() {
    let table = synthetic_table(42, 20_000);
    let positive = TargetingPlan::build(&table, &ScenarioParams::default()).unwrap();
    let peak =
        TargetingPlan::build(&table, &params(CutoffRule::PeakCumulativeProfit, None)).unwrap();
    assert_eq!(positive.cutoff_rank, peak.cutoff_rank);
}

#[test]
fn test_top_n_bound() {
    let table = synthetic_table(3, 250);
    let ranked = rank(compute_expected_profit(&table.records, &ScenarioParams::default()).unwrap());
    for k in [1_i64, 10, 250, 251, 10_000] {
        let cutoff = select_cutoff(&ranked, CutoffRule::TopN, Some(k)).unwrap();
        assert_eq!(cutoff, (k as usize).min(250));
        let mailed = apply_cutoff(&ranked, cutoff).iter().filter(|d| d.mail).count();
        assert_eq!(mailed, cutoff);
    }
}

#[test]
fn test_stable_tie_break() {
    let records: Vec<CustomerRecord> = (0..50)
        .map(|i| CustomerRecord::with_probability(format!("tie-{i:02}"), if i % 2 == 0 { 0.2 } else { 0.4 }))
        .collect();
    let plan = TargetingPlan::build(&ScoredTable::new(records), &ScenarioParams::default()).unwrap();

    let order: Vec<usize> = plan.ranked.records().iter().map(|r| r.input_index).collect();
    let odds = order[..25].to_vec();
    let evens = order[25..].to_vec();
    assert!(odds.windows(2).all(|w| w[0] < w[1]));
    assert!(evens.windows(2).all(|w| w[0] < w[1]));
    assert!(odds.iter().all(|i| i % 2 == 1));
}

#[test]
fn test_decisions_cover_every_record_once() {
    let table = synthetic_table(9, 3_000);
    let plan = TargetingPlan::build(&table, &ScenarioParams::default()).unwrap();
    let decisions = plan.decisions();
    assert_eq!(decisions.len(), table.len());

    let mut ids: Vec<&str> = decisions.iter().map(|d| d.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), table.len());
    assert_eq!(decisions.iter().filter(|d| d.mail).count(), plan.cutoff_rank);
}

#[test]
fn test_higher_decay_mails_fewer() {
    let table = synthetic_table(21, 5_000);
    let optimistic = ScenarioParams {
        response_multiplier: 1.0,
        ..Default::default()
    };
    let conservative = ScenarioParams {
        response_multiplier: 0.25,
        ..Default::default()
    };
    let wide = TargetingPlan::build(&table, &optimistic).unwrap();
    let narrow = TargetingPlan::build(&table, &conservative).unwrap();
    assert!(narrow.cutoff_rank < wide.cutoff_rank);
}

#[test]
fn test_plan_rejects_invalid_probabilities_under_every_rule() {
    let table = ScoredTable::new(vec![
        CustomerRecord::with_probability("nan", f64::NAN),
        CustomerRecord::with_probability("negative", -3.0),
        CustomerRecord::with_probability("big", 7.0),
    ]);
    for rule in [
        CutoffRule::ExpectedProfitPositive,
        CutoffRule::PeakCumulativeProfit,
    ] {
        let err = TargetingPlan::build(&table, &params(rule, None)).unwrap_err();
        assert!(
            matches!(err, TargetingError::InvalidValue { line: 1, .. }),
            "{rule}: {err:?}"
        );
    }
}
