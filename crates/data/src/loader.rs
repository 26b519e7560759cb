//! Scored-customer CSV loader.
//!
//! Column names are resolved once per file, before any row is read. The id
//! column and the score column are matched case-insensitively against the
//! synonym lists below unless the caller names them explicitly. A response
//! probability column is always preferred; a precomputed expected-profit
//! column is accepted only when no probability column exists. Every other
//! column is carried through untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use wave_core::config::DataConfig;
use wave_core::{CustomerRecord, ScoredTable, TargetingError, TargetingResult};

pub const ID_SYNONYMS: &[&str] = &[
    "id",
    "customer_id",
    "cust_id",
    "customer",
    "user_id",
    "record_id",
];

pub const PROBABILITY_SYNONYMS: &[&str] = &[
    "predicted_probability",
    "response_probability",
    "probability",
    "p_model",
    "predicted_prob",
    "prob",
    "score",
    "p_wave2",
];

pub const PROFIT_SYNONYMS: &[&str] = &[
    "expected_profit",
    "expected_profit_nn",
    "exp_profit",
    "profit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Probability,
    PrecomputedProfit,
}

/// Column positions chosen for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: usize,
    pub score: usize,
    pub score_name: String,
    pub score_kind: ScoreKind,
    /// Pass-through columns in file order.
    pub extras: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnResolver {
    id_column: Option<String>,
    score_column: Option<String>,
}

impl ColumnResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self {
            id_column: config.id_column.clone(),
            score_column: config.score_column.clone(),
        }
    }

    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = Some(name.into());
        self
    }

    /// Use `name` as the probability column instead of the synonym search.
    pub fn with_score_column(mut self, name: impl Into<String>) -> Self {
        self.score_column = Some(name.into());
        self
    }

    pub fn resolve(&self, headers: &[String]) -> TargetingResult<ResolvedColumns> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();

        let (score, score_kind) = match &self.score_column {
            Some(name) => (
                position(&normalized, name)
                    .ok_or_else(|| TargetingError::MissingColumn(name.clone()))?,
                ScoreKind::Probability,
            ),
            None => match find_first(&normalized, PROBABILITY_SYNONYMS) {
                Some(i) => (i, ScoreKind::Probability),
                None => match find_first(&normalized, PROFIT_SYNONYMS) {
                    Some(i) => (i, ScoreKind::PrecomputedProfit),
                    None => {
                        return Err(TargetingError::MissingInputKind(format!(
                            "columns present: {}",
                            headers.join(", ")
                        )))
                    }
                },
            },
        };

        let id = match &self.id_column {
            Some(name) => position(&normalized, name)
                .ok_or_else(|| TargetingError::MissingColumn(name.clone()))?,
            None => find_first(&normalized, ID_SYNONYMS)
                .ok_or_else(|| TargetingError::MissingColumn("id".to_string()))?,
        };

        let extras = (0..headers.len()).filter(|&i| i != id && i != score).collect();

        Ok(ResolvedColumns {
            id,
            score,
            score_name: headers[score].trim().to_string(),
            score_kind,
            extras,
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn position(normalized: &[String], name: &str) -> Option<usize> {
    let wanted = normalize(name);
    normalized.iter().position(|h| *h == wanted)
}

fn find_first(normalized: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| normalized.iter().position(|h| h == c))
}

/// Map a csv error onto the targeting taxonomy, keeping the line number.
pub(crate) fn csv_error(e: csv::Error) -> TargetingError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => TargetingError::Io(io),
        _ => TargetingError::Parse { line, message },
    }
}

/// Load a scored table from a delimited reader with a header row.
pub fn load_table<R: Read>(
    reader: R,
    resolver: &ColumnResolver,
    delimiter: u8,
) -> TargetingResult<(ScoredTable, ResolvedColumns)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    let columns = resolver.resolve(&headers)?;

    let extra_columns = columns
        .extras
        .iter()
        .map(|&i| headers[i].trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(csv_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let id = row.get(columns.id).unwrap_or_default().trim().to_string();
        if id.is_empty() {
            return Err(TargetingError::InvalidValue {
                line,
                column: headers[columns.id].clone(),
                value: id,
            });
        }

        let raw = row.get(columns.score).unwrap_or_default().trim();
        let value = parse_score(raw, columns.score_kind).ok_or_else(|| {
            TargetingError::InvalidValue {
                line,
                column: columns.score_name.clone(),
                value: raw.to_string(),
            }
        })?;

        let (response_probability, expected_profit) = match columns.score_kind {
            ScoreKind::Probability => (Some(value), None),
            ScoreKind::PrecomputedProfit => (None, Some(value)),
        };

        records.push(CustomerRecord {
            id,
            response_probability,
            expected_profit,
            extra: columns
                .extras
                .iter()
                .map(|&i| row.get(i).unwrap_or_default().to_string())
                .collect(),
        });
    }

    Ok((
        ScoredTable {
            extra_columns,
            records,
        },
        columns,
    ))
}

fn parse_score(raw: &str, kind: ScoreKind) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    match kind {
        ScoreKind::Probability if !(0.0..=1.0).contains(&value) => None,
        _ => Some(value),
    }
}

/// SHA-256 of the raw input, hex encoded.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A loaded input table plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub source: String,
    pub fingerprint: String,
    pub score_column: String,
    pub score_kind: ScoreKind,
    pub table: ScoredTable,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedDataset {
    pub fn from_bytes(
        source: impl Into<String>,
        bytes: &[u8],
        resolver: &ColumnResolver,
        delimiter: u8,
    ) -> TargetingResult<Self> {
        let source = source.into();
        let (table, columns) = load_table(bytes, resolver, delimiter)?;
        if columns.score_kind == ScoreKind::PrecomputedProfit {
            warn!(
                source = %source,
                column = %columns.score_name,
                "No probability column found, using precomputed expected profit"
            );
        }

        let dataset = Self {
            fingerprint: fingerprint(bytes),
            score_column: columns.score_name,
            score_kind: columns.score_kind,
            table,
            loaded_at: Utc::now(),
            source,
        };
        info!(
            source = %dataset.source,
            records = dataset.table.len(),
            score_column = %dataset.score_column,
            fingerprint = %dataset.fingerprint,
            "Scored table loaded"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Load and fingerprint a scored table from disk.
pub fn load_dataset_file(
    path: impl AsRef<Path>,
    resolver: &ColumnResolver,
    delimiter: u8,
) -> TargetingResult<LoadedDataset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    LoadedDataset::from_bytes(path.display().to_string(), &bytes, resolver, delimiter)
}
