//! Mailing-list and ranked-table export.

use crate::loader::csv_error;
use std::io::Write;
use std::path::Path;
use tracing::info;
use wave_core::{MailDecision, ScoredTable, TargetingError, TargetingResult};
use wave_engine::RankedTable;

/// Write the two-column `id,mail` artifact.
pub fn write_mailing_list<W: Write>(writer: W, decisions: &[MailDecision]) -> TargetingResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "mail"]).map_err(csv_error)?;
    for decision in decisions {
        csv_writer
            .write_record([decision.id.as_str(), bool_cell(decision.mail)])
            .map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// The mailing list as an in-memory CSV document.
pub fn mailing_list_csv(decisions: &[MailDecision]) -> TargetingResult<String> {
    let mut buf = Vec::with_capacity(decisions.len() * 16 + 8);
    write_mailing_list(&mut buf, decisions)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_mailing_list_file(
    path: impl AsRef<Path>,
    decisions: &[MailDecision],
) -> TargetingResult<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_mailing_list(std::io::BufWriter::new(file), decisions)?;
    info!(
        path = %path.display(),
        rows = decisions.len(),
        mailed = decisions.iter().filter(|d| d.mail).count(),
        "Mailing list written"
    );
    Ok(())
}

/// Write the full ranking: rank, id, expected profit, cumulative profit and
/// mail flag, followed by the table's pass-through columns.
pub fn write_ranked_table<W: Write>(
    writer: W,
    table: &ScoredTable,
    ranked: &RankedTable,
    cutoff_rank: usize,
) -> TargetingResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        "rank".to_string(),
        "id".to_string(),
        "expected_profit".to_string(),
        "cumulative_profit".to_string(),
        "mail".to_string(),
    ];
    header.extend(table.extra_columns.iter().cloned());
    csv_writer.write_record(&header).map_err(csv_error)?;

    for record in ranked.records() {
        let source = table.records.get(record.input_index).ok_or_else(|| {
            TargetingError::Internal(anyhow::anyhow!(
                "ranked row {} is outside the {}-row input table",
                record.input_index,
                table.len()
            ))
        })?;

        let mut row = vec![
            record.rank.to_string(),
            record.id.clone(),
            record.expected_profit.to_string(),
            record.cumulative_profit.to_string(),
            bool_cell(record.rank <= cutoff_rank).to_string(),
        ];
        row.extend(source.extra.iter().cloned());
        csv_writer.write_record(&row).map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_ranked_table_file(
    path: impl AsRef<Path>,
    table: &ScoredTable,
    ranked: &RankedTable,
    cutoff_rank: usize,
) -> TargetingResult<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_ranked_table(std::io::BufWriter::new(file), table, ranked, cutoff_rank)?;
    info!(path = %path.display(), rows = ranked.len(), "Ranked table written");
    Ok(())
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
