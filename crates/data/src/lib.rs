//! Ingestion and export for scored customer tables: CSV loading with
//! column-name resolution, dataset fingerprints, mailing-list and ranked-table
//! writers.

pub mod export;
pub mod loader;

pub use export::{
    mailing_list_csv, write_mailing_list, write_mailing_list_file, write_ranked_table,
    write_ranked_table_file,
};
pub use loader::{load_dataset_file, load_table, ColumnResolver, LoadedDataset, ScoreKind};
