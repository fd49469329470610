//! Upload ingest: CSV loading, heuristic column resolution and
//! normalization into typed transaction and marketing tables.

pub mod columns;
pub mod loader;
pub mod normalize;
pub mod parse;

pub use columns::ColumnResolver;
pub use loader::{load_files, InputFile, RawTable};
pub use normalize::{normalize_marketing, normalize_transactions};

use studio_core::types::{DataKind, FileStatus, MarketingTable, TransactionTable};

/// Load and normalize transaction uploads.
pub fn load_transactions(files: &[InputFile]) -> (TransactionTable, Vec<FileStatus>) {
    let batch = load_files(files, DataKind::Transaction);
    (normalize_transactions(&batch.tables), batch.statuses)
}

/// Load and normalize marketing-spend uploads.
pub fn load_marketing(files: &[InputFile]) -> (MarketingTable, Vec<FileStatus>) {
    let batch = load_files(files, DataKind::Marketing);
    (normalize_marketing(&batch.tables), batch.statuses)
}
