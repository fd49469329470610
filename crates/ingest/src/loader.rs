//! Multi-file CSV loading with per-file partial-failure semantics.

use std::path::PathBuf;

use studio_core::error::{StudioError, StudioResult};
use studio_core::types::{DataKind, FileStatus, LoadStatus};
use tracing::{info, warn};

/// Where an uploaded file's bytes come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// One uploaded file, identified by its display name.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub source: InputSource,
}

impl InputFile {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: InputSource::Bytes(bytes.into()),
        }
    }

    /// Named after the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: InputSource::Path(path),
        }
    }
}

/// A parsed CSV file with no typing applied yet.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source_file: String,
    pub headers: Vec<String>,
    /// Every row padded to `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of loading a batch of files of one kind.
#[derive(Debug, Clone, Default)]
pub struct LoadedBatch {
    pub tables: Vec<RawTable>,
    pub statuses: Vec<FileStatus>,
}

/// Load every file; a file that fails to parse is recorded as `Failed` and
/// the rest of the batch still loads.
pub fn load_files(files: &[InputFile], kind: DataKind) -> LoadedBatch {
    let mut batch = LoadedBatch::default();

    for file in files {
        match load_file(file) {
            Ok(table) => {
                info!(file = %file.name, kind = ?kind, rows = table.len(), "File loaded");
                metrics::counter!("ingest.files_loaded").increment(1);
                batch.statuses.push(FileStatus {
                    filename: file.name.clone(),
                    kind,
                    rows: table.len(),
                    status: LoadStatus::Loaded,
                });
                batch.tables.push(table);
            }
            Err(e) => {
                warn!(file = %file.name, kind = ?kind, error = %e, "File failed to load");
                metrics::counter!("ingest.files_failed").increment(1);
                batch.statuses.push(FileStatus {
                    filename: file.name.clone(),
                    kind,
                    rows: 0,
                    status: LoadStatus::Failed(e.to_string()),
                });
            }
        }
    }

    batch
}

/// Parse one file into a [`RawTable`].
pub fn load_file(file: &InputFile) -> StudioResult<RawTable> {
    match &file.source {
        InputSource::Bytes(bytes) => parse_csv(&file.name, bytes.as_slice()),
        InputSource::Path(path) => {
            let handle = std::fs::File::open(path)?;
            parse_csv(&file.name, handle)
        }
    }
}

/// Parse CSV text. Rows shorter than the header are padded with empty
/// cells; rows longer than the header make the file malformed.
pub fn parse_csv<R: std::io::Read>(name: &str, reader: R) -> StudioResult<RawTable> {
    let csv_error = |message: String| StudioError::Csv {
        file: name.to_string(),
        message,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| csv_error(e.to_string()))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(csv_error("no columns to parse".to_string()));
    }

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(format!("line {}: {}", line_num + 2, e)))?;
        if record.len() > headers.len() {
            return Err(csv_error(format!(
                "line {}: expected {} fields, saw {}",
                line_num + 2,
                headers.len(),
                record.len()
            )));
        }
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable {
        source_file: name.to_string(),
        headers,
        rows,
    })
}
