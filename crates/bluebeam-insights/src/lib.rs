mod binning;
pub mod chart;
mod color;
mod csv_out;
mod error;
mod extract;
mod floorplan;
mod model;
mod options;
mod time_segment;
mod warning;

use serde::Serialize;

pub use binning::{
    BIN_SIZE, BinCount, BinnedCategory, Binner, MAX_MARKER_SIZE, PlacedRecord, REFERENCE_HEIGHT,
    REFERENCE_WIDTH, Scale, rescale_points,
};
pub use chart::{ChartSet, render_all};
pub use color::{ColorMap, Rgb};
pub use csv_out::{read_csv, to_csv, write_csv};
pub use error::InsightsError;
pub use extract::extract;
pub use floorplan::Floorplan;
pub use model::{AnnotationRecord, COLUMNS, CombinedTable};
pub use options::{ExtractOptions, Filters, TimeMode};
pub use time_segment::{DEFAULT_TIME, TimeSegment, time_from_filename};
pub use warning::{ExtractWarning, WarningCode};

/// Counters and warnings gathered while extracting one or more files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub row_count: usize,
    pub file_count: usize,
    pub skipped_lines: usize,
    pub dropped_duplicates: usize,
    pub warnings: Vec<ExtractWarning>,
}

impl ExtractionReport {
    pub fn absorb(&mut self, other: ExtractionReport) {
        self.row_count += other.row_count;
        self.file_count += other.file_count;
        self.skipped_lines += other.skipped_lines;
        self.dropped_duplicates += other.dropped_duplicates;
        self.warnings.extend(other.warnings);
    }
}

/// One uploaded markup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MarkupFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn read(path: &std::path::Path) -> Result<Self, InsightsError> {
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned();
        Ok(Self {
            name,
            bytes: std::fs::read(path)?,
        })
    }
}

/// Extracts every file and concatenates the rows in upload order.
pub fn extract_batch(
    files: &[MarkupFile],
    options: &ExtractOptions,
) -> Result<(CombinedTable, ExtractionReport), InsightsError> {
    let mut report = ExtractionReport::default();
    let mut tables = Vec::with_capacity(files.len());

    for file in files {
        let (records, file_report) = extract(&file.bytes, &file.name, options)?;
        report.absorb(file_report);
        tables.push(records);
    }

    let table = CombinedTable::concat(tables);
    tracing::debug!(
        files = report.file_count,
        rows = table.len(),
        "markup batch extracted"
    );
    Ok((table, report))
}
