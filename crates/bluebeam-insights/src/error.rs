use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to decode floorplan image: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported floorplan format: {0}")]
    UnsupportedFloorplan(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("filename '{filename}' has no valid HHMM time segment")]
    InvalidTimeSegment { filename: String },

    #[error("malformed CSV row {row}: {message}")]
    MalformedRow { row: usize, message: String },
}
