//! pl-report: the change report and its export.

pub mod csv_export;
pub mod export;
pub mod log;
pub mod pdf_export;

use std::path::PathBuf;

pub use export::{ExportFormat, ReportColumns, ensure_suffix};
pub use log::{Change, ChangeEntry, ChangeLog};
pub use pdf_export::PdfRenderer;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("The report is empty; change some parameters before exporting")]
    Empty,

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No usable '{family}' fonts found; searched {searched:?}")]
    FontsNotFound {
        family: String,
        searched: Vec<PathBuf>,
    },

    #[error("PDF render failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
