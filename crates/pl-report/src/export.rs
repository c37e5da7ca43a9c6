//! Export formats and the fixed column layout shared by every format.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pl_core::ControlKey;

use crate::ReportError;

pub const STATE_HEADER: &str = "State";
pub const BEFORE_LABEL: &str = "Before";
pub const CHANGE_LABEL: &str = "Change";
pub const AFTER_LABEL: &str = "After";
pub const OBTAINED_AT_LABEL: &str = "Obtained at:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Column order of the exported report: one column per control, in the
/// registry's order, each with its printed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportColumns {
    columns: Vec<(ControlKey, String)>,
}

impl ReportColumns {
    pub fn new(columns: Vec<(ControlKey, String)>) -> Self {
        Self { columns }
    }

    pub fn keys(&self) -> impl Iterator<Item = &ControlKey> {
        self.columns.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header row, starting with the state label column.
    pub fn header_row(&self) -> Vec<String> {
        std::iter::once(STATE_HEADER.to_string())
            .chain(self.columns.iter().map(|(_, h)| h.clone()))
            .collect()
    }
}

/// Append `.ext` to `path` unless it already ends with it (case-insensitive).
pub fn ensure_suffix(path: &Path, format: ExportFormat) -> PathBuf {
    let has_suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()));
    if has_suffix {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(format.extension());
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" pdf ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn suffix_added_only_when_missing() {
        assert_eq!(
            ensure_suffix(Path::new("out/report"), ExportFormat::Csv),
            PathBuf::from("out/report.csv")
        );
        assert_eq!(
            ensure_suffix(Path::new("report.PDF"), ExportFormat::Pdf),
            PathBuf::from("report.PDF")
        );
        assert_eq!(
            ensure_suffix(Path::new("report.csv"), ExportFormat::Pdf),
            PathBuf::from("report.csv.pdf")
        );
    }

    #[test]
    fn header_row_leads_with_state() {
        let columns = ReportColumns::new(vec![
            ("abertura".into(), "Valve (%)".to_string()),
            ("rpm".into(), "Electric motor (RPM (%))".to_string()),
        ]);
        assert_eq!(
            columns.header_row(),
            vec!["State", "Valve (%)", "Electric motor (RPM (%))"]
        );
    }
}
